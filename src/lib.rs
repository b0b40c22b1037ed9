// Copyright 2025 classweave contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
#![allow(clippy::too_many_arguments)]

//! # classweave
//!
//! A signature-matching, advice-weaving and heuristic symbol-resolution engine for JVM class
//! files. Built in pure Rust, `classweave` locates methods in compiled classes by structural
//! signature rather than by name, splices caller-supplied instruction fragments around them,
//! and recovers the identities of obfuscated classes, methods and fields from bytecode
//! fingerprints - all without loading a JVM.
//!
//! ## Features
//!
//! - **🔍 Structural matching** - Composable predicates select methods by shape, constants and
//!   call targets instead of brittle hardcoded names
//! - **🧵 Advice weaving** - Enter/exit fragments are spliced into existing method bodies with
//!   automatic label renumbering, return-value preservation and operand-stack verification
//! - **🧩 Heuristic resolution** - A catalog of bytecode fingerprints resolves obfuscated
//!   symbols into a write-once fact table as classes stream past
//! - **🔧 Class synthesis** - Fluent builders assemble new utility classes whose bodies call
//!   into resolved runtime facts
//! - **⚡ Module composition** - Independent transformation modules are merged over a single
//!   pass per class, with deterministic conflict handling
//! - **🛡️ Memory safe** - Built in Rust with comprehensive error handling; a broken rewrite is
//!   rejected before it ever reaches the host
//!
//! ## Quick Start
//!
//! Add `classweave` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! classweave = "0.1"
//! ```
//!
//! ### Using the Prelude
//!
//! For convenient access to the most commonly used types, import the prelude:
//!
//! ```rust
//! use classweave::prelude::*;
//!
//! let mut class = ClassFile::new("demo/Widget");
//! let mut method = MethodInfo::new("tick", "()V")?;
//! method.code.push(Op::Return(None).into());
//! class.methods.push(method);
//!
//! // Splice a fragment at the head of every method named `tick`.
//! let advice = Advice::new(MethodPredicate::Named("tick".into()))
//!     .on_enter(|asm| {
//!         asm.push_int(1)?.pop()?;
//!         Ok(())
//!     });
//!
//! let woven = advice.apply(&class)?.expect("selector matched");
//! assert!(woven.methods[0].code.len() > class.methods[0].code.len());
//! # Ok::<(), classweave::Error>(())
//! ```
//!
//! ### Structural Matching
//!
//! Obfuscators scramble names but cannot scramble shape. A predicate tree matches methods by
//! what they look like and what they do:
//!
//! ```rust
//! use classweave::prelude::*;
//!
//! // Any method that takes a String and returns a Set, in any class.
//! let selector = MethodPredicate::And(vec![
//!     MethodPredicate::Signature(ShapePattern::parse(
//!         "(Ljava/lang/String;)Ljava/util/Set;",
//!     )?),
//!     MethodPredicate::HasConstant(ConstValue::Str("mods.json".into())),
//! ]);
//! # let _ = selector;
//! # Ok::<(), classweave::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `classweave` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`classfile`] - The decoded class model: descriptors, instructions, references
//! - [`matching`] - Predicate trees and shape patterns for structural method selection
//! - [`assembly`] - Fluent instruction assembly and bytecode inspection utilities
//! - [`weaving`] - Advice splicing with operand-stack verification
//! - [`resolution`] - Heuristic fingerprints and the write-once runtime fact table
//! - [`generation`] - Synthesis of new classes from resolved facts
//! - [`engine`] - Module registration, composition and the per-class transform pipeline
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result) with comprehensive error information:
//!
//! ```rust
//! use classweave::classfile::MethodDesc;
//! use classweave::Error;
//!
//! match MethodDesc::parse("(Ljava/lang/String;V") {
//!     Ok(desc) => println!("parsed {}", desc.raw()),
//!     Err(Error::Descriptor { message }) => println!("bad descriptor: {}", message),
//!     Err(e) => println!("other error: {}", e),
//! }
//! ```
//!
//! ## Development and Testing
//!
//! The crate includes fuzzing support for the descriptor and pattern parsers:
//!
//! ```bash
//! cargo install cargo-fuzz
//! cargo +nightly fuzz run descriptors --release
//! ```
//!
//! The test suite exercises every stage of the pipeline on hand-built class fixtures:
//!
//! ```bash
//! cargo test
//! cargo test --release  # For performance tests
//! ```
#[macro_use]
pub(crate) mod error;


/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the classweave library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust
/// use classweave::prelude::*;
///
/// let class = ClassFile::new("demo/Widget");
/// assert!(!class.is_interface());
/// ```
pub mod prelude;

/// The decoded JVM class model.
///
/// This module defines the in-memory representation every other stage operates on:
///
/// - [`classfile::ClassFile`], [`classfile::MethodInfo`], [`classfile::FieldInfo`] - decoded
///   declarations with instruction-level method bodies
/// - [`classfile::TypeDesc`] and [`classfile::MethodDesc`] - parsed JVM descriptors
/// - [`classfile::Op`] and [`classfile::Ins`] - the reduced instruction vocabulary
/// - [`classfile::MethodRef`] and [`classfile::FieldRef`] - symbolic member references
/// - [`classfile::ClassCodec`] - the host-supplied boundary between raw class bytes and the
///   model
///
/// Method bodies use virtual labels for all control flow, so instructions can be inserted
/// and removed without offset bookkeeping.
pub mod classfile;

/// Structural method selection.
///
/// Predicates describe methods by what they are and what they do, not by name alone:
///
/// - [`matching::MethodPredicate`] - the composable predicate tree
/// - [`matching::ShapePattern`] - wildcard-capable signature patterns
/// - [`matching::MethodSubject`] - a declared method or a bare call-site reference
///
/// Predicate evaluation is pure and total: constructors validate pattern text eagerly, and
/// [`matching::MethodPredicate::matches`] can never fail.
pub mod matching;

/// Fluent instruction assembly and bytecode inspection.
///
/// - [`assembly::Assembler`] - chainable emission of the instruction vocabulary, with
///   collision-free label and local-slot allocation
/// - [`assembly::InstructionSink`] - the low-level emission trait
/// - Dispatch construction: [`assembly::Assembler::string_switch`] builds a Java-compatible
///   string-hash `LookupSwitch` with secondary equality checks
/// - Inspection: window utilities such as [`assembly::constant_index`] and
///   [`assembly::call_after`] that heuristics use to walk decoded bodies
/// - Loaders: canned emission sequences that push resolved runtime facts onto the stack
pub mod assembly;

/// Advice splicing into existing method bodies.
///
/// An [`weaving::Advice`] pairs a selector predicate with optional enter/exit code
/// fragments. Application rewrites every matching method: the enter fragment runs once at
/// the head, and the exit fragment is cloned before every return so no exit path escapes
/// it. Non-void return values are parked in a fresh local across the exit fragment, and the
/// rewritten body must pass operand-stack verification before it is accepted.
pub mod weaving;

/// Heuristic symbol resolution.
///
/// As classes stream through the engine, a catalog of [`resolution::Heuristic`] fingerprints
/// inspects each one and records recovered symbol identities in a write-once
/// [`resolution::FactTable`]. Heuristics that depend on facts another class will provide are
/// deferred and retried automatically. See [`resolution::ResolutionContext`] for the typed
/// accessors consumers use.
pub mod resolution;

/// Synthesis of new classes.
///
/// [`generation::ClassBuilder`] and [`generation::MethodBuilder`] assemble complete class
/// descriptors from scratch, verifying every method body at build time. The canned
/// [`generation::generate_utility_class`] produces the runtime callback surface whose method
/// bodies call into resolved facts.
pub mod generation;

/// Module registration, composition and the transform pipeline.
///
/// - [`engine::Module`] - the transformation unit: a selector plus a transform factory
/// - [`engine::ModuleRegistry`] - ordered registration
/// - [`engine::Engine`] - drives resolution, composes per-class transforms from every
///   applicable module in a single pass, and contains per-class failures
/// - [`engine::EngineConfig`] - declarative configuration for the built-in modules
/// - [`engine::EventLog`] - append-only diagnostics shared across the pipeline
pub mod engine;

/// `classweave` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
///
/// # Examples
///
/// ```rust
/// use classweave::classfile::TypeDesc;
/// use classweave::Result;
///
/// fn parse_return_type(desc: &str) -> Result<TypeDesc> {
///     TypeDesc::parse(desc)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `classweave` Error type
///
/// The main error type for all operations in this crate. Provides detailed error information
/// for descriptor parsing, predicate construction, symbol resolution, weaving and synthesis.
///
/// # Examples
///
/// ```rust
/// use classweave::classfile::MethodDesc;
/// use classweave::Error;
///
/// match MethodDesc::parse("()") {
///     Ok(desc) => println!("parsed {}", desc.raw()),
///     Err(Error::Descriptor { message }) => println!("bad descriptor: {}", message),
///     Err(e) => println!("error: {}", e),
/// }
/// ```
pub use error::Error;
