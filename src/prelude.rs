//! # classweave Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the classweave library. Import this module to get quick access to the essential
//! types for class-file matching, weaving and resolution.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all classweave operations
pub use crate::Error;

/// The result type used throughout classweave
pub use crate::Result;

// ================================================================================================
// Class Model
// ================================================================================================

/// Decoded declarations with instruction-level method bodies
pub use crate::classfile::{ClassFile, FieldInfo, MethodInfo, TryCatch};

/// Access and property flag groups
pub use crate::classfile::{ClassAccess, FieldAccess, MethodAccess};

/// Parsed JVM type and method descriptors
pub use crate::classfile::{MethodDesc, TypeDesc};

/// Symbolic member references
pub use crate::classfile::{FieldRef, MethodRef};

/// The reduced instruction vocabulary and its operand types
pub use crate::classfile::{Cond, ConstValue, Ins, InvokeKind, Label, Op, VarKind};

/// The host-supplied boundary between raw class bytes and the model
pub use crate::classfile::ClassCodec;

/// Class file major version emitted for synthesized classes
pub use crate::classfile::DEFAULT_CLASS_VERSION;

// ================================================================================================
// Structural Matching
// ================================================================================================

/// Composable predicate tree over declared methods and call references
pub use crate::matching::{MethodPredicate, MethodSubject};

/// Wildcard-capable signature patterns
pub use crate::matching::{ShapePattern, TypePattern};

// ================================================================================================
// Instruction Assembly
// ================================================================================================

/// Fluent instruction emission with label and local-slot allocation
pub use crate::assembly::{Assembler, InstructionSink};

/// Java `String.hashCode` semantics used by string dispatch tables
pub use crate::assembly::java_string_hash;

/// Instruction-window inspection utilities used by heuristics
pub use crate::assembly::{
    call_after, call_named, clinit_string_assignments, constant_index, field_access_before,
    last_class_constant,
};

/// Canned emission sequences pushing resolved runtime facts onto the stack
pub use crate::assembly::{
    load_assets_socket, load_client_bridge, load_lunar_main, load_player_bridge, load_server_data,
    load_server_mappings, to_bridge_component,
};

// ================================================================================================
// Advice Weaving
// ================================================================================================

/// Enter/exit instrumentation spliced into matched method bodies
pub use crate::weaving::{Advice, CodeFragment};

// ================================================================================================
// Symbol Resolution
// ================================================================================================

/// The shared resolution state handed to every pipeline stage
pub use crate::resolution::ResolutionContext;

/// Well-known fact keys and their recorded values
pub use crate::resolution::{FactKey, FactTable, FactValue};

/// Bytecode fingerprints and their class-level evidence
pub use crate::resolution::{Evidence, Heuristic};

// ================================================================================================
// Class Synthesis
// ================================================================================================

/// Fluent builders for synthesized classes
pub use crate::generation::{ClassBuilder, MethodBuilder};

/// The built-in utility class synthesis and its fixed interface
pub use crate::generation::{generate_utility_class, PATCH_CALLBACKS, UTILITY_CLASS};

// ================================================================================================
// Engine and Modules
// ================================================================================================

/// The transformation unit interface and its ordered registry
pub use crate::engine::{Module, ModuleRegistry};

/// Per-class transform batches and the explicit outcome signal
pub use crate::engine::{Transform, TransformOutcome};

/// The composer driving modules over every delivered class
pub use crate::engine::Engine;

/// Declarative configuration for the built-in modules
pub use crate::engine::{EngineConfig, TextMod};

/// Built-in modules injecting configured text mods
pub use crate::engine::{LangMapper, ModRegistry, MOD_FACTORY};

/// Append-only diagnostics shared across the pipeline
pub use crate::engine::{Event, EventKind, EventLog};
