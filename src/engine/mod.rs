//! Class transformation engine.
//!
//! The engine composes independent patch [`Module`]s over every class the host
//! delivers. Each module inspects a decoded [`ClassFile`](crate::classfile::ClassFile)
//! and either passes or contributes a [`Transform`], an ordered batch of advice edits
//! scoped to that class. The [`Engine`] merges edits across modules, weaves them, and
//! reports an explicit [`TransformOutcome`] so unchanged classes keep their original
//! bytes byte for byte.
//!
//! # Key components
//!
//! - [`Module`] / [`ModuleRegistry`] - the uniform patch interface and its ordered
//!   collection
//! - [`Engine`] - per-class orchestration: resolver observation, edit merging,
//!   conflict and panic containment
//! - [`EngineConfig`] / [`TextMod`] - deserializable toggles for the built-in modules
//! - [`ModRegistry`] / [`LangMapper`] - built-ins injecting configured text mods and
//!   mapping their ids to display names
//! - [`EventLog`] - lock-free diagnostic record of resolutions, weaves, and drops
//!
//! # Example
//!
//! ```rust
//! use classweave::prelude::*;
//!
//! let config = EngineConfig::default();
//! let engine = Engine::from_config(&config);
//! assert!(engine.registry().find("mod-registry").is_some());
//! assert!(engine.events().is_empty());
//! ```

mod composer;
mod config;
mod events;
mod mods;
mod module;
mod transform;

pub use composer::Engine;
pub use config::{EngineConfig, TextMod};
pub use events::{Event, EventKind, EventLog};
pub use mods::{LangMapper, ModRegistry, MOD_FACTORY};
pub use module::{Module, ModuleRegistry};
pub use transform::{Transform, TransformOutcome};
