//! Heuristic resolution of obfuscated runtime symbols.
//!
//! Obfuscated builds rename classes, methods and fields on every release, but the
//! constants they log, the interfaces they declare and the calls they make stay
//! recognizable. This module turns those invariants into [`Heuristic`] rules that
//! resolve stable [`FactKey`]s to concrete symbol references as classes stream past a
//! [`ResolutionContext`]. Facts land in a lock-free [`FactTable`] exactly once; classes
//! whose rules need facts that have not arrived yet are retained and revisited, so the
//! table converges independently of class observation order.

pub mod catalog;
mod context;
mod fact;
mod heuristic;

pub use context::ResolutionContext;
pub use fact::{FactKey, FactTable, FactValue};
pub use heuristic::{Evidence, ExtractFn, Heuristic};
