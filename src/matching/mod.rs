//! Structural method selection.
//!
//! Obfuscated code keeps its shape even when every name is scrambled. This module selects
//! methods by that shape: a [`MethodPredicate`] tree combines tests over names, signatures,
//! constants, call targets and modifiers, and a [`ShapePattern`] matches signatures with
//! wildcard and prefix positions. Construction validates everything up front; evaluation is
//! pure, total and safe to run concurrently.

mod predicate;
mod shape;

pub use predicate::{MethodPredicate, MethodSubject};
pub use shape::{ShapePattern, TypePattern};
