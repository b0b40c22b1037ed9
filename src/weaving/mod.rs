//! Structural advice weaving.
//!
//! An [`Advice`] pairs a [`MethodPredicate`](crate::matching::MethodPredicate) with code
//! fragments to run on method entry and before every return. Weaving rewrites a decoded
//! class without touching the input, then re-verifies every modified body by abstract
//! stack-depth interpretation and refreshes its stack and local limits, so an unbalanced
//! fragment surfaces as a [`WeavingConflict`](crate::Error::WeavingConflict) at weave
//! time instead of a verifier error inside the target process.

mod advice;
pub(crate) mod stack;

pub use advice::{Advice, CodeFragment};
