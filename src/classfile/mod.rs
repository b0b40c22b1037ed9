//! The decoded JVM class model.
//!
//! Everything the engine does happens on the types in this module: a [`ClassFile`] with
//! its [`MethodInfo`] bodies is what heuristics fingerprint, what predicates select over,
//! what advice rewrites and what builders synthesize. The representation is tree-style -
//! instruction lists with virtual labels, parsed descriptors, symbolic references - so
//! structural edits never have to reason about byte offsets or constant-pool indices.
//!
//! # Key Types
//!
//! - [`ClassFile`] / [`MethodInfo`] / [`FieldInfo`] - decoded declarations
//! - [`TypeDesc`] / [`MethodDesc`] - parsed descriptors
//! - [`Op`] / [`Ins`] / [`Label`] - the instruction vocabulary
//! - [`MethodRef`] / [`FieldRef`] - symbolic member references
//! - [`ConstValue`] - loadable constants and field initializers
//! - [`ClassCodec`] - the host-supplied byte boundary

mod access;
mod class;
mod codec;
mod constant;
mod descriptor;
mod instruction;
mod refs;

pub use access::{ClassAccess, FieldAccess, MethodAccess};
pub use class::{ClassFile, FieldInfo, MethodInfo, TryCatch, DEFAULT_CLASS_VERSION};
pub use codec::ClassCodec;
pub use constant::ConstValue;
pub use descriptor::{MethodDesc, TypeDesc};
pub use instruction::{next_free_label, Cond, Ins, InvokeKind, Label, Op, VarKind};
pub use refs::{FieldRef, MethodRef};
