//! Load-time synthesis of new classes.
//!
//! Where [`weaving`](crate::weaving) rewrites methods the application already has,
//! this module builds classes the application never had: small, verified bytecode
//! units that call back into symbols the [resolver](crate::resolution) located at
//! runtime. Every synthesized class implements the fixed [`PATCH_CALLBACKS`]
//! interface so host-side code can invoke it without any dynamic lookup.
//!
//! [`ClassBuilder`] and [`MethodBuilder`] give the same fluent, verify-on-build
//! construction style the [`Assembler`](crate::assembly::Assembler) gives for
//! instruction streams; [`generate_utility_class`] is the built-in synthesis target.

mod builder;
mod utility;

pub use builder::{ClassBuilder, MethodBuilder};
pub use utility::{generate_utility_class, PATCH_CALLBACKS, UTILITY_CLASS};
