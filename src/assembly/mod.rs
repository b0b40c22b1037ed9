//! Instruction assembly and inspection.
//!
//! [`Assembler`] builds instruction sequences through a fluent API that tracks label and
//! local-variable allocation, so fragments spliced into existing bodies never collide
//! with what the original method already uses. On top of it sit the string dispatch
//! emitter, window inspection helpers over decoded bodies, and canned loaders that reach
//! resolved runtime objects through their accessor chains.
//!
//! # Examples
//!
//! ```rust
//! use classweave::assembly::Assembler;
//! use classweave::classfile::MethodRef;
//!
//! let log = MethodRef::new("demo/Log", "info", "(Ljava/lang/String;)V")?;
//! let mut asm = Assembler::new();
//! asm.push_str("starting")?.invoke_static(&log)?.ret()?;
//! assert_eq!(asm.finish().len(), 3);
//! # Ok::<(), classweave::Error>(())
//! ```

mod assembler;
mod dispatch;
mod inspect;
mod loaders;

pub use assembler::{Assembler, InstructionSink};
pub use dispatch::java_string_hash;
pub use inspect::{
    call_after, call_named, clinit_string_assignments, constant_index, field_access_before,
    last_class_constant,
};
pub use loaders::{
    load_assets_socket, load_client_bridge, load_lunar_main, load_player_bridge,
    load_server_data, load_server_mappings, to_bridge_component,
};
