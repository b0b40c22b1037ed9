//! The boundary between raw class bytes and the decoded model.

use crate::classfile::ClassFile;
use crate::Result;

/// Host-supplied conversion between raw class-file bytes and [`ClassFile`] descriptors.
///
/// The engine is deliberately agnostic about the byte-level class format: the host brings
/// whatever reader and writer it already has and exposes them through this trait. The
/// engine only calls [`ClassCodec::encode`] for classes it actually rewrote, so a class
/// that no module touches keeps its original bytes untouched, byte for byte.
///
/// Implementations translating a richer instruction set must normalize constant pushes to
/// [`crate::classfile::Op::Ldc`] on decode, and may need to recompute stack-map frames on
/// encode when the engine reports a rewrite with `expand_frames` set.
pub trait ClassCodec {
    /// Decode raw class bytes into the model.
    ///
    /// # Errors
    ///
    /// Returns an error when the bytes do not form a class this codec can read.
    fn decode(&self, bytes: &[u8]) -> Result<ClassFile>;

    /// Encode a class descriptor back into raw bytes.
    ///
    /// `expand_frames` is set when the rewrite changed control flow in ways that require
    /// stack-map frames to be recomputed rather than copied through.
    ///
    /// # Errors
    ///
    /// Returns an error when the descriptor cannot be represented by this codec.
    fn encode(&self, class: &ClassFile, expand_frames: bool) -> Result<Vec<u8>>;
}
