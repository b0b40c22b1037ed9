//! The unit of change a module produces.

use crate::classfile::ClassFile;
use crate::weaving::Advice;

/// A set of advice edits one module wants applied to one class.
#[derive(Debug, Clone, Default)]
pub struct Transform {
    edits: Vec<Advice>,
    expand_frames: bool,
}

impl Transform {
    /// An empty transform.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A transform carrying a single edit.
    #[must_use]
    pub fn with_edit(advice: Advice) -> Self {
        Self::new().edit(advice)
    }

    /// Append an edit.
    #[must_use]
    pub fn edit(mut self, advice: Advice) -> Self {
        self.edits.push(advice);
        self
    }

    /// Mark the rewrite as needing recomputed stack-map frames on encode.
    #[must_use]
    pub fn expand_frames(mut self) -> Self {
        self.expand_frames = true;
        self
    }

    /// The edits, in the order they were added.
    #[must_use]
    pub fn edits(&self) -> &[Advice] {
        &self.edits
    }

    /// Whether the encode side must recompute stack-map frames.
    #[must_use]
    pub fn needs_expanded_frames(&self) -> bool {
        self.expand_frames
    }

    /// Whether the transform carries no edits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// What composing every module over one class produced.
#[derive(Debug, Clone)]
pub enum TransformOutcome {
    /// No module changed anything; the original bytes should be kept as they are.
    Unchanged,
    /// At least one edit was woven.
    Rewritten {
        /// The rewritten class.
        class: ClassFile,
        /// Whether encoding must recompute stack-map frames.
        expand_frames: bool,
    },
}

impl TransformOutcome {
    /// Whether nothing was changed.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        matches!(self, TransformOutcome::Unchanged)
    }

    /// The rewritten class, if there is one.
    #[must_use]
    pub fn rewritten(&self) -> Option<&ClassFile> {
        match self {
            TransformOutcome::Unchanged => None,
            TransformOutcome::Rewritten { class, .. } => Some(class),
        }
    }
}
