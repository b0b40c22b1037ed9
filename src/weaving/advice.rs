//! Enter and exit advice woven around matched methods.

use std::sync::Arc;

use crate::assembly::Assembler;
use crate::classfile::{ClassFile, Op};
use crate::matching::MethodPredicate;
use crate::{Error, Result};

/// A reusable piece of advice code, assembled lazily against each host method.
///
/// Fragments run once per weave site with an [`Assembler`] whose label and local cursors
/// are already seeded past everything the host body uses. They are shared and may run
/// from several threads, so they capture only `Send + Sync` state.
pub type CodeFragment = Arc<dyn Fn(&mut Assembler) -> Result<()> + Send + Sync>;

/// A method selector paired with code to run on entry and/or before every return.
///
/// Weaving is purely structural: the enter fragment is spliced in front of the original
/// first instruction, and the exit fragment is copied in front of every return the
/// original body had. For a non-void method the in-flight return value is parked in a
/// fresh local for the duration of the exit fragment and reloaded afterwards; fragments
/// observe it through [`Assembler::return_slot`].
///
/// ```rust
/// use classweave::prelude::*;
///
/// let class = ClassFile::new("demo/Widget");
/// let advice = Advice::new(MethodPredicate::Any).on_enter(|asm| {
///     asm.push_int(1)?.pop()?;
///     Ok(())
/// });
/// // No method matches in an empty class, so nothing is produced.
/// assert!(advice.apply(&class)?.is_none());
/// # Ok::<(), classweave::Error>(())
/// ```
#[derive(Clone)]
pub struct Advice {
    selector: MethodPredicate,
    enter: Option<CodeFragment>,
    exit: Option<CodeFragment>,
}

impl std::fmt::Debug for Advice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Advice")
            .field("selector", &self.selector)
            .field("enter", &self.enter.is_some())
            .field("exit", &self.exit.is_some())
            .finish()
    }
}

impl Advice {
    /// Advice with the given selector and no fragments yet.
    #[must_use]
    pub fn new(selector: MethodPredicate) -> Self {
        Advice {
            selector,
            enter: None,
            exit: None,
        }
    }

    /// Attach a fragment to run before the original first instruction.
    #[must_use]
    pub fn on_enter<F>(mut self, fragment: F) -> Self
    where
        F: Fn(&mut Assembler) -> Result<()> + Send + Sync + 'static,
    {
        self.enter = Some(Arc::new(fragment));
        self
    }

    /// Attach a fragment to run before every return of the original body.
    #[must_use]
    pub fn on_exit<F>(mut self, fragment: F) -> Self
    where
        F: Fn(&mut Assembler) -> Result<()> + Send + Sync + 'static,
    {
        self.exit = Some(Arc::new(fragment));
        self
    }

    /// The method selector this advice targets.
    #[must_use]
    pub fn selector(&self) -> &MethodPredicate {
        &self.selector
    }

    /// Whether the advice carries any code at all.
    #[must_use]
    pub fn has_fragments(&self) -> bool {
        self.enter.is_some() || self.exit.is_some()
    }

    /// Weave this advice into every matching method of `class`.
    ///
    /// The input is never modified. Returns `None` when no method matches the selector,
    /// when the advice has no fragments, or when every matching method is bodyless;
    /// otherwise returns the rewritten class.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WeavingConflict`] when a woven body fails stack verification, and
    /// propagates fragment assembly failures such as resolution misses.
    pub fn apply(&self, class: &ClassFile) -> Result<Option<ClassFile>> {
        if !self.has_fragments() {
            return Ok(None);
        }
        let indices: Vec<usize> = class
            .matching_indices(&self.selector)
            .into_iter()
            .filter(|&index| !class.methods[index].code.is_empty())
            .collect();
        if indices.is_empty() {
            return Ok(None);
        }

        let mut woven = class.clone();
        for index in indices {
            self.weave_index(&mut woven, index)?;
        }
        Ok(Some(woven))
    }

    /// Weave this advice into one method in place.
    ///
    /// Return positions are captured from the body before the enter fragment lands, so an
    /// exit fragment is copied only in front of returns the original method had. Exit
    /// copies are spliced back to front to keep earlier positions stable, and every copy
    /// assembles against fresh label and local bases that account for all code spliced so
    /// far.
    pub(crate) fn weave_index(&self, class: &mut ClassFile, index: usize) -> Result<()> {
        let class_name = class.name.clone();
        let method = &mut class.methods[index];
        // Abstract and native methods have no body to weave.
        if method.code.is_empty() {
            return Ok(());
        }
        let method_name = method.name.clone();

        let mut returns: Vec<usize> = method
            .code
            .iter()
            .enumerate()
            .filter(|(_, ins)| ins.op.is_return())
            .map(|(position, _)| position)
            .collect();

        if let Some(enter) = &self.enter {
            let mut asm = Assembler::for_method(method);
            enter(&mut asm)?;
            let fragment = asm.finish();
            let shift = fragment.len();
            method.code.splice(0..0, fragment);
            for position in &mut returns {
                *position += shift;
            }
        }

        if let Some(exit) = &self.exit {
            for &position in returns.iter().rev() {
                let returned = match &method.code[position].op {
                    Op::Return(kind) => *kind,
                    _ => continue,
                };
                let mut asm = Assembler::for_method(method);
                if let Some(kind) = returned {
                    let slot = asm.alloc_local(kind);
                    asm.store(kind, slot)?;
                    asm.set_return_slot(Some((kind, slot)));
                    exit(&mut asm)?;
                    asm.load(kind, slot)?;
                } else {
                    exit(&mut asm)?;
                }
                let fragment = asm.finish();
                method.code.splice(position..position, fragment);
            }
        }

        let min_locals = method.arg_slots();
        match super::stack::compute_limits(&method.code, &method.try_catches, min_locals) {
            Ok((max_stack, max_locals)) => {
                method.max_stack = max_stack;
                method.max_locals = method.max_locals.max(max_locals);
                Ok(())
            }
            Err(message) => Err(Error::WeavingConflict {
                class: class_name,
                method: method_name,
                message,
            }),
        }
    }
}
