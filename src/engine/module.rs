//! The module seam and its ordered registry.

use std::sync::Arc;

use crate::classfile::ClassFile;
use crate::engine::Transform;
use crate::resolution::ResolutionContext;
use crate::Result;

/// One self-contained patching concern.
///
/// A module looks at decoded classes and produces [`Transform`]s for the ones it wants
/// to change. Modules never mutate classes themselves and never see each other; the
/// composer owns application order and conflict handling. Implementations run
/// concurrently over distinct classes, so they hold only `Send + Sync` state and treat
/// the [`ResolutionContext`] as their only shared channel.
pub trait Module: Send + Sync {
    /// Stable name used in events, logs and conflict reports.
    fn name(&self) -> &str;

    /// Cheap pre-filter deciding whether [`Module::transform`] is worth calling.
    fn applies_to(&self, class: &ClassFile) -> bool;

    /// Produce the edits for a class this module applies to.
    ///
    /// Returning `Ok(None)` means the class turned out not to be interesting after all,
    /// which is common: pre-filters are deliberately coarse.
    ///
    /// # Errors
    ///
    /// Errors are contained by the composer; they skip this module for this class and
    /// never abort the run.
    fn transform(&self, class: &ClassFile, ctx: &ResolutionContext) -> Result<Option<Transform>>;

    /// Whether rewrites from this module need recomputed stack-map frames.
    fn requires_expansion(&self) -> bool {
        false
    }
}

/// Ordered collection of registered modules.
///
/// Registration order is application order, and earlier modules win method-level
/// conflicts.
#[derive(Default, Clone)]
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.modules.iter().map(|module| module.name()).collect();
        f.debug_struct("ModuleRegistry").field("modules", &names).finish()
    }
}

impl ModuleRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a module.
    pub fn register(&mut self, module: impl Module + 'static) -> &mut Self {
        self.register_arc(Arc::new(module))
    }

    /// Append an already shared module.
    pub fn register_arc(&mut self, module: Arc<dyn Module>) -> &mut Self {
        self.modules.push(module);
        self
    }

    /// The modules in registration order.
    #[must_use]
    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// Look up a module by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inert(&'static str);

    impl Module for Inert {
        fn name(&self) -> &str {
            self.0
        }

        fn applies_to(&self, _class: &ClassFile) -> bool {
            false
        }

        fn transform(
            &self,
            _class: &ClassFile,
            _ctx: &ResolutionContext,
        ) -> Result<Option<Transform>> {
            Ok(None)
        }
    }

    #[test]
    fn test_registration_order_and_lookup() {
        let mut registry = ModuleRegistry::new();
        registry.register(Inert("first")).register(Inert("second"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.modules()[0].name(), "first");
        assert!(registry.find("second").is_some());
        assert!(registry.find("third").is_none());
        assert!(!registry.modules()[0].requires_expansion());
    }
}
