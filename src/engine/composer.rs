//! The engine proper: module orchestration over decoded classes.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::classfile::{ClassCodec, ClassFile};
use crate::engine::config::EngineConfig;
use crate::engine::events::{EventKind, EventLog};
use crate::engine::mods::{LangMapper, ModRegistry};
use crate::engine::module::{Module, ModuleRegistry};
use crate::engine::transform::TransformOutcome;
use crate::resolution::ResolutionContext;
use crate::Result;

/// Drives registered [`Module`]s over every observed class.
///
/// The engine owns the [`ResolutionContext`] and a [`ModuleRegistry`] built once at
/// startup. Each delivered class is first shown to the resolver, then offered to every
/// module in registration order; the merged edits produce a [`TransformOutcome`].
/// Failures never escape a single class: module errors and weaving conflicts are
/// logged and recorded in the [`EventLog`], and the class passes through unchanged.
#[derive(Debug, Default)]
pub struct Engine {
    registry: ModuleRegistry,
    ctx: ResolutionContext,
}

impl Engine {
    /// An engine with the built-in heuristic catalog and no modules.
    #[must_use]
    pub fn new() -> Self {
        Engine {
            registry: ModuleRegistry::new(),
            ctx: ResolutionContext::new(),
        }
    }

    /// An engine over a prepared module registry.
    #[must_use]
    pub fn with_registry(registry: ModuleRegistry) -> Self {
        Engine {
            registry,
            ctx: ResolutionContext::new(),
        }
    }

    /// Builds an engine from a deserialized configuration, registering the enabled
    /// built-in modules in their fixed order.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut engine = Engine::new();
        if config.enable_mod_registry {
            engine.register(ModRegistry::new(config.text_mods.clone()));
        }
        if config.enable_lang_mapper {
            engine.register(LangMapper::new(&config.text_mods));
        }
        engine
    }

    /// Append a module; later registrations lose method-overlap conflicts.
    pub fn register(&mut self, module: impl Module + 'static) -> &mut Self {
        self.registry.register(module);
        self
    }

    /// The resolution context shared with every module.
    #[must_use]
    pub fn resolution(&self) -> &ResolutionContext {
        &self.ctx
    }

    /// The registered modules.
    #[must_use]
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Diagnostic record of everything the engine did so far.
    #[must_use]
    pub fn events(&self) -> &EventLog {
        self.ctx.events()
    }

    /// Runs every applicable module over one decoded class.
    ///
    /// The class is observed by the resolver first, so modules already see any facts
    /// its own evidence contributes. Modules match against the original descriptor;
    /// modules that require frame expansion transform the current, partially edited
    /// descriptor instead, since they layer by intent. When two modules' edits land
    /// on the same method the first-registered module wins and the later edit is
    /// dropped with a [`EventKind::TransformDropped`] record.
    pub fn transform_class(&self, class: &ClassFile) -> TransformOutcome {
        self.ctx.observe(class);

        let mut current = class.clone();
        let mut woven_any = false;
        let mut expand = false;
        let mut claimed: HashMap<usize, &str> = HashMap::new();

        for module in self.registry.modules() {
            if !module.applies_to(class) {
                continue;
            }
            let layered = module.requires_expansion();
            let subject = if layered { &current } else { class };
            let transform = match module.transform(subject, &self.ctx) {
                Ok(Some(transform)) => transform,
                Ok(None) => continue,
                Err(err) => {
                    log::debug!("module {} skipped {}: {err}", module.name(), class.name);
                    self.ctx.events().record_for(
                        EventKind::ModuleSkipped,
                        &class.name,
                        format!("{}: {err}", module.name()),
                    );
                    continue;
                }
            };
            expand |= layered || transform.needs_expanded_frames();

            for advice in transform.edits() {
                if !advice.has_fragments() {
                    continue;
                }
                for index in class.matching_indices(advice.selector()) {
                    let method = &class.methods[index];
                    if method.code.is_empty() {
                        continue;
                    }
                    if let Some(owner) = claimed.get(&index) {
                        if *owner != module.name() && !layered {
                            log::warn!(
                                "dropping {} edit on {}.{}: already edited by {owner}",
                                module.name(),
                                class.name,
                                method.name,
                            );
                            self.ctx.events().record_for(
                                EventKind::TransformDropped,
                                &class.name,
                                format!(
                                    "{}: {}{} already edited by {owner}",
                                    module.name(),
                                    method.name,
                                    method.desc.raw(),
                                ),
                            );
                            continue;
                        }
                    }
                    match advice.weave_index(&mut current, index) {
                        Ok(()) => {
                            claimed.insert(index, module.name());
                            woven_any = true;
                            self.ctx.events().record_for(
                                EventKind::AdviceWoven,
                                &class.name,
                                format!(
                                    "{} wove {}{}",
                                    module.name(),
                                    method.name,
                                    method.desc.raw(),
                                ),
                            );
                        }
                        Err(err) => {
                            log::warn!(
                                "dropping {} edit on {}.{}: {err}",
                                module.name(),
                                class.name,
                                method.name,
                            );
                            self.ctx.events().record_for(
                                EventKind::TransformDropped,
                                &class.name,
                                format!("{}: {err}", module.name()),
                            );
                        }
                    }
                }
            }
        }

        if woven_any {
            TransformOutcome::Rewritten {
                class: current,
                expand_frames: expand,
            }
        } else {
            TransformOutcome::Unchanged
        }
    }

    /// Full decode, transform, encode round for one class-load event.
    ///
    /// `Ok(None)` signals the host to keep the original bytes. A panic inside module
    /// code is contained here; the class passes through unchanged and an
    /// [`EventKind::Error`] record is kept.
    ///
    /// # Errors
    ///
    /// Returns the codec's error when the incoming bytes do not decode or the
    /// rewritten class does not encode.
    pub fn process(&self, bytes: &[u8], codec: &dyn ClassCodec) -> Result<Option<Vec<u8>>> {
        let class = codec.decode(bytes)?;
        let outcome = match catch_unwind(AssertUnwindSafe(|| self.transform_class(&class))) {
            Ok(outcome) => outcome,
            Err(_) => {
                log::error!("transforming {} panicked, passing it through", class.name);
                self.ctx.events().record_for(
                    EventKind::Error,
                    &class.name,
                    "transformation panicked",
                );
                return Ok(None);
            }
        };
        match outcome {
            TransformOutcome::Unchanged => Ok(None),
            TransformOutcome::Rewritten {
                class,
                expand_frames,
            } => codec.encode(&class, expand_frames).map(Some),
        }
    }
}
