//! Built-in patch modules.

use crate::assembly::Assembler;
use crate::classfile::{ClassFile, Cond, MethodInfo, MethodRef, TypeDesc, VarKind};
use crate::engine::{Module, TextMod, Transform};
use crate::matching::{MethodPredicate, ShapePattern};
use crate::resolution::ResolutionContext;
use crate::weaving::Advice;
use crate::Result;

/// Internal name of the synthesized runtime class backing injected mods.
pub const MOD_FACTORY: &str = "classweave/runtime/Mods";

const MODS_MANIFEST: &str = "mods.json";
const LANGUAGE_MANIFEST: &str = "language.json";
const FORMAT_DESC: &str =
    "(Ljava/lang/String;Ljava/lang/String;[Ljava/lang/Object;)Ljava/lang/String;";

// Selector for exactly one declared method, by name and full descriptor.
fn exact_selector(method: &MethodInfo) -> Result<MethodPredicate> {
    Ok(MethodPredicate::And(vec![
        MethodPredicate::named(method.name.clone()),
        MethodPredicate::Signature(ShapePattern::parse(method.desc.raw())?),
    ]))
}

/// Injects configured text mods into the client's mod set.
///
/// The mod loader class is recognized by a string-returning method carrying the
/// `mods.json` constant. Its set accessor gets exit advice that, for every configured
/// mod, constructs the mod object through the synthesized [`MOD_FACTORY`] class and adds
/// it to the returned set before the set leaves the method.
#[derive(Debug, Clone)]
pub struct ModRegistry {
    mods: Vec<TextMod>,
}

impl ModRegistry {
    /// A registry hook injecting the given mods.
    #[must_use]
    pub fn new(mods: Vec<TextMod>) -> Self {
        ModRegistry { mods }
    }
}

impl Module for ModRegistry {
    fn name(&self) -> &str {
        "mod-registry"
    }

    fn applies_to(&self, class: &ClassFile) -> bool {
        let string_type = TypeDesc::object("java/lang/String");
        class.methods.iter().any(|method| {
            method.desc.ret() == &string_type && method.has_str_constant(MODS_MANIFEST)
        })
    }

    fn transform(&self, class: &ClassFile, _ctx: &ResolutionContext) -> Result<Option<Transform>> {
        let set_type = TypeDesc::object("java/util/Set");
        let Some(target) = class.methods.iter().find(|method| method.desc.ret() == &set_type)
        else {
            return Ok(None);
        };
        if self.mods.is_empty() {
            return Ok(None);
        }

        let factory = MethodRef::new(
            MOD_FACTORY,
            "createTextMod",
            "(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/Object;",
        )?;
        let add = MethodRef::new("java/util/Set", "add", "(Ljava/lang/Object;)Z")?;
        let entries: Vec<(String, String)> = self
            .mods
            .iter()
            .map(|text_mod| (text_mod.id(), text_mod.text.clone()))
            .collect();

        let advice = Advice::new(exact_selector(target)?).on_exit(move |asm| {
            let (kind, slot) = asm
                .return_slot()
                .ok_or_else(|| malformed_error!("registry hook requires a value-returning host"))?;
            for (id, text) in &entries {
                asm.load(kind, slot)?
                    .push_str(id)?
                    .push_str(text)?
                    .invoke_static(&factory)?
                    .invoke_interface(&add)?
                    .pop()?;
            }
            Ok(())
        });
        Ok(Some(Transform::with_edit(advice).expand_frames()))
    }

    fn requires_expansion(&self) -> bool {
        true
    }
}

/// Maps injected mod ids back to their display names.
///
/// The client resolves feature display names through a format method with a fixed
/// `(String, String, Object[]) -> String` shape in the class loading `language.json`.
/// Enter advice short-circuits that method: when the first argument is a
/// `features.<id>` key and the second asks for the name, the id is dispatched through a
/// string switch over the configured mods and the display name is returned directly.
/// Unknown ids fall through to the original body.
#[derive(Debug, Clone)]
pub struct LangMapper {
    mapping: Vec<(String, String)>,
}

impl LangMapper {
    /// A mapper translating the ids of the given mods to their display names.
    #[must_use]
    pub fn new(mods: &[TextMod]) -> Self {
        LangMapper {
            mapping: mods
                .iter()
                .map(|text_mod| (text_mod.id(), text_mod.name.clone()))
                .collect(),
        }
    }
}

impl Module for LangMapper {
    fn name(&self) -> &str {
        "lang-mapper"
    }

    fn applies_to(&self, class: &ClassFile) -> bool {
        !self.mapping.is_empty() && class.has_str_constant(LANGUAGE_MANIFEST)
    }

    fn transform(&self, class: &ClassFile, _ctx: &ResolutionContext) -> Result<Option<Transform>> {
        let Some(target) = class
            .methods
            .iter()
            .find(|method| method.desc.raw() == FORMAT_DESC)
        else {
            return Ok(None);
        };

        let starts_with =
            MethodRef::new("java/lang/String", "startsWith", "(Ljava/lang/String;)Z")?;
        let equals = MethodRef::new("java/lang/String", "equals", "(Ljava/lang/Object;)Z")?;
        let split = MethodRef::new(
            "java/lang/String",
            "split",
            "(Ljava/lang/String;)[Ljava/lang/String;",
        )?;
        let mapping = self.mapping.clone();

        let advice = Advice::new(exact_selector(target)?).on_enter(move |asm| {
            let no_match = asm.new_label();

            // Only feature name lookups are intercepted.
            asm.load(VarKind::Ref, 1)?
                .push_str("features.")?
                .invoke_virtual(&starts_with)?
                .jump_if(Cond::Eq, no_match)?;
            asm.load(VarKind::Ref, 2)?
                .push_str("name")?
                .invoke_virtual(&equals)?
                .jump_if(Cond::Eq, no_match)?;

            // The id is the second segment of the dotted key.
            asm.load(VarKind::Ref, 1)?
                .push_str("\\.")?
                .invoke_virtual(&split)?
                .push_int(1)?
                .aaload()?;

            let arms: Vec<(String, _)> = mapping
                .iter()
                .map(|(id, display)| {
                    let display = display.clone();
                    (
                        id.clone(),
                        move |asm: &mut Assembler| -> Result<()> {
                            asm.push_str(&display)?.ret_value(VarKind::Ref)?;
                            Ok(())
                        },
                    )
                })
                .collect();
            asm.string_switch(no_match, &arms)?;
            asm.label(no_match)?;
            Ok(())
        });
        Ok(Some(Transform::with_edit(advice).expand_frames()))
    }

    fn requires_expansion(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::{ConstValue, Ins, InvokeKind, Op};
    use crate::test::fixtures;

    // Helper function to create the mod loader class the registry hook targets.
    fn mod_loader_class() -> ClassFile {
        let manifest = fixtures::returning_method(
            "a",
            "()Ljava/lang/String;",
            ConstValue::Str(MODS_MANIFEST.into()),
        );
        let mut accessor = MethodInfo::new("b", "()Ljava/util/Set;").unwrap();
        accessor.code = vec![
            Ins::from(Op::AconstNull),
            Ins::from(Op::Return(Some(VarKind::Ref))),
        ];
        fixtures::class_with_methods("lunar/mods/Loader", vec![manifest, accessor])
    }

    #[test]
    fn test_registry_adds_each_mod_before_return() -> Result<()> {
        let registry = ModRegistry::new(vec![
            TextMod::new("Uptime", "up 3h"),
            TextMod::new("Motd", "hello"),
        ]);
        let class = mod_loader_class();
        assert!(registry.applies_to(&class));

        let ctx = ResolutionContext::with_heuristics(Vec::new());
        let transform = registry.transform(&class, &ctx)?.expect("loader matched");
        assert!(transform.needs_expanded_frames());

        let woven = transform.edits()[0].apply(&class)?.expect("accessor matched");
        let accessor = woven.method("b", "()Ljava/util/Set;").unwrap();
        let adds = accessor
            .code
            .iter()
            .filter(|ins| {
                matches!(&ins.op, Op::Invoke(InvokeKind::Interface, mref) if mref.name == "add")
            })
            .count();
        assert_eq!(adds, 2);
        let factories = accessor
            .code
            .iter()
            .filter(|ins| {
                matches!(&ins.op, Op::Invoke(InvokeKind::Static, mref) if mref.owner == MOD_FACTORY)
            })
            .count();
        assert_eq!(factories, 2);
        assert!(accessor.has_str_constant("uptime-custom"));
        Ok(())
    }

    #[test]
    fn test_registry_without_set_accessor_produces_nothing() -> Result<()> {
        let class = fixtures::class_with_methods(
            "lunar/mods/Loader",
            vec![fixtures::returning_method(
                "a",
                "()Ljava/lang/String;",
                ConstValue::Str(MODS_MANIFEST.into()),
            )],
        );
        let registry = ModRegistry::new(vec![TextMod::new("Uptime", "up")]);
        let ctx = ResolutionContext::with_heuristics(Vec::new());

        assert!(registry.applies_to(&class));
        assert!(registry.transform(&class, &ctx)?.is_none());
        Ok(())
    }

    #[test]
    fn test_lang_mapper_intercepts_feature_names() -> Result<()> {
        let mut format = MethodInfo::new("c", FORMAT_DESC).unwrap();
        format.code = vec![
            Ins::from(Op::Ldc(ConstValue::Str("fallback".into()))),
            Ins::from(Op::Return(Some(VarKind::Ref))),
        ];
        let mut class = fixtures::class_with_methods("lunar/lang/Repo", vec![format]);
        class
            .methods
            .push(fixtures::str_const_method("d", LANGUAGE_MANIFEST));

        let mapper = LangMapper::new(&[TextMod::new("Uptime", "up")]);
        assert!(mapper.applies_to(&class));

        let ctx = ResolutionContext::with_heuristics(Vec::new());
        let transform = mapper.transform(&class, &ctx)?.expect("format matched");
        let woven = transform.edits()[0].apply(&class)?.expect("selector matched");

        let format = woven.method("c", FORMAT_DESC).unwrap();
        assert!(matches!(format.code[0].op, Op::Load(VarKind::Ref, 1)));
        assert!(format
            .code
            .iter()
            .any(|ins| matches!(&ins.op, Op::LookupSwitch { .. })));
        assert!(format
            .code
            .iter()
            .any(|ins| matches!(&ins.op, Op::Invoke(_, mref) if mref.name == "split")));
        assert!(format.has_str_constant("Uptime"));
        // The original body is still reachable as the fall-through.
        assert!(format.has_str_constant("fallback"));
        Ok(())
    }

    #[test]
    fn test_lang_mapper_idle_without_mods() {
        let mapper = LangMapper::new(&[]);
        let class = fixtures::class_with_methods(
            "lunar/lang/Repo",
            vec![fixtures::str_const_method("d", LANGUAGE_MANIFEST)],
        );
        assert!(!mapper.applies_to(&class));
    }
}
