//! The generated runtime utility class.

use crate::assembly::{load_assets_socket, load_client_bridge};
use crate::classfile::{ClassFile, TypeDesc, VarKind};
use crate::engine::EventKind;
use crate::generation::ClassBuilder;
use crate::resolution::{FactKey, ResolutionContext};
use crate::{Error, Result};

/// Interface every synthesized class implements, so host-side callers invoke the
/// callbacks without reflective lookup.
pub const PATCH_CALLBACKS: &str = "classweave/runtime/PatchCallbacks";

/// Internal name of the generated utility class.
pub const UTILITY_CLASS: &str = "classweave/runtime/Utility";

const REQUIRED_FACTS: [FactKey; 4] = [
    FactKey::AssetsSocketField,
    FactKey::SendPopupMethod,
    FactKey::GetClientBridgeMethod,
    FactKey::ClientVersion,
];

/// Synthesizes the utility class calling back into the resolved client symbols.
///
/// The class implements [`PATCH_CALLBACKS`] and carries three callbacks:
/// `displayPopup(String, String)` builds the client's popup packet and sends it over
/// the assets socket, `getClientBridge()` hands out the bridge instance, and
/// `getVersion()` returns the resolved client version literal.
///
/// # Errors
///
/// Returns [`Error::MissingFact`] when any fact the callbacks rely on is still
/// unresolved; no partially generated class is ever returned.
pub fn generate_utility_class(ctx: &ResolutionContext) -> Result<ClassFile> {
    for key in REQUIRED_FACTS {
        if !ctx.is_resolved(key) {
            return Err(Error::MissingFact(key));
        }
    }

    let (popup_kind, popup) = ctx.method_fact(FactKey::SendPopupMethod)?;
    let packet_type = popup
        .desc
        .args()
        .first()
        .and_then(TypeDesc::internal_name)
        .map(str::to_string)
        .ok_or_else(|| malformed_error!("{} takes no packet argument", popup))?;
    let version = ctx.string_fact(FactKey::ClientVersion)?;

    let string_type = TypeDesc::object("java/lang/String");
    let class = ClassBuilder::new(UTILITY_CLASS)
        .public()
        .implements(PATCH_CALLBACKS)
        .default_constructor()
        .method("displayPopup", |m| {
            m.public()
                .parameter(string_type.clone())
                .parameter(string_type.clone())
                .body(move |asm| {
                    load_assets_socket(asm, ctx)?;
                    asm.construct(
                        &packet_type,
                        "(Ljava/lang/String;Ljava/lang/String;)V",
                        |args| {
                            args.load(VarKind::Ref, 1)?.load(VarKind::Ref, 2)?;
                            Ok(())
                        },
                    )?
                    .invoke(popup_kind, &popup)?
                    .ret()?;
                    Ok(())
                })
        })
        .method("getClientBridge", |m| {
            m.public()
                .returns(TypeDesc::object("java/lang/Object"))
                .body(|asm| {
                    load_client_bridge(asm, ctx)?;
                    asm.ret_value(VarKind::Ref)?;
                    Ok(())
                })
        })
        .method("getVersion", |m| {
            m.public().returns(string_type).body(move |asm| {
                asm.push_str(&version)?.ret_value(VarKind::Ref)?;
                Ok(())
            })
        })
        .build()
        .map_err(|err| match err {
            Error::ResolutionMiss(key) => Error::MissingFact(key),
            other => other,
        })?;

    ctx.events().record_for(
        EventKind::ClassSynthesized,
        UTILITY_CLASS,
        format!("implements {PATCH_CALLBACKS}"),
    );
    Ok(class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::{FieldRef, InvokeKind, MethodRef, Op};
    use crate::engine::EventKind;
    use crate::resolution::FactValue;

    // Helper function to create a context with every fact except the main accessor
    fn popup_context(static_socket: bool) -> ResolutionContext {
        let ctx = ResolutionContext::with_heuristics(Vec::new());
        ctx.record(
            FactKey::AssetsSocketField,
            FactValue::Field {
                is_static: static_socket,
                field: FieldRef::new("lunar/aa", "e", "Llunar/ws/Socket;").unwrap(),
            },
        );
        ctx.record(
            FactKey::SendPopupMethod,
            FactValue::Method {
                kind: InvokeKind::Virtual,
                target: MethodRef::new("lunar/ws/Socket", "p", "(Llunar/pkt/Popup;)V").unwrap(),
            },
        );
        ctx.record(
            FactKey::GetClientBridgeMethod,
            FactValue::Method {
                kind: InvokeKind::Static,
                target: MethodRef::new("lunar/br/Holder", "c", "()Llunar/br/ClientBridge;")
                    .unwrap(),
            },
        );
        ctx.record(FactKey::ClientVersion, FactValue::Str("v2.10.1".into()));
        ctx
    }

    fn record_main(ctx: &ResolutionContext) {
        ctx.record(
            FactKey::GetLunarMainMethod,
            FactValue::Method {
                kind: InvokeKind::Static,
                target: MethodRef::new("lunar/aa", "b", "()Llunar/aa;").unwrap(),
            },
        );
    }

    #[test]
    fn test_generates_the_callbacks_class() -> Result<()> {
        let ctx = popup_context(false);
        record_main(&ctx);

        let class = generate_utility_class(&ctx)?;
        assert_eq!(class.name, UTILITY_CLASS);
        assert_eq!(class.interfaces, vec![PATCH_CALLBACKS.to_string()]);
        assert!(class.method("<init>", "()V").is_some());

        let popup = class
            .method("displayPopup", "(Ljava/lang/String;Ljava/lang/String;)V")
            .expect("popup callback");
        assert!(matches!(
            &popup.code[0].op,
            Op::Invoke(InvokeKind::Static, mref) if mref.name == "b"
        ));
        assert!(popup
            .code
            .iter()
            .any(|ins| matches!(&ins.op, Op::New(name) if name == "lunar/pkt/Popup")));
        assert!(popup
            .code
            .iter()
            .any(|ins| matches!(&ins.op, Op::Invoke(InvokeKind::Virtual, mref) if mref.name == "p")));

        let version = class
            .method("getVersion", "()Ljava/lang/String;")
            .expect("version callback");
        assert!(version.has_str_constant("v2.10.1"));

        assert_eq!(ctx.events().count(EventKind::ClassSynthesized), 1);
        Ok(())
    }

    #[test]
    fn test_static_socket_skips_the_main_accessor() -> Result<()> {
        let ctx = popup_context(true);
        let class = generate_utility_class(&ctx)?;
        let popup = class
            .method("displayPopup", "(Ljava/lang/String;Ljava/lang/String;)V")
            .expect("popup callback");
        assert!(matches!(&popup.code[0].op, Op::GetStatic(field) if field.name == "e"));
        Ok(())
    }

    #[test]
    fn test_unresolved_facts_block_generation() {
        let ctx = ResolutionContext::with_heuristics(Vec::new());
        let result = generate_utility_class(&ctx);
        assert!(matches!(result, Err(Error::MissingFact(_))));
    }

    #[test]
    fn test_instance_socket_without_main_accessor_is_a_missing_fact() {
        let ctx = popup_context(false);
        let result = generate_utility_class(&ctx);
        assert!(matches!(
            result,
            Err(Error::MissingFact(FactKey::GetLunarMainMethod))
        ));
    }
}
