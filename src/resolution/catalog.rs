//! The built-in heuristic catalog.
//!
//! Each rule keys off constants and structure the obfuscator leaves intact. The marker
//! strings below contain `\u{1}` placeholders where the client's own formatter
//! substitutes values; they are matched verbatim, placeholders included.

use crate::assembly::{
    call_named, clinit_string_assignments, field_access_before, last_class_constant,
};
use crate::classfile::{ClassFile, ConstValue, InvokeKind, MethodDesc, MethodInfo, TypeDesc};
use crate::resolution::{Evidence, FactKey, FactValue, Heuristic};

/// Constant marking the client entry point class.
pub const LAUNCH_MARKER: &str = "Starting Lunar client...";
/// Constant marking the asset server socket class.
pub const ASSET_SERVER_URL: &str = "wss://assetserver.\u{1}/connect";
/// Constant marking the method that establishes the asset server connection.
pub const ASSET_CONNECTED: &str = "Connected to the AssetServer";
/// Format string of the popup sender.
pub const POPUP_FORMAT: &str = "\u{1}[\u{1}\u{1}\u{1}] \u{1}\u{1}";
/// Upload endpoint marking the screenshot handler.
pub const SCREENSHOT_PATH: &str = "/lc_upload_screenshot";
/// Notification text marking the screenshot handler.
pub const SCREENSHOT_TAKEN: &str = "Screenshot taken";
/// CDN URL marking the server mappings class.
pub const MAPPINGS_URL: &str = "https://servermappings.lunarclientcdn.com/servers.json";
/// Call name marking the bridge accessor class.
pub const SERVER_ACCESSOR: &str = "getLunarServer";
/// Format string marking the chat serializer.
pub const CHAT_MARKER: &str = " [x\u{1}]";
/// Internal name of the adventure component type the chat serializer consumes.
pub const ADVENTURE_COMPONENT: &str = "net/kyori/adventure/text/Component";
/// Prefix of the client's own package, used to recognize bridge types.
pub const CLIENT_PACKAGE_PREFIX: &str = "lunar/";

/// Every built-in rule, in evaluation order.
#[must_use]
pub fn builtin_heuristics() -> Vec<Heuristic> {
    vec![
        lunar_main(),
        assets_socket(),
        screenshotter(),
        server_mappings(),
        server_mappings_getter(),
        bridge(),
        client_bridge(),
        player_bridge(),
        chat_component(),
    ]
}

fn str_evidence(text: &str) -> Evidence {
    Evidence::HasConstant(ConstValue::Str(text.to_string()))
}

// How a method extracted from its declaration would be invoked from outside.
fn declared_invoke_kind(class: &ClassFile, method: &MethodInfo) -> InvokeKind {
    if method.is_static() {
        InvokeKind::Static
    } else if class.is_interface() {
        InvokeKind::Interface
    } else {
        InvokeKind::Virtual
    }
}

fn declared_method_fact(class: &ClassFile, method: &MethodInfo) -> FactValue {
    FactValue::Method {
        kind: declared_invoke_kind(class, method),
        target: method.as_method_ref(&class.name),
    }
}

// The string constant a static field holds, from its initializer attribute or from a
// direct assignment in the class initializer.
fn static_string_value(class: &ClassFile, name: &str) -> Option<String> {
    if let Some(field) = class.field(name) {
        if let Some(ConstValue::Str(text)) = &field.constant {
            return Some(text.clone());
        }
    }
    class
        .methods
        .iter()
        .find(|method| method.is_static_initializer())
        .and_then(|clinit| {
            clinit_string_assignments(clinit)
                .into_iter()
                .find(|(field, _)| *field == name)
                .map(|(_, text)| text.to_string())
        })
}

/// Entry point rule.
///
/// The class logging the launch marker is the client main class. Its singleton accessor
/// is the static method returning the class's own type; the runtime strings live in the
/// `version`, `os` and `arch` fields; and the asset socket is the field accessed right
/// before the `connect` call in the method that logs the connection.
fn lunar_main() -> Heuristic {
    Heuristic::new("lunar-main", str_evidence(LAUNCH_MARKER), |class, _| {
        let mut facts = vec![(
            FactKey::LunarClientClass,
            FactValue::Class(class.name.clone()),
        )];

        let own_type = TypeDesc::object(&class.name);
        if let Some(accessor) = class
            .methods
            .iter()
            .find(|method| method.is_static() && method.desc.ret() == &own_type)
        {
            facts.push((
                FactKey::GetLunarMainMethod,
                declared_method_fact(class, accessor),
            ));
        }

        for (key, field_name) in [
            (FactKey::ClientVersion, "version"),
            (FactKey::ClientOs, "os"),
            (FactKey::ClientArch, "arch"),
        ] {
            if let Some(text) = static_string_value(class, field_name) {
                facts.push((key, FactValue::Str(text)));
            }
        }

        if let Some((is_static, field)) = class
            .methods
            .iter()
            .filter(|method| method.has_str_constant(ASSET_CONNECTED))
            .find_map(|method| {
                let (index, _, _) = call_named(&method.code, "connect")?;
                field_access_before(&method.code, index)
            })
        {
            facts.push((
                FactKey::AssetsSocketField,
                FactValue::Field {
                    is_static,
                    field: field.clone(),
                },
            ));
        }

        Ok(facts)
    })
    .provides(&[
        FactKey::LunarClientClass,
        FactKey::GetLunarMainMethod,
        FactKey::ClientVersion,
        FactKey::ClientOs,
        FactKey::ClientArch,
        FactKey::AssetsSocketField,
    ])
}

/// Asset socket rule: the popup sender is the method formatting popup lines.
fn assets_socket() -> Heuristic {
    Heuristic::new("assets-socket", str_evidence(ASSET_SERVER_URL), |class, _| {
        Ok(class
            .methods
            .iter()
            .find(|method| method.has_str_constant(POPUP_FORMAT))
            .map(|method| (FactKey::SendPopupMethod, declared_method_fact(class, method)))
            .into_iter()
            .collect())
    })
    .provides(&[FactKey::SendPopupMethod])
}

/// Screenshot handler rule: the last class literal its constructor pushes is the
/// outgoing packet event type.
fn screenshotter() -> Heuristic {
    Heuristic::new(
        "screenshotter",
        Evidence::AllConstants(vec![
            ConstValue::Str(SCREENSHOT_PATH.to_string()),
            ConstValue::Str(SCREENSHOT_TAKEN.to_string()),
        ]),
        |class, _| {
            Ok(class
                .methods
                .iter()
                .find(|method| method.is_constructor())
                .and_then(|ctor| last_class_constant(&ctor.code))
                .map(|name| (FactKey::OutgoingPacketEvent, FactValue::Class(name.to_string())))
                .into_iter()
                .collect())
        },
    )
    .provides(&[FactKey::OutgoingPacketEvent])
}

/// Server mappings rule.
///
/// The class fetching the mappings CDN document owns the display-name lookup. The remap
/// method takes a string first and returns a string; the first call inside it fetches
/// the display-to-address map.
fn server_mappings() -> Heuristic {
    Heuristic::new("server-mappings", str_evidence(MAPPINGS_URL), |class, _| {
        let mut facts = vec![(
            FactKey::ServerMappingsClass,
            FactValue::Class(class.name.clone()),
        )];

        let string_type = TypeDesc::object("java/lang/String");
        let remap = class.methods.iter().find(|method| {
            method.desc.first_arg() == Some(&string_type) && method.desc.ret() == &string_type
        });
        if let Some((kind, target)) = remap.and_then(|method| {
            method.calls().next().map(|(kind, mref)| (kind, mref.clone()))
        }) {
            facts.push((
                FactKey::GetDisplayToIpMapMethod,
                FactValue::Method { kind, target },
            ));
        }

        Ok(facts)
    })
    .provides(&[FactKey::ServerMappingsClass, FactKey::GetDisplayToIpMapMethod])
}

/// Mappings accessor rule.
///
/// Runs on the entry point class, but only once the mappings class is known: the
/// accessor is the main-class method returning that type. Marker classes observed
/// before the mappings class are retained and revisited.
fn server_mappings_getter() -> Heuristic {
    Heuristic::new(
        "server-mappings-getter",
        str_evidence(LAUNCH_MARKER),
        |class, ctx| {
            let mappings_class = ctx.class_fact(FactKey::ServerMappingsClass)?;
            let mappings_type = TypeDesc::object(&mappings_class);
            Ok(class
                .methods
                .iter()
                .find(|method| method.desc.ret() == &mappings_type)
                .map(|method| {
                    (
                        FactKey::GetServerMappingsMethod,
                        declared_method_fact(class, method),
                    )
                })
                .into_iter()
                .collect())
        },
    )
    .depends_on(&[FactKey::ServerMappingsClass])
    .provides(&[FactKey::GetServerMappingsMethod])
}

/// Bridge accessor rule.
///
/// The method calling `getLunarServer` names the bridge class, and its first two calls
/// are the client bridge accessor and the server data accessor, with the invocation
/// kinds observed at the call sites.
fn bridge() -> Heuristic {
    Heuristic::new(
        "bridge",
        Evidence::CallsNamed(SERVER_ACCESSOR.to_string()),
        |class, _| {
            let Some(server_method) = class
                .methods
                .iter()
                .find(|method| method.calls().any(|(_, mref)| mref.name == SERVER_ACCESSOR))
            else {
                return Ok(Vec::new());
            };

            let mut facts = vec![(FactKey::BridgeClass, FactValue::Class(class.name.clone()))];
            let mut calls = server_method.calls();
            if let Some((kind, target)) = calls.next() {
                facts.push((
                    FactKey::GetClientBridgeMethod,
                    FactValue::Method {
                        kind,
                        target: target.clone(),
                    },
                ));
            }
            if let Some((kind, target)) = calls.next() {
                facts.push((
                    FactKey::GetServerDataMethod,
                    FactValue::Method {
                        kind,
                        target: target.clone(),
                    },
                ));
            }
            Ok(facts)
        },
    )
    .provides(&[
        FactKey::BridgeClass,
        FactKey::GetClientBridgeMethod,
        FactKey::GetServerDataMethod,
    ])
}

/// Client bridge rule: the interface declaring `bridge$getPlayer`.
fn client_bridge() -> Heuristic {
    Heuristic::new("client-bridge", Evidence::IsInterface, |class, _| {
        Ok(class
            .methods
            .iter()
            .find(|method| method.name == "bridge$getPlayer")
            .map(|method| (FactKey::GetPlayerMethod, declared_method_fact(class, method)))
            .into_iter()
            .collect())
    })
    .provides(&[FactKey::GetPlayerMethod])
}

/// Player bridge rule: the interface declaring `bridge$addChatMessage`.
fn player_bridge() -> Heuristic {
    Heuristic::new("player-bridge", Evidence::IsInterface, |class, _| {
        Ok(class
            .methods
            .iter()
            .find(|method| method.name == "bridge$addChatMessage")
            .map(|method| {
                (
                    FactKey::DisplayMessageMethod,
                    declared_method_fact(class, method),
                )
            })
            .into_iter()
            .collect())
    })
    .provides(&[FactKey::DisplayMessageMethod])
}

/// Chat serializer rule.
///
/// In the method formatting the chat marker, the converter is the first call taking an
/// adventure component and returning a type from the client's own package.
fn chat_component() -> Heuristic {
    Heuristic::new("chat-component", str_evidence(CHAT_MARKER), |class, _| {
        let Some(method) = class
            .methods
            .iter()
            .find(|method| method.has_str_constant(CHAT_MARKER))
        else {
            return Ok(Vec::new());
        };

        Ok(method
            .calls()
            .find(|(_, mref)| takes_component_returns_bridge(&mref.desc))
            .map(|(kind, target)| {
                (
                    FactKey::ToBridgeComponentMethod,
                    FactValue::Method {
                        kind,
                        target: target.clone(),
                    },
                )
            })
            .into_iter()
            .collect())
    })
    .provides(&[FactKey::ToBridgeComponentMethod])
}

fn takes_component_returns_bridge(desc: &MethodDesc) -> bool {
    let first_is_component = desc
        .first_arg()
        .and_then(TypeDesc::internal_name)
        .is_some_and(|name| name == ADVENTURE_COMPONENT);
    let returns_bridge = desc
        .ret()
        .internal_name()
        .is_some_and(|name| name.starts_with(CLIENT_PACKAGE_PREFIX));
    first_is_component && returns_bridge
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::{ClassAccess, FieldInfo, Ins, MethodAccess, MethodRef, Op, VarKind};
    use crate::resolution::ResolutionContext;
    use crate::test::fixtures;

    // Helper function to create the obfuscated entry point class the catalog expects.
    fn lunar_main_class() -> ClassFile {
        let mut class = ClassFile::new("lunar/aa");

        let mut accessor = MethodInfo::new("b", "()Llunar/aa;").unwrap();
        accessor.access = MethodAccess::PUBLIC | MethodAccess::STATIC;
        accessor.code = vec![
            Ins::from(Op::GetStatic(
                crate::classfile::FieldRef::new("lunar/aa", "c", "Llunar/aa;").unwrap(),
            )),
            Ins::from(Op::Return(Some(VarKind::Ref))),
        ];

        let mut launcher = fixtures::str_const_method("d", LAUNCH_MARKER);
        launcher.code.extend([
            Ins::from(Op::Load(VarKind::Ref, 0)),
            Ins::from(Op::GetField(
                crate::classfile::FieldRef::new("lunar/aa", "e", "Llunar/net/Socket;").unwrap(),
            )),
            Ins::from(Op::Invoke(
                InvokeKind::Virtual,
                MethodRef::new("lunar/net/Socket", "connect", "()V").unwrap(),
            )),
        ]);
        launcher
            .code
            .insert(0, Ins::from(Op::Ldc(ConstValue::Str(ASSET_CONNECTED.into()))));
        launcher.code.insert(1, Ins::from(Op::Pop));

        let mut clinit = MethodInfo::new("<clinit>", "()V").unwrap();
        clinit.access = MethodAccess::STATIC;
        clinit.code = vec![
            Ins::from(Op::Ldc(ConstValue::Str("v2.15.1".into()))),
            Ins::from(Op::PutStatic(
                crate::classfile::FieldRef::new("lunar/aa", "version", "Ljava/lang/String;")
                    .unwrap(),
            )),
            Ins::from(Op::Return(None)),
        ];

        let mut os_field = FieldInfo::new("os", "Ljava/lang/String;").unwrap();
        os_field.access = crate::classfile::FieldAccess::STATIC;
        os_field.constant = Some(ConstValue::Str("Linux".into()));

        class.fields.push(os_field);
        class.methods = vec![accessor, launcher, clinit];
        class
    }

    #[test]
    fn test_lunar_main_extraction() {
        let ctx = ResolutionContext::new();
        ctx.observe(&lunar_main_class());

        assert_eq!(ctx.class_fact(FactKey::LunarClientClass).unwrap(), "lunar/aa");
        let (kind, accessor) = ctx.method_fact(FactKey::GetLunarMainMethod).unwrap();
        assert_eq!(kind, InvokeKind::Static);
        assert_eq!(accessor.name, "b");

        assert_eq!(ctx.string_fact(FactKey::ClientVersion).unwrap(), "v2.15.1");
        assert_eq!(ctx.string_fact(FactKey::ClientOs).unwrap(), "Linux");
        assert!(ctx.string_fact(FactKey::ClientArch).is_err());

        let (is_static, socket) = ctx.field_fact(FactKey::AssetsSocketField).unwrap();
        assert!(!is_static);
        assert_eq!(socket.name, "e");
        assert_eq!(socket.owner, "lunar/aa");
    }

    #[test]
    fn test_bridge_extraction_keeps_observed_kinds() {
        let mut method = fixtures::calling_method(
            "f",
            "()V",
            &[("lunar/bridge/Holder", "g", "()Llunar/bridge/Client;")],
        );
        method.code.insert(
            1,
            Ins::from(Op::Invoke(
                InvokeKind::Interface,
                MethodRef::new("lunar/bridge/Client", "getLunarServer", "()Llunar/bridge/Server;")
                    .unwrap(),
            )),
        );
        let class = fixtures::class_with_methods("lunar/bridge/Impl", vec![method]);

        let ctx = ResolutionContext::new();
        ctx.observe(&class);

        assert_eq!(ctx.class_fact(FactKey::BridgeClass).unwrap(), "lunar/bridge/Impl");
        let (kind, client) = ctx.method_fact(FactKey::GetClientBridgeMethod).unwrap();
        assert_eq!(kind, InvokeKind::Static);
        assert_eq!(client.name, "g");
        let (kind, server) = ctx.method_fact(FactKey::GetServerDataMethod).unwrap();
        assert_eq!(kind, InvokeKind::Interface);
        assert_eq!(server.name, "getLunarServer");
    }

    #[test]
    fn test_interface_bridges_resolve_interface_kind() {
        let mut class = fixtures::class_with_methods(
            "lunar/bridge/IPlayer",
            vec![MethodInfo::new("bridge$addChatMessage", "(Llunar/bridge/Component;)V").unwrap()],
        );
        class.access = ClassAccess::PUBLIC | ClassAccess::INTERFACE | ClassAccess::ABSTRACT;

        let ctx = ResolutionContext::new();
        ctx.observe(&class);

        let (kind, target) = ctx.method_fact(FactKey::DisplayMessageMethod).unwrap();
        assert_eq!(kind, InvokeKind::Interface);
        assert_eq!(target.owner, "lunar/bridge/IPlayer");
        assert!(ctx.method_fact(FactKey::GetPlayerMethod).is_err());
    }

    #[test]
    fn test_mappings_getter_waits_for_mappings_class() {
        let ctx = ResolutionContext::new();

        let mut main = lunar_main_class();
        let getter = MethodInfo::new("h", "()Llunar/maps/Lookup;").unwrap();
        main.methods.push(getter);
        ctx.observe(&main);
        assert!(ctx.method_fact(FactKey::GetServerMappingsMethod).is_err());
        assert_eq!(ctx.retained_count(), 1);

        let mut remap = MethodInfo::new("i", "(Ljava/lang/String;)Ljava/lang/String;").unwrap();
        remap.code = vec![
            Ins::from(Op::Invoke(
                InvokeKind::Virtual,
                MethodRef::new("lunar/maps/Lookup", "j", "()Ljava/util/Map;").unwrap(),
            )),
            Ins::from(Op::Return(Some(VarKind::Ref))),
        ];
        let mut mappings = fixtures::class_with_methods("lunar/maps/Lookup", vec![remap]);
        mappings
            .methods
            .push(fixtures::str_const_method("k", MAPPINGS_URL));
        ctx.observe(&mappings);

        assert_eq!(
            ctx.class_fact(FactKey::ServerMappingsClass).unwrap(),
            "lunar/maps/Lookup"
        );
        let (_, map_getter) = ctx.method_fact(FactKey::GetDisplayToIpMapMethod).unwrap();
        assert_eq!(map_getter.name, "j");

        // The retained entry point was revisited once the dependency landed.
        let (kind, getter) = ctx.method_fact(FactKey::GetServerMappingsMethod).unwrap();
        assert_eq!(kind, InvokeKind::Virtual);
        assert_eq!(getter.name, "h");
        assert_eq!(ctx.retained_count(), 0);
    }

    #[test]
    fn test_screenshotter_takes_last_class_literal() {
        let mut ctor = MethodInfo::new("<init>", "()V").unwrap();
        ctor.code = vec![
            Ins::from(Op::Ldc(ConstValue::Class("lunar/event/First".into()))),
            Ins::from(Op::Pop),
            Ins::from(Op::Ldc(ConstValue::Str(SCREENSHOT_PATH.into()))),
            Ins::from(Op::Pop),
            Ins::from(Op::Ldc(ConstValue::Class("lunar/event/SendPacket".into()))),
            Ins::from(Op::Pop),
            Ins::from(Op::Return(None)),
        ];
        let mut class = fixtures::class_with_methods("lunar/shot/Handler", vec![ctor]);
        class
            .methods
            .push(fixtures::str_const_method("l", SCREENSHOT_TAKEN));

        let ctx = ResolutionContext::new();
        ctx.observe(&class);

        assert_eq!(
            ctx.class_fact(FactKey::OutgoingPacketEvent).unwrap(),
            "lunar/event/SendPacket"
        );
    }

    #[test]
    fn test_chat_component_converter() {
        let mut format = fixtures::str_const_method("m", CHAT_MARKER);
        format.code.splice(
            2..2,
            [
                Ins::from(Op::Invoke(
                    InvokeKind::Static,
                    MethodRef::new(
                        "lunar/text/Convert",
                        "n",
                        "(Lnet/kyori/adventure/text/Component;)Llunar/text/Component;",
                    )
                    .unwrap(),
                )),
            ],
        );
        let class = fixtures::class_with_methods("lunar/chat/Mod", vec![format]);

        let ctx = ResolutionContext::new();
        ctx.observe(&class);

        let (kind, converter) = ctx.method_fact(FactKey::ToBridgeComponentMethod).unwrap();
        assert_eq!(kind, InvokeKind::Static);
        assert_eq!(converter.owner, "lunar/text/Convert");
    }

    #[test]
    fn test_popup_sender_resolved_virtual() {
        let class = fixtures::class_with_methods(
            "lunar/net/Socket",
            vec![
                fixtures::str_const_method("o", ASSET_SERVER_URL),
                fixtures::str_const_method("p", POPUP_FORMAT),
            ],
        );

        let ctx = ResolutionContext::new();
        ctx.observe(&class);

        let (kind, sender) = ctx.method_fact(FactKey::SendPopupMethod).unwrap();
        assert_eq!(kind, InvokeKind::Virtual);
        assert_eq!(sender.name, "p");
        assert_eq!(sender.owner, "lunar/net/Socket");
    }
}
