//! End-to-end pipeline tests: decode, resolve, transform and encode through a codec.
//!
//! The codec here serializes classes as JSON, standing in for the host-side class-file
//! reader; the engine only ever works on the decoded model. The tests cover the
//! pass-through contract for untouched classes, a configured mod travelling all the way
//! to re-encoded bytes, observation feeding the class synthesizer, and codec errors
//! surfacing instead of being swallowed.

use classweave::prelude::*;
use classweave::resolution::catalog;

struct JsonCodec;

impl ClassCodec for JsonCodec {
    fn decode(&self, bytes: &[u8]) -> Result<ClassFile> {
        serde_json::from_slice(bytes).map_err(|err| Error::Malformed {
            message: err.to_string(),
            file: file!(),
            line: line!(),
        })
    }

    fn encode(&self, class: &ClassFile, _expand_frames: bool) -> Result<Vec<u8>> {
        serde_json::to_vec(class).map_err(|err| Error::Malformed {
            message: err.to_string(),
            file: file!(),
            line: line!(),
        })
    }
}

fn encode_fixture(class: &ClassFile) -> Vec<u8> {
    serde_json::to_vec(class).expect("fixture serializes")
}

fn plain_class() -> Result<ClassFile> {
    let mut class = ClassFile::new("app/Plain");
    let mut tick = MethodInfo::new("tick", "()V")?;
    tick.code = vec![Op::Return(None).into()];
    class.methods.push(tick);
    Ok(class)
}

fn mod_loader() -> Result<ClassFile> {
    let mut class = ClassFile::new("lunar/mods/Loader");

    let mut manifest = MethodInfo::new("a", "()Ljava/lang/String;")?;
    manifest.code = vec![
        Op::Ldc(ConstValue::Str("mods.json".into())).into(),
        Op::Return(Some(VarKind::Ref)).into(),
    ];

    let mut accessor = MethodInfo::new("b", "()Ljava/util/Set;")?;
    accessor.code = vec![Op::AconstNull.into(), Op::Return(Some(VarKind::Ref)).into()];

    class.methods = vec![manifest, accessor];
    Ok(class)
}

// The obfuscated entry point: launch marker, singleton accessor, version assignment
// and the asset socket connect site, as the resolver expects to find them.
fn entry_point() -> Result<ClassFile> {
    let mut class = ClassFile::new("lunar/aa");

    let mut accessor = MethodInfo::new("b", "()Llunar/aa;")?;
    accessor.access = MethodAccess::PUBLIC | MethodAccess::STATIC;
    accessor.code = vec![
        Op::GetStatic(FieldRef::new("lunar/aa", "c", "Llunar/aa;")?).into(),
        Op::Return(Some(VarKind::Ref)).into(),
    ];

    let mut launcher = MethodInfo::new("d", "()V")?;
    launcher.code = vec![
        Op::Ldc(ConstValue::Str(catalog::LAUNCH_MARKER.into())).into(),
        Op::Pop.into(),
        Op::Ldc(ConstValue::Str(catalog::ASSET_CONNECTED.into())).into(),
        Op::Pop.into(),
        Op::Load(VarKind::Ref, 0).into(),
        Op::GetField(FieldRef::new("lunar/aa", "e", "Llunar/net/Socket;")?).into(),
        Op::Invoke(
            InvokeKind::Virtual,
            MethodRef::new("lunar/net/Socket", "connect", "()V")?,
        )
        .into(),
        Op::Return(None).into(),
    ];

    let mut clinit = MethodInfo::new("<clinit>", "()V")?;
    clinit.access = MethodAccess::STATIC;
    clinit.code = vec![
        Op::Ldc(ConstValue::Str("v2.15.1".into())).into(),
        Op::PutStatic(FieldRef::new("lunar/aa", "version", "Ljava/lang/String;")?).into(),
        Op::Return(None).into(),
    ];

    class.methods = vec![accessor, launcher, clinit];
    Ok(class)
}

#[test]
fn untouched_classes_pass_through() -> Result<()> {
    let engine = Engine::from_config(&EngineConfig::default());

    let result = engine.process(&encode_fixture(&plain_class()?), &JsonCodec)?;

    assert!(result.is_none(), "unmodified classes keep their original bytes");
    assert_eq!(engine.events().count(EventKind::AdviceWoven), 0);
    Ok(())
}

#[test]
fn configured_mods_are_injected_end_to_end() -> Result<()> {
    let config = EngineConfig {
        text_mods: vec![TextMod::new("Uptime", "up 3h")],
        ..EngineConfig::default()
    };
    let engine = Engine::from_config(&config);

    let rewritten = engine
        .process(&encode_fixture(&mod_loader()?), &JsonCodec)?
        .expect("the loader class is rewritten");
    let decoded: ClassFile = serde_json::from_slice(&rewritten).expect("output decodes");

    let accessor = decoded.method("b", "()Ljava/util/Set;").expect("accessor kept");
    assert!(accessor.has_str_constant("uptime-custom"));
    assert!(accessor.code.iter().any(|ins| {
        matches!(&ins.op, Op::Invoke(InvokeKind::Static, mref) if mref.owner == MOD_FACTORY)
    }));
    assert!(accessor.code.iter().any(|ins| {
        matches!(&ins.op, Op::Invoke(InvokeKind::Interface, mref) if mref.name == "add")
    }));
    Ok(())
}

#[test]
fn observed_classes_feed_the_synthesizer() -> Result<()> {
    let engine = Engine::from_config(&EngineConfig::default());

    // The entry point passes through unmodified, but observation extracts its facts.
    let result = engine.process(&encode_fixture(&entry_point()?), &JsonCodec)?;
    assert!(result.is_none());
    assert!(engine.events().count(EventKind::FactResolved) >= 4);

    // The popup path facts come from classes this run never saw; record them directly.
    engine.resolution().record(
        FactKey::SendPopupMethod,
        FactValue::Method {
            kind: InvokeKind::Virtual,
            target: MethodRef::new("lunar/net/Socket", "p", "(Llunar/net/Packet;)V")?,
        },
    );
    engine.resolution().record(
        FactKey::GetClientBridgeMethod,
        FactValue::Method {
            kind: InvokeKind::Static,
            target: MethodRef::new("lunar/bridge/Holder", "g", "()Llunar/bridge/Client;")?,
        },
    );

    let utility = generate_utility_class(engine.resolution())?;
    assert_eq!(utility.name, UTILITY_CLASS);
    assert!(utility.interfaces.contains(&PATCH_CALLBACKS.to_string()));

    let popup = utility
        .method("displayPopup", "(Ljava/lang/String;Ljava/lang/String;)V")
        .expect("popup callback generated");
    assert!(popup
        .code
        .iter()
        .any(|ins| matches!(&ins.op, Op::New(name) if name == "lunar/net/Packet")));

    // The version literal observed on the entry point flows into the accessor.
    let version = utility
        .method("getVersion", "()Ljava/lang/String;")
        .expect("version accessor generated");
    assert!(version.has_str_constant("v2.15.1"));
    assert_eq!(engine.events().count(EventKind::ClassSynthesized), 1);
    Ok(())
}

#[test]
fn garbage_bytes_refuse_to_decode() {
    let engine = Engine::from_config(&EngineConfig::default());

    let err = engine
        .process(b"not a class file", &JsonCodec)
        .expect_err("garbage must not decode");
    assert!(matches!(err, Error::Malformed { .. }));
}
