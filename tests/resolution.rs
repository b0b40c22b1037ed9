//! Integration tests for heuristic symbol resolution.
//!
//! These tests drive the built-in catalog over hand-built obfuscated classes and
//! verify that facts land in the table regardless of observation order, that the
//! table is write-once under contention, and that absent evidence stays a silent
//! miss instead of an error.

use std::thread;

use classweave::prelude::*;
use classweave::resolution::catalog;

// The obfuscated entry point class: launch marker, singleton accessor, version
// assignment in the initializer, and the asset socket connect site.
fn entry_point_class() -> Result<ClassFile> {
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

// The server mappings class: CDN URL plus the remap method whose first call is the
// display-name map accessor.
fn mappings_class() -> Result<ClassFile> {
    let mut class = ClassFile::new("lunar/maps/Lookup");

    let mut url_holder = MethodInfo::new("k", "()V")?;
    url_holder.code = vec![
        Op::Ldc(ConstValue::Str(catalog::MAPPINGS_URL.into())).into(),
        Op::Pop.into(),
        Op::Return(None).into(),
    ];

    let mut remap = MethodInfo::new("i", "(Ljava/lang/String;)Ljava/lang/String;")?;
    remap.code = vec![
        Op::Invoke(
            InvokeKind::Virtual,
            MethodRef::new("lunar/maps/Lookup", "j", "()Ljava/util/Map;")?,
        )
        .into(),
        Op::Return(Some(VarKind::Ref)).into(),
    ];

    class.methods = vec![url_holder, remap];
    Ok(class)
}

#[test]
fn connect_site_resolves_the_assets_socket_field() -> Result<()> {
    let ctx = ResolutionContext::new();
    ctx.observe(&entry_point_class()?);

    let (is_static, socket) = ctx.field_fact(FactKey::AssetsSocketField)?;
    assert!(!is_static, "socket lives in an instance field");
    assert_eq!(socket.owner, "lunar/aa");
    assert_eq!(socket.name, "e");

    // The surrounding entry point facts landed from the same observation.
    assert_eq!(ctx.class_fact(FactKey::LunarClientClass)?, "lunar/aa");
    assert_eq!(ctx.string_fact(FactKey::ClientVersion)?, "v2.15.1");
    let (kind, main) = ctx.method_fact(FactKey::GetLunarMainMethod)?;
    assert_eq!(kind, InvokeKind::Static);
    assert_eq!(main.name, "b");
    Ok(())
}

#[test]
fn observation_order_does_not_matter() -> Result<()> {
    // Entry point first: the mappings accessor cannot resolve yet and is retained.
    let mut entry = entry_point_class()?;
    entry
        .methods
        .push(MethodInfo::new("h", "()Llunar/maps/Lookup;")?);

    let ctx = ResolutionContext::new();
    ctx.observe(&entry);
    assert!(ctx.method_fact(FactKey::GetServerMappingsMethod).is_err());

    ctx.observe(&mappings_class()?);

    assert_eq!(
        ctx.class_fact(FactKey::ServerMappingsClass)?,
        "lunar/maps/Lookup"
    );
    let (_, display_map) = ctx.method_fact(FactKey::GetDisplayToIpMapMethod)?;
    assert_eq!(display_map.name, "j");

    // The retained entry point was revisited once its dependency landed.
    let (kind, getter) = ctx.method_fact(FactKey::GetServerMappingsMethod)?;
    assert_eq!(kind, InvokeKind::Virtual);
    assert_eq!(getter.name, "h");
    assert_eq!(ctx.retained_count(), 0);
    Ok(())
}

#[test]
fn concurrent_same_key_writes_keep_the_first_value() {
    let table = FactTable::new();

    let wins: usize = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let table = &table;
                scope.spawn(move || {
                    table.record(FactKey::ClientVersion, FactValue::Str(format!("v{worker}")))
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| usize::from(handle.join().expect("worker panicked")))
            .sum()
    });

    assert_eq!(wins, 1, "exactly one writer claims the key");
    assert_eq!(table.len(), 1);
    let value = table.string_fact(FactKey::ClientVersion).expect("recorded");
    assert!(value.starts_with('v'));
}

#[test]
fn absent_evidence_is_a_miss_not_an_error() {
    let ctx = ResolutionContext::new();

    let mut plain = ClassFile::new("app/Plain");
    let mut tick = MethodInfo::new("tick", "()V").expect("valid descriptor");
    tick.code = vec![Op::Return(None).into()];
    plain.methods.push(tick);
    ctx.observe(&plain);

    assert!(!ctx.is_resolved(FactKey::LunarClientClass));
    assert!(matches!(
        ctx.method_fact(FactKey::SendPopupMethod),
        Err(Error::ResolutionMiss(FactKey::SendPopupMethod))
    ));
}
