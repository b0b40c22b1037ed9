//! Integration tests for advice weaving.
//!
//! These tests verify splicing over hand-built method bodies: enter advice runs once
//! at the head, exit advice covers every return path, return values survive the exit
//! fragment, and broken rewrites are rejected before they ever reach a host.

use classweave::prelude::*;

// A method with two return paths behind a conditional.
fn branching_method(name: &str) -> Result<MethodInfo> {
    let mut method = MethodInfo::new(name, "(I)I")?;
    method.code = vec![
        Op::Load(VarKind::Int, 1).into(),
        Op::If(Cond::Ne, 0).into(),
        Op::Ldc(ConstValue::Int(10)).into(),
        Op::Return(Some(VarKind::Int)).into(),
        Op::Label(0).into(),
        Op::Ldc(ConstValue::Int(20)).into(),
        Op::Return(Some(VarKind::Int)).into(),
    ];
    Ok(method)
}

fn host_class() -> Result<ClassFile> {
    let mut class = ClassFile::new("app/Calc");
    class.methods.push(branching_method("calc")?);
    Ok(class)
}

fn str_marker_count(method: &MethodInfo, marker: &str) -> usize {
    method
        .code
        .iter()
        .filter(|ins| matches!(&ins.op, Op::Ldc(ConstValue::Str(text)) if text == marker))
        .count()
}

#[test]
fn exit_advice_covers_every_return() -> Result<()> {
    let class = host_class()?;
    let advice = Advice::new(MethodPredicate::named("calc")).on_exit(|asm| {
        asm.push_str("leaving")?.pop()?;
        Ok(())
    });

    let woven = advice.apply(&class)?.expect("selector matched");
    let method = woven.method("calc", "(I)I").expect("method kept");

    assert_eq!(
        str_marker_count(method, "leaving"),
        2,
        "one exit copy per return"
    );
    let returns = method
        .code
        .iter()
        .filter(|ins| matches!(ins.op, Op::Return(_)))
        .count();
    assert_eq!(returns, 2, "return count unchanged");
    Ok(())
}

#[test]
fn enter_advice_runs_once_at_the_head() -> Result<()> {
    let class = host_class()?;
    let advice = Advice::new(MethodPredicate::named("calc")).on_enter(|asm| {
        asm.push_str("entered")?.pop()?;
        Ok(())
    });

    let woven = advice.apply(&class)?.expect("selector matched");
    let method = woven.method("calc", "(I)I").expect("method kept");

    assert!(
        matches!(&method.code[0].op, Op::Ldc(ConstValue::Str(text)) if text == "entered"),
        "enter fragment spliced before the first original instruction"
    );
    assert_eq!(str_marker_count(method, "entered"), 1);
    Ok(())
}

#[test]
fn return_value_is_parked_across_exit_advice() -> Result<()> {
    let class = host_class()?;
    let advice = Advice::new(MethodPredicate::named("calc")).on_exit(|asm| {
        asm.push_str("observer")?.pop()?;
        Ok(())
    });

    let woven = advice.apply(&class)?.expect("selector matched");
    let method = woven.method("calc", "(I)I").expect("method kept");

    // Each return must reload the saved value from a local past the argument slots.
    for (index, ins) in method.code.iter().enumerate() {
        if matches!(ins.op, Op::Return(_)) {
            assert!(
                matches!(method.code[index - 1].op, Op::Load(VarKind::Int, slot) if slot >= 2),
                "return at {index} reloads the parked value"
            );
        }
    }
    assert!(
        method
            .code
            .iter()
            .any(|ins| matches!(ins.op, Op::Store(VarKind::Int, slot) if slot >= 2)),
        "the value was parked before the fragment ran"
    );
    assert!(method.max_locals > class.methods[0].max_locals);
    Ok(())
}

#[test]
fn broken_exit_advice_is_rejected() -> Result<()> {
    let class = host_class()?;
    let advice = Advice::new(MethodPredicate::named("calc")).on_exit(|asm| {
        asm.pop()?;
        Ok(())
    });

    match advice.apply(&class) {
        Err(Error::WeavingConflict {
            class: class_name,
            method,
            ..
        }) => {
            assert_eq!(class_name, "app/Calc");
            assert_eq!(method, "calc");
        }
        other => panic!("underflowing fragment must be rejected, got {other:?}"),
    }
    Ok(())
}

#[test]
fn fragment_labels_never_collide() -> Result<()> {
    let class = host_class()?;
    let advice = Advice::new(MethodPredicate::named("calc")).on_exit(|asm| {
        let skip = asm.new_label();
        asm.push_int(0)?.jump_if(Cond::Ne, skip)?.label(skip)?;
        Ok(())
    });

    let woven = advice.apply(&class)?.expect("selector matched");
    let method = woven.method("calc", "(I)I").expect("method kept");

    let mut labels: Vec<Label> = method
        .code
        .iter()
        .filter_map(|ins| match ins.op {
            Op::Label(label) => Some(label),
            _ => None,
        })
        .collect();
    let placed = labels.len();
    labels.sort_unstable();
    labels.dedup();
    assert_eq!(labels.len(), placed, "every placed label is unique");
    // The original label plus one fresh label per exit copy.
    assert_eq!(placed, 3);
    Ok(())
}

#[test]
fn exception_handlers_survive_weaving() -> Result<()> {
    let mut method = MethodInfo::new("guard", "()V")?;
    method.code = vec![
        Op::Label(0).into(),
        Op::Ldc(ConstValue::Int(1)).into(),
        Op::Pop.into(),
        Op::Label(1).into(),
        Op::Goto(3).into(),
        Op::Label(2).into(),
        Op::Pop.into(),
        Op::Label(3).into(),
        Op::Return(None).into(),
    ];
    method.try_catches.push(TryCatch {
        start: 0,
        end: 1,
        handler: 2,
        catch_type: None,
    });
    let mut class = ClassFile::new("app/Guarded");
    class.methods.push(method);

    let advice = Advice::new(MethodPredicate::named("guard")).on_enter(|asm| {
        asm.push_str("armed")?.pop()?;
        Ok(())
    });

    let woven = advice.apply(&class)?.expect("selector matched");
    let method = woven.method("guard", "()V").expect("method kept");

    assert_eq!(method.try_catches, class.methods[0].try_catches);
    for label in [0, 1, 2, 3] {
        assert!(
            method
                .code
                .iter()
                .any(|ins| matches!(ins.op, Op::Label(placed) if placed == label)),
            "handler label {label} still placed"
        );
    }
    Ok(())
}

#[test]
fn unmatched_selector_yields_no_transform() -> Result<()> {
    let class = host_class()?;
    let advice = Advice::new(MethodPredicate::named("missing")).on_enter(|asm| {
        asm.push_str("never")?.pop()?;
        Ok(())
    });

    assert!(advice.apply(&class)?.is_none());
    Ok(())
}
