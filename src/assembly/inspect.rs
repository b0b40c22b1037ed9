//! Instruction-window inspection utilities.
//!
//! Heuristics identify obfuscated symbols by where instructions sit relative to each
//! other: the call right after a marker constant, the field written just before a
//! `connect`, the last class literal in a constructor. These helpers walk decoded bodies
//! with those idioms. Position arguments and results are instruction indices into the
//! body; [`Op::Label`] markers and [`Op::Nop`] padding are ignored wherever adjacency
//! matters, since neither occupies real code.

use crate::classfile::{ConstValue, FieldRef, Ins, InvokeKind, MethodInfo, MethodRef, Op};

/// Index of the first instruction pushing the given constant.
#[must_use]
pub fn constant_index(code: &[Ins], value: &ConstValue) -> Option<usize> {
    code.iter()
        .position(|ins| matches!(&ins.op, Op::Ldc(candidate) if candidate == value))
}

/// The first invocation of a method with the given name, with its index.
#[must_use]
pub fn call_named<'a>(code: &'a [Ins], name: &str) -> Option<(usize, InvokeKind, &'a MethodRef)> {
    code.iter().enumerate().find_map(|(index, ins)| match &ins.op {
        Op::Invoke(kind, mref) if mref.name == name => Some((index, *kind, mref)),
        _ => None,
    })
}

/// The first invocation strictly after the given index.
#[must_use]
pub fn call_after(code: &[Ins], index: usize) -> Option<(InvokeKind, &MethodRef)> {
    code.iter().skip(index + 1).find_map(|ins| match &ins.op {
        Op::Invoke(kind, mref) => Some((*kind, mref)),
        _ => None,
    })
}

/// The field access immediately preceding the given index.
///
/// Walks backwards past labels and nops only; any other intervening instruction means the
/// access is not adjacent and the answer is `None`. The flag is `true` for a static
/// access. Reads and writes both count, so `socket.connect()` and `this.socket = ...`
/// shapes resolve the same field.
#[must_use]
pub fn field_access_before(code: &[Ins], index: usize) -> Option<(bool, &FieldRef)> {
    for ins in code[..index].iter().rev() {
        match &ins.op {
            Op::Label(_) | Op::Nop => continue,
            Op::GetStatic(fref) | Op::PutStatic(fref) => return Some((true, fref)),
            Op::GetField(fref) | Op::PutField(fref) => return Some((false, fref)),
            _ => return None,
        }
    }
    None
}

/// The last class literal pushed anywhere in the body.
#[must_use]
pub fn last_class_constant(code: &[Ins]) -> Option<&str> {
    code.iter().rev().find_map(|ins| match &ins.op {
        Op::Ldc(ConstValue::Class(name)) => Some(name.as_str()),
        _ => None,
    })
}

/// String constants assigned directly to static fields in an initializer body.
///
/// Collects every `ldc <string>` / `putstatic` adjacency as a `(field name, value)` pair,
/// which is how compilers lay down non-`ConstantValue` string initialization in
/// `<clinit>`.
#[must_use]
pub fn clinit_string_assignments(method: &MethodInfo) -> Vec<(&str, &str)> {
    let mut assignments = Vec::new();
    let mut pending: Option<&str> = None;
    for ins in &method.code {
        match &ins.op {
            Op::Label(_) | Op::Nop => {}
            Op::Ldc(ConstValue::Str(text)) => pending = Some(text),
            Op::PutStatic(fref) => {
                if let Some(text) = pending.take() {
                    assignments.push((fref.name.as_str(), text));
                }
            }
            _ => pending = None,
        }
    }
    assignments
}
