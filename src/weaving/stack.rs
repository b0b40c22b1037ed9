//! Abstract stack-depth verification for woven bodies.

use std::collections::HashMap;

use crate::classfile::{Ins, Label, Op, TryCatch};

/// Walks every reachable path of a body tracking abstract stack depth.
///
/// Depths are modelled in stack slots, so wide values count as two. The entry point
/// starts at depth zero and every exception handler starts at depth one (the thrown
/// reference). A body passes when no instruction underflows, every join point is reached
/// at a single consistent depth, and no path falls off the end without a terminal
/// instruction.
///
/// On success returns the recomputed `(max_stack, max_locals)` pair, with locals taken
/// from the high-water mark of load/store slots. Failures return a message for the
/// caller to wrap with class and method context.
pub(crate) fn compute_limits(
    code: &[Ins],
    try_catches: &[TryCatch],
    min_locals: u16,
) -> std::result::Result<(u16, u16), String> {
    if code.is_empty() {
        return Ok((0, min_locals));
    }

    let mut label_at: HashMap<Label, usize> = HashMap::new();
    for (index, ins) in code.iter().enumerate() {
        if let Op::Label(label) = ins.op {
            label_at.insert(label, index);
        }
    }
    let resolve = |label: Label| -> std::result::Result<usize, String> {
        label_at
            .get(&label)
            .copied()
            .ok_or_else(|| format!("branch to undefined label L{label}"))
    };

    let mut max_stack: u16 = 0;
    let mut max_locals: u16 = min_locals;
    let mut depth_at: Vec<Option<u16>> = vec![None; code.len()];
    let mut worklist: Vec<(usize, u16)> = vec![(0, 0)];
    for try_catch in try_catches {
        resolve(try_catch.start)?;
        resolve(try_catch.end)?;
        worklist.push((resolve(try_catch.handler)?, 1));
    }

    while let Some((mut index, mut depth)) = worklist.pop() {
        loop {
            if index >= code.len() {
                return Err("control flow runs off the end of the body".to_string());
            }
            match depth_at[index] {
                Some(existing) if existing == depth => break,
                Some(existing) => {
                    return Err(format!(
                        "inconsistent stack depth at instruction {index}: {existing} vs {depth}"
                    ));
                }
                None => depth_at[index] = Some(depth),
            }

            let ins = &code[index];
            let (pops, pushes) = ins.op.stack_effect();
            if pops > depth {
                return Err(format!(
                    "stack underflow at instruction {index} ({op})",
                    op = ins.op
                ));
            }
            depth = depth - pops + pushes;
            max_stack = max_stack.max(depth);

            if let Op::Load(kind, slot) | Op::Store(kind, slot) = &ins.op {
                max_locals = max_locals.max(slot + kind.width());
            }

            match &ins.op {
                Op::Goto(target) => index = resolve(*target)?,
                Op::If(_, target) => {
                    worklist.push((resolve(*target)?, depth));
                    index += 1;
                }
                Op::LookupSwitch { cases, default } => {
                    for (_, target) in cases {
                        worklist.push((resolve(*target)?, depth));
                    }
                    worklist.push((resolve(*default)?, depth));
                    break;
                }
                Op::Return(_) | Op::Athrow => break,
                _ => index += 1,
            }
        }
    }

    Ok((max_stack, max_locals))
}
