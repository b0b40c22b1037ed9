//! The reduced instruction vocabulary of decoded method bodies.
//!
//! The model keeps only what matching, weaving and synthesis need: constant pushes are
//! normalized to a single [`Op::Ldc`], every load/store variant collapses into
//! [`Op::Load`]/[`Op::Store`] tagged with a [`VarKind`], and all control flow goes through
//! virtual [`Label`]s rather than bytecode offsets. A codec is free to carry richer
//! instruction sets on its own side; anything outside this vocabulary simply cannot be
//! emitted by the weaver.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::classfile::{ConstValue, FieldRef, MethodRef};

/// A virtual branch target inside one method body.
///
/// Labels are method-local and carry no ordering meaning; they are matched against
/// [`Op::Label`] markers in the instruction list. Fresh labels handed out during weaving are
/// numbered past every label the method already uses, so spliced fragments can never collide
/// with existing control flow.
pub type Label = u32;

/// The value category of a local-variable slot access.
///
/// Sub-int primitives (`boolean`, `byte`, `char`, `short`) share [`VarKind::Int`], exactly
/// as they share the `iload`/`istore` instructions on a real JVM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum VarKind {
    /// An object or array reference
    #[strum(serialize = "ref")]
    Ref,
    /// An `int` or sub-int primitive
    #[strum(serialize = "int")]
    Int,
    /// A `long`, occupying two slots
    #[strum(serialize = "long")]
    Long,
    /// A `float`
    #[strum(serialize = "float")]
    Float,
    /// A `double`, occupying two slots
    #[strum(serialize = "double")]
    Double,
}

impl VarKind {
    /// Number of local-variable slots a value of this kind occupies.
    #[must_use]
    pub fn width(&self) -> u16 {
        match self {
            VarKind::Long | VarKind::Double => 2,
            _ => 1,
        }
    }

    /// The JVM mnemonic prefix for this kind (`a`, `i`, `l`, `f` or `d`).
    #[must_use]
    pub fn prefix(&self) -> char {
        match self {
            VarKind::Ref => 'a',
            VarKind::Int => 'i',
            VarKind::Long => 'l',
            VarKind::Float => 'f',
            VarKind::Double => 'd',
        }
    }
}

/// The dispatch kind of a method invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum InvokeKind {
    /// `invokestatic`: no receiver
    #[strum(serialize = "static")]
    Static,
    /// `invokevirtual`: receiver dispatched through the class hierarchy
    #[strum(serialize = "virtual")]
    Virtual,
    /// `invokeinterface`: receiver dispatched through an interface
    #[strum(serialize = "interface")]
    Interface,
    /// `invokespecial`: constructors and direct dispatch
    #[strum(serialize = "special")]
    Special,
}

impl InvokeKind {
    /// Whether this invocation consumes a receiver slot in addition to its arguments.
    #[must_use]
    pub fn has_receiver(&self) -> bool {
        !matches!(self, InvokeKind::Static)
    }
}

/// The condition of a single-operand conditional branch.
///
/// Each condition pops exactly one value. [`Cond::Eq`] and [`Cond::Ne`] compare an `int`
/// against zero, mirroring `ifeq`/`ifne`; the reference conditions mirror
/// `ifnull`/`ifnonnull`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Cond {
    /// Branch when the popped `int` is zero
    #[strum(serialize = "eq")]
    Eq,
    /// Branch when the popped `int` is non-zero
    #[strum(serialize = "ne")]
    Ne,
    /// Branch when the popped reference is null
    #[strum(serialize = "null")]
    Null,
    /// Branch when the popped reference is non-null
    #[strum(serialize = "nonnull")]
    NonNull,
}

/// One operation in a decoded method body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// Do nothing
    Nop,
    /// Push a constant value
    Ldc(ConstValue),
    /// Push the null reference
    AconstNull,
    /// Push a local variable slot
    Load(VarKind, u16),
    /// Pop into a local variable slot
    Store(VarKind, u16),
    /// Push a static field's value
    GetStatic(FieldRef),
    /// Pop a value into a static field
    PutStatic(FieldRef),
    /// Pop a receiver, push its instance field's value
    GetField(FieldRef),
    /// Pop a receiver and a value, store into the instance field
    PutField(FieldRef),
    /// Invoke a method, popping its arguments (and receiver) and pushing its result
    Invoke(InvokeKind, MethodRef),
    /// Push a fresh uninitialized instance of the named class
    New(String),
    /// Check the top-of-stack reference against the named class
    Checkcast(String),
    /// Duplicate the top stack slot
    Dup,
    /// Discard the top stack slot
    Pop,
    /// Exchange the top two stack slots
    Swap,
    /// Pop an array reference and an index, push the element
    AaLoad,
    /// Return from the method, popping the returned value if any
    Return(Option<VarKind>),
    /// Branch unconditionally
    Goto(Label),
    /// Pop one value and branch if the condition holds
    If(Cond, Label),
    /// Pop an `int` key and branch through a sorted case table
    LookupSwitch {
        /// `(key, target)` pairs, sorted by key
        cases: Vec<(i32, Label)>,
        /// Target when no case matches
        default: Label,
    },
    /// A branch target marker; occupies no code on a real JVM
    Label(Label),
    /// Pop a throwable reference and raise it
    Athrow,
}

impl Op {
    /// The operand-stack effect of this operation as `(pops, pushes)`, in slots.
    ///
    /// Wide values count as two slots, so `Ldc` of a `long` pushes 2 and invoking
    /// `(JD)V` statically pops 4.
    #[must_use]
    pub fn stack_effect(&self) -> (u16, u16) {
        match self {
            Op::Nop | Op::Label(_) | Op::Goto(_) => (0, 0),
            Op::Ldc(value) => (0, value.slot_width()),
            Op::AconstNull | Op::New(_) => (0, 1),
            Op::Load(kind, _) => (0, kind.width()),
            Op::Store(kind, _) => (kind.width(), 0),
            Op::GetStatic(fref) => (0, fref.desc.slot_width()),
            Op::PutStatic(fref) => (fref.desc.slot_width(), 0),
            Op::GetField(fref) => (1, fref.desc.slot_width()),
            Op::PutField(fref) => (1 + fref.desc.slot_width(), 0),
            Op::Invoke(kind, mref) => {
                let receiver = u16::from(kind.has_receiver());
                (mref.desc.arg_slots() + receiver, mref.desc.ret().slot_width())
            }
            Op::Checkcast(_) => (1, 1),
            Op::Dup => (1, 2),
            Op::Pop | Op::If(_, _) | Op::LookupSwitch { .. } | Op::Athrow => (1, 0),
            Op::Swap => (2, 2),
            Op::AaLoad => (2, 1),
            Op::Return(kind) => (kind.map_or(0, |k| k.width()), 0),
        }
    }

    /// Whether control never falls through to the next instruction.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Op::Return(_) | Op::Goto(_) | Op::LookupSwitch { .. } | Op::Athrow
        )
    }

    /// Whether this is a return-family operation.
    #[must_use]
    pub fn is_return(&self) -> bool {
        matches!(self, Op::Return(_))
    }

    /// Every label this operation can branch to.
    #[must_use]
    pub fn jump_targets(&self) -> Vec<Label> {
        match self {
            Op::Goto(target) | Op::If(_, target) => vec![*target],
            Op::LookupSwitch { cases, default } => {
                let mut targets: Vec<Label> = cases.iter().map(|(_, target)| *target).collect();
                targets.push(*default);
                targets
            }
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Nop => f.write_str("nop"),
            Op::Ldc(value) => write!(f, "ldc {}", value),
            Op::AconstNull => f.write_str("aconst_null"),
            Op::Load(kind, slot) => write!(f, "{}load {}", kind.prefix(), slot),
            Op::Store(kind, slot) => write!(f, "{}store {}", kind.prefix(), slot),
            Op::GetStatic(fref) => write!(f, "getstatic {}", fref),
            Op::PutStatic(fref) => write!(f, "putstatic {}", fref),
            Op::GetField(fref) => write!(f, "getfield {}", fref),
            Op::PutField(fref) => write!(f, "putfield {}", fref),
            Op::Invoke(kind, mref) => write!(f, "invoke{} {}", kind, mref),
            Op::New(name) => write!(f, "new {}", name),
            Op::Checkcast(name) => write!(f, "checkcast {}", name),
            Op::Dup => f.write_str("dup"),
            Op::Pop => f.write_str("pop"),
            Op::Swap => f.write_str("swap"),
            Op::AaLoad => f.write_str("aaload"),
            Op::Return(None) => f.write_str("return"),
            Op::Return(Some(kind)) => write!(f, "{}return", kind.prefix()),
            Op::Goto(target) => write!(f, "goto L{}", target),
            Op::If(cond, target) => write!(f, "if{} L{}", cond, target),
            Op::LookupSwitch { cases, .. } => write!(f, "lookupswitch ({} cases)", cases.len()),
            Op::Label(label) => write!(f, "L{}:", label),
            Op::Athrow => f.write_str("athrow"),
        }
    }
}

/// One instruction in a method body.
///
/// Currently a thin wrapper around [`Op`]; decoders that track positions or line numbers
/// can widen this without touching the matchers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ins {
    /// The operation this instruction performs
    pub op: Op,
}

impl Ins {
    /// Wrap an operation as an instruction.
    #[must_use]
    pub fn new(op: Op) -> Self {
        Ins { op }
    }
}

impl From<Op> for Ins {
    fn from(op: Op) -> Self {
        Ins { op }
    }
}

impl fmt::Display for Ins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.op.fmt(f)
    }
}

/// The lowest label number not used anywhere in `code`.
///
/// Considers both [`Op::Label`] markers and every branch target, so a fragment numbered
/// from here can be spliced in without capturing existing control flow.
#[must_use]
pub fn next_free_label(code: &[Ins]) -> Label {
    let mut next = 0;
    for ins in code {
        if let Op::Label(label) = ins.op {
            next = next.max(label + 1);
        }
        for target in ins.op.jump_targets() {
            next = next.max(target + 1);
        }
    }
    next
}
