//! Fluent instruction assembly.

use crate::classfile::{
    next_free_label, Cond, ConstValue, FieldRef, Ins, InvokeKind, Label, MethodInfo, MethodRef,
    Op, VarKind,
};
use crate::Result;

/// A destination for assembled instructions.
///
/// [`Assembler`] is the in-memory implementation; a codec-backed sink that streams straight
/// into an encoder would implement the same trait. Emission is fallible at the trait level
/// so sinks with real failure modes can report them through the same fluent chains.
pub trait InstructionSink {
    /// Append one instruction to the sink.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the in-memory assembler never fails.
    fn emit(&mut self, ins: Ins) -> Result<()>;
}

/// Chainable assembly of instruction sequences.
///
/// An assembler owns a growing instruction list plus two allocation cursors: one for fresh
/// [`Label`]s and one for fresh local-variable slots. Fragments destined for an existing
/// method are built with [`Assembler::for_method`], which seeds both cursors past
/// everything the method already uses, so spliced code can never capture a host label or
/// clobber a live local.
///
/// Every emission helper returns `Result<&mut Self>` for chaining:
///
/// ```rust
/// use classweave::assembly::Assembler;
/// use classweave::classfile::{MethodRef, VarKind};
///
/// let println = MethodRef::new("java/io/PrintStream", "println", "(Ljava/lang/String;)V")?;
/// let mut asm = Assembler::new();
/// asm.push_str("hello")?
///     .store(VarKind::Ref, 1)?
///     .load(VarKind::Ref, 1)?
///     .pop()?;
/// assert_eq!(asm.code().len(), 4);
/// # let _ = println;
/// # Ok::<(), classweave::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Assembler {
    code: Vec<Ins>,
    next_label: Label,
    next_local: u16,
    return_slot: Option<(VarKind, u16)>,
}

impl InstructionSink for Assembler {
    fn emit(&mut self, ins: Ins) -> Result<()> {
        self.code.push(ins);
        Ok(())
    }
}

impl Assembler {
    /// An empty assembler with both allocation cursors at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty assembler whose label and local cursors start at the given bases.
    #[must_use]
    pub fn with_bases(next_label: Label, next_local: u16) -> Self {
        Assembler {
            code: Vec::new(),
            next_label,
            next_local,
            return_slot: None,
        }
    }

    /// An assembler for a fragment that will be spliced into `method`.
    ///
    /// Labels start past every label the method body uses, and locals start past the
    /// larger of the declared and recomputed local budgets.
    #[must_use]
    pub fn for_method(method: &MethodInfo) -> Self {
        Self::with_bases(
            next_free_label(&method.code),
            method.max_locals.max(method.computed_max_locals()),
        )
    }

    /// Reserve a fresh label. The label is not placed until [`Assembler::label`] emits it.
    pub fn new_label(&mut self) -> Label {
        let label = self.next_label;
        self.next_label += 1;
        label
    }

    /// Reserve a fresh local-variable slot wide enough for `kind`.
    pub fn alloc_local(&mut self, kind: VarKind) -> u16 {
        let slot = self.next_local;
        self.next_local += kind.width();
        slot
    }

    /// The slot holding the in-flight return value, during exit-advice assembly.
    ///
    /// The weaver parks a non-void method's return value in a fresh local before running
    /// an exit fragment and reloads it afterwards. Fragments that want to observe the
    /// value (for example to append to a returned collection) load it from this slot and
    /// must leave the slot's content intact.
    #[must_use]
    pub fn return_slot(&self) -> Option<(VarKind, u16)> {
        self.return_slot
    }

    pub(crate) fn set_return_slot(&mut self, slot: Option<(VarKind, u16)>) {
        self.return_slot = slot;
    }

    /// The label cursor position; the next fresh label will be this value.
    #[must_use]
    pub fn label_base(&self) -> Label {
        self.next_label
    }

    /// The local cursor position; the next fresh local will start at this slot.
    #[must_use]
    pub fn local_base(&self) -> u16 {
        self.next_local
    }

    /// The instructions assembled so far.
    #[must_use]
    pub fn code(&self) -> &[Ins] {
        &self.code
    }

    /// Consume the assembler, yielding the assembled instructions.
    #[must_use]
    pub fn finish(self) -> Vec<Ins> {
        self.code
    }

    /// Emit a raw operation.
    ///
    /// # Errors
    ///
    /// Propagates sink failures; the in-memory assembler never fails.
    pub fn op(&mut self, op: Op) -> Result<&mut Self> {
        self.emit(op.into())?;
        Ok(self)
    }

    /// Push a constant.
    pub fn ldc(&mut self, value: impl Into<ConstValue>) -> Result<&mut Self> {
        self.op(Op::Ldc(value.into()))
    }

    /// Push a string literal.
    pub fn push_str(&mut self, text: &str) -> Result<&mut Self> {
        self.ldc(text)
    }

    /// Push an `int` constant.
    pub fn push_int(&mut self, value: i32) -> Result<&mut Self> {
        self.ldc(value)
    }

    /// Push the null reference.
    pub fn aconst_null(&mut self) -> Result<&mut Self> {
        self.op(Op::AconstNull)
    }

    /// Push a local variable.
    pub fn load(&mut self, kind: VarKind, slot: u16) -> Result<&mut Self> {
        self.op(Op::Load(kind, slot))
    }

    /// Pop into a local variable.
    pub fn store(&mut self, kind: VarKind, slot: u16) -> Result<&mut Self> {
        self.op(Op::Store(kind, slot))
    }

    /// Push a static field's value.
    pub fn get_static(&mut self, fref: &FieldRef) -> Result<&mut Self> {
        self.op(Op::GetStatic(fref.clone()))
    }

    /// Pop a value into a static field.
    pub fn put_static(&mut self, fref: &FieldRef) -> Result<&mut Self> {
        self.op(Op::PutStatic(fref.clone()))
    }

    /// Pop a receiver, push its instance field's value.
    pub fn get_field(&mut self, fref: &FieldRef) -> Result<&mut Self> {
        self.op(Op::GetField(fref.clone()))
    }

    /// Pop a receiver and a value, store into the instance field.
    pub fn put_field(&mut self, fref: &FieldRef) -> Result<&mut Self> {
        self.op(Op::PutField(fref.clone()))
    }

    /// Invoke a method with an explicit dispatch kind.
    pub fn invoke(&mut self, kind: InvokeKind, mref: &MethodRef) -> Result<&mut Self> {
        self.op(Op::Invoke(kind, mref.clone()))
    }

    /// Invoke a static method.
    pub fn invoke_static(&mut self, mref: &MethodRef) -> Result<&mut Self> {
        self.invoke(InvokeKind::Static, mref)
    }

    /// Invoke an instance method with virtual dispatch.
    pub fn invoke_virtual(&mut self, mref: &MethodRef) -> Result<&mut Self> {
        self.invoke(InvokeKind::Virtual, mref)
    }

    /// Invoke an interface method.
    pub fn invoke_interface(&mut self, mref: &MethodRef) -> Result<&mut Self> {
        self.invoke(InvokeKind::Interface, mref)
    }

    /// Invoke a constructor or directly-dispatched method.
    pub fn invoke_special(&mut self, mref: &MethodRef) -> Result<&mut Self> {
        self.invoke(InvokeKind::Special, mref)
    }

    /// Push a fresh uninitialized instance of the named class.
    pub fn new_instance(&mut self, class: &str) -> Result<&mut Self> {
        self.op(Op::New(class.to_string()))
    }

    /// Allocate and construct an instance of `class`, leaving the reference on the stack.
    ///
    /// Emits `new` / `dup`, runs `args` to push the constructor arguments, then invokes
    /// `<init>` with the given descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Descriptor`] if `ctor_desc` is not a void-returning method
    /// descriptor.
    pub fn construct<F>(&mut self, class: &str, ctor_desc: &str, args: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Assembler) -> Result<()>,
    {
        let ctor = MethodRef::new(class, "<init>", ctor_desc)?;
        if !ctor.desc.ret().is_void() {
            return Err(crate::Error::Descriptor {
                message: format!("constructor descriptor {:?} must return void", ctor_desc),
            });
        }
        self.new_instance(class)?.dup()?;
        args(self)?;
        self.invoke_special(&ctor)
    }

    /// Duplicate the top stack slot.
    pub fn dup(&mut self) -> Result<&mut Self> {
        self.op(Op::Dup)
    }

    /// Discard the top stack slot.
    pub fn pop(&mut self) -> Result<&mut Self> {
        self.op(Op::Pop)
    }

    /// Exchange the top two stack slots.
    pub fn swap(&mut self) -> Result<&mut Self> {
        self.op(Op::Swap)
    }

    /// Pop an array reference and an index, push the element.
    pub fn aaload(&mut self) -> Result<&mut Self> {
        self.op(Op::AaLoad)
    }

    /// Check the top-of-stack reference against the named class.
    pub fn checkcast(&mut self, class: &str) -> Result<&mut Self> {
        self.op(Op::Checkcast(class.to_string()))
    }

    /// Place a previously reserved label at the current position.
    pub fn label(&mut self, label: Label) -> Result<&mut Self> {
        self.op(Op::Label(label))
    }

    /// Branch unconditionally.
    pub fn goto(&mut self, target: Label) -> Result<&mut Self> {
        self.op(Op::Goto(target))
    }

    /// Pop one value and branch if the condition holds.
    pub fn jump_if(&mut self, cond: Cond, target: Label) -> Result<&mut Self> {
        self.op(Op::If(cond, target))
    }

    /// Return void.
    pub fn ret(&mut self) -> Result<&mut Self> {
        self.op(Op::Return(None))
    }

    /// Pop and return a value of the given kind.
    pub fn ret_value(&mut self, kind: VarKind) -> Result<&mut Self> {
        self.op(Op::Return(Some(kind)))
    }

    /// Pop a throwable reference and raise it.
    pub fn athrow(&mut self) -> Result<&mut Self> {
        self.op(Op::Athrow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fluent_chain() -> crate::Result<()> {
        let mut asm = Assembler::new();
        asm.push_str("hello")?.dup()?.pop()?.pop()?.ret()?;
        assert_eq!(asm.code().len(), 5);
        assert_eq!(asm.code()[0].op, Op::Ldc(ConstValue::Str("hello".into())));
        Ok(())
    }

    #[test]
    fn test_label_and_local_allocation() {
        let mut asm = Assembler::with_bases(10, 4);
        assert_eq!(asm.new_label(), 10);
        assert_eq!(asm.new_label(), 11);
        assert_eq!(asm.alloc_local(VarKind::Long), 4);
        assert_eq!(asm.alloc_local(VarKind::Ref), 6);
        assert_eq!(asm.label_base(), 12);
        assert_eq!(asm.local_base(), 7);
    }

    #[test]
    fn test_for_method_seeds_past_existing_space() {
        let mut method = MethodInfo::new("tick", "(J)V").unwrap();
        method.max_locals = 3;
        method.code = vec![
            Op::Label(4).into(),
            Op::Goto(9).into(),
            Op::Return(None).into(),
        ];
        let mut asm = Assembler::for_method(&method);
        assert_eq!(asm.new_label(), 10);
        assert_eq!(asm.alloc_local(VarKind::Int), 3);
    }

    #[test]
    fn test_construct_emits_new_dup_init() {
        let mut asm = Assembler::new();
        asm.construct("demo/Popup", "(Ljava/lang/String;)V", |args| {
            args.push_str("title")?;
            Ok(())
        })
        .unwrap();

        let ops: Vec<&Op> = asm.code().iter().map(|ins| &ins.op).collect();
        assert!(matches!(ops[0], Op::New(name) if name == "demo/Popup"));
        assert!(matches!(ops[1], Op::Dup));
        assert!(matches!(ops[2], Op::Ldc(_)));
        assert!(
            matches!(ops[3], Op::Invoke(InvokeKind::Special, mref) if mref.name == "<init>")
        );
    }

    #[test]
    fn test_construct_rejects_non_void_descriptor() {
        let mut asm = Assembler::new();
        let result = asm.construct("demo/Popup", "()Ldemo/Popup;", |_| Ok(()));
        assert!(result.is_err());
    }
}
