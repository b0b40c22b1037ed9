//! Fluent construction of synthesized classes.

use std::fmt;

use crate::assembly::Assembler;
use crate::classfile::{
    ClassAccess, ClassFile, MethodAccess, MethodInfo, MethodRef, Op, TypeDesc, VarKind,
};
use crate::weaving::stack::compute_limits;
use crate::Result;

type BodyFn<'a> = Box<dyn FnOnce(&mut Assembler) -> Result<()> + 'a>;

/// Builds one synthesized class, method by method.
///
/// The builder is consuming and infallible until [`build`](Self::build), which assembles
/// every body, verifies its operand stack bookkeeping and computes the stack and local
/// budgets. No partially built class is ever returned.
///
/// # Examples
///
/// ```rust
/// use classweave::prelude::*;
///
/// let class = ClassBuilder::new("demo/Greeter")
///     .public()
///     .default_constructor()
///     .method("greet", |m| {
///         m.public()
///             .returns(TypeDesc::object("java/lang/String"))
///             .body(|asm| {
///                 asm.push_str("hello")?.ret_value(VarKind::Ref)?;
///                 Ok(())
///             })
///     })
///     .build()?;
///
/// assert_eq!(class.methods.len(), 2);
/// assert!(class.method("greet", "()Ljava/lang/String;").is_some());
/// # Ok::<(), classweave::Error>(())
/// ```
#[must_use]
pub struct ClassBuilder<'a> {
    name: String,
    access: ClassAccess,
    super_name: String,
    interfaces: Vec<String>,
    methods: Vec<MethodBuilder<'a>>,
    default_ctor: bool,
}

impl<'a> ClassBuilder<'a> {
    /// Start a class with the given internal name, extending `java/lang/Object`.
    pub fn new(name: impl Into<String>) -> Self {
        ClassBuilder {
            name: name.into(),
            access: ClassAccess::empty(),
            super_name: "java/lang/Object".to_string(),
            interfaces: Vec::new(),
            methods: Vec::new(),
            default_ctor: false,
        }
    }

    /// Mark the class public.
    pub fn public(mut self) -> Self {
        self.access |= ClassAccess::PUBLIC | ClassAccess::SUPER;
        self
    }

    /// Set the superclass by internal name.
    pub fn extends(mut self, name: impl Into<String>) -> Self {
        self.super_name = name.into();
        self
    }

    /// Add an implemented interface by internal name.
    pub fn implements(mut self, name: impl Into<String>) -> Self {
        self.interfaces.push(name.into());
        self
    }

    /// Add a public no-argument constructor delegating to the superclass.
    pub fn default_constructor(mut self) -> Self {
        self.default_ctor = true;
        self
    }

    /// Add a method, configured through the closure.
    pub fn method(
        mut self,
        name: impl Into<String>,
        configure: impl FnOnce(MethodBuilder<'a>) -> MethodBuilder<'a>,
    ) -> Self {
        self.methods.push(configure(MethodBuilder::new(name)));
        self
    }

    /// Assemble and verify the class.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] when a method has no body, a body's return
    /// kind contradicts its descriptor, or the operand-stack verifier rejects a body.
    /// Errors raised by a body closure pass through unchanged.
    pub fn build(self) -> Result<ClassFile> {
        let ClassBuilder {
            name,
            access,
            super_name,
            interfaces,
            methods,
            default_ctor,
        } = self;

        let mut class = ClassFile::new(&name);
        class.access = access;
        class.super_name = Some(super_name.clone());
        class.interfaces = interfaces;

        if default_ctor {
            class.methods.push(default_ctor_method(&name, &super_name)?);
        }
        for builder in methods {
            let method = builder.assemble(&name)?;
            class.methods.push(method);
        }
        Ok(class)
    }
}

impl fmt::Debug for ClassBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassBuilder")
            .field("name", &self.name)
            .field("interfaces", &self.interfaces)
            .field("methods", &self.methods.len())
            .finish_non_exhaustive()
    }
}

/// Builds one method of a synthesized class.
///
/// Obtained through [`ClassBuilder::method`]; the descriptor is assembled from the
/// declared parameters and return type, and the body closure runs against a fresh
/// [`Assembler`] whose locals start past the argument slots.
#[must_use]
pub struct MethodBuilder<'a> {
    name: String,
    access: MethodAccess,
    args: Vec<TypeDesc>,
    ret: TypeDesc,
    body: Option<BodyFn<'a>>,
}

impl<'a> MethodBuilder<'a> {
    fn new(name: impl Into<String>) -> Self {
        MethodBuilder {
            name: name.into(),
            access: MethodAccess::empty(),
            args: Vec::new(),
            ret: TypeDesc::Void,
            body: None,
        }
    }

    /// Mark the method public.
    pub fn public(mut self) -> Self {
        self.access |= MethodAccess::PUBLIC;
        self
    }

    /// Mark the method static; argument slots then start at zero.
    pub fn static_(mut self) -> Self {
        self.access |= MethodAccess::STATIC;
        self
    }

    /// Append a parameter type.
    pub fn parameter(mut self, ty: TypeDesc) -> Self {
        self.args.push(ty);
        self
    }

    /// Set the return type; defaults to void.
    pub fn returns(mut self, ty: TypeDesc) -> Self {
        self.ret = ty;
        self
    }

    /// Provide the body.
    pub fn body(mut self, body: impl FnOnce(&mut Assembler) -> Result<()> + 'a) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    fn assemble(self, owner: &str) -> Result<MethodInfo> {
        let desc = format!(
            "({}){}",
            self.args.iter().map(TypeDesc::raw).collect::<String>(),
            self.ret.raw(),
        );
        let mut method = MethodInfo::new(self.name, &desc)?;
        method.access = self.access;

        let Some(body) = self.body else {
            return Err(malformed_error!("{}.{}{} has no body", owner, method.name, desc));
        };
        let mut asm = Assembler::with_bases(0, method.arg_slots());
        body(&mut asm)?;
        method.code = asm.finish();

        finish_method(owner, &mut method)?;
        Ok(method)
    }
}

impl fmt::Debug for MethodBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodBuilder")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("ret", &self.ret)
            .finish_non_exhaustive()
    }
}

fn default_ctor_method(owner: &str, super_name: &str) -> Result<MethodInfo> {
    let mut method = MethodInfo::new("<init>", "()V")?;
    method.access = MethodAccess::PUBLIC;

    let super_init = MethodRef::new(super_name, "<init>", "()V")?;
    let mut asm = Assembler::new();
    asm.load(VarKind::Ref, 0)?.invoke_special(&super_init)?.ret()?;
    method.code = asm.finish();

    finish_method(owner, &mut method)?;
    Ok(method)
}

// Return-kind agreement and stack verification; fills in the recomputed budgets.
fn finish_method(owner: &str, method: &mut MethodInfo) -> Result<()> {
    let expected = method.desc.ret().var_kind();
    for ins in &method.code {
        if let Op::Return(kind) = ins.op {
            if kind != expected {
                return Err(malformed_error!(
                    "{}.{}{} returns the wrong value kind",
                    owner,
                    method.name,
                    method.desc.raw()
                ));
            }
        }
    }

    let (max_stack, max_locals) = compute_limits(&method.code, &method.try_catches, method.arg_slots())
        .map_err(|message| {
            malformed_error!(
                "{}.{}{} failed verification: {message}",
                owner,
                method.name,
                method.desc.raw()
            )
        })?;
    method.max_stack = max_stack;
    method.max_locals = max_locals;
    Ok(())
}
