//! Decoded class, method and field declarations.
//!
//! A [`ClassFile`] is the unit every pipeline stage operates on: heuristics inspect it,
//! advice rewrites its method bodies, and the codec turns it back into bytes. The model is
//! deliberately plain data - public fields, no interior mutability - so transforms can clone
//! a class, rewrite the clone and hand it back without hidden sharing.

use serde::{Deserialize, Serialize};

use crate::classfile::{
    ClassAccess, ConstValue, FieldAccess, FieldRef, Ins, InvokeKind, Label, MethodAccess,
    MethodDesc, MethodRef, Op, TypeDesc,
};
use crate::matching::{MethodPredicate, MethodSubject};
use crate::Result;

/// Class file major version emitted for synthesized classes (Java 8).
pub const DEFAULT_CLASS_VERSION: u16 = 52;

/// One entry of a method's exception table.
///
/// The protected region spans from the instruction after the `start` label up to (but not
/// including) the `end` label. All three labels must exist in the method body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TryCatch {
    /// Label opening the protected region
    pub start: Label,
    /// Label closing the protected region
    pub end: Label,
    /// Label of the handler entry point
    pub handler: Label,
    /// Internal name of the caught class, or `None` for a catch-all entry
    pub catch_type: Option<String>,
}

/// A decoded field declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// The field name
    pub name: String,
    /// The parsed field type
    pub desc: TypeDesc,
    /// Access and property flags
    pub access: FieldAccess,
    /// The `ConstantValue` initializer, when present
    pub constant: Option<ConstValue>,
}

impl FieldInfo {
    /// Construct a field with no flags and no initializer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Descriptor`] if `desc` is not a well-formed field type.
    pub fn new(name: impl Into<String>, desc: &str) -> Result<Self> {
        Ok(FieldInfo {
            name: name.into(),
            desc: TypeDesc::parse(desc)?,
            access: FieldAccess::empty(),
            constant: None,
        })
    }

    /// Whether the field is declared `static`.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.access.contains(FieldAccess::STATIC)
    }

    /// A symbolic reference to this field as declared by `owner`.
    #[must_use]
    pub fn as_field_ref(&self, owner: &str) -> FieldRef {
        FieldRef {
            owner: owner.to_string(),
            name: self.name.clone(),
            desc: self.desc.clone(),
        }
    }
}

/// A decoded method declaration with its instruction-level body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodInfo {
    /// The method name (`<init>` for constructors, `<clinit>` for the static initializer)
    pub name: String,
    /// The parsed method descriptor
    pub desc: MethodDesc,
    /// Access and property flags
    pub access: MethodAccess,
    /// The instruction list; empty for abstract and native methods
    pub code: Vec<Ins>,
    /// Declared operand stack budget; recomputed whenever the body is rewritten
    pub max_stack: u16,
    /// Declared local variable budget; recomputed whenever the body is rewritten
    pub max_locals: u16,
    /// The exception table
    pub try_catches: Vec<TryCatch>,
}

impl MethodInfo {
    /// Construct an empty method with no flags and no body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Descriptor`] if `desc` is not a well-formed method
    /// descriptor.
    pub fn new(name: impl Into<String>, desc: &str) -> Result<Self> {
        Ok(MethodInfo {
            name: name.into(),
            desc: MethodDesc::parse(desc)?,
            access: MethodAccess::empty(),
            code: Vec::new(),
            max_stack: 0,
            max_locals: 0,
            try_catches: Vec::new(),
        })
    }

    /// Whether the method is declared `static`.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.access.contains(MethodAccess::STATIC)
    }

    /// Whether this is an instance constructor.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    /// Whether this is the class initializer.
    #[must_use]
    pub fn is_static_initializer(&self) -> bool {
        self.name == "<clinit>"
    }

    /// Number of local-variable slots occupied by the receiver and arguments.
    #[must_use]
    pub fn arg_slots(&self) -> u16 {
        self.desc.arg_slots() + u16::from(!self.is_static())
    }

    /// Every constant pushed anywhere in the body.
    pub fn constants(&self) -> impl Iterator<Item = &ConstValue> {
        self.code.iter().filter_map(|ins| match &ins.op {
            Op::Ldc(value) => Some(value),
            _ => None,
        })
    }

    /// Whether the body pushes the given constant.
    #[must_use]
    pub fn has_constant(&self, value: &ConstValue) -> bool {
        self.constants().any(|candidate| candidate == value)
    }

    /// Whether the body pushes the given string literal.
    #[must_use]
    pub fn has_str_constant(&self, text: &str) -> bool {
        self.constants().any(|candidate| candidate.as_str() == Some(text))
    }

    /// Every method invocation in the body, in instruction order.
    pub fn calls(&self) -> impl Iterator<Item = (InvokeKind, &MethodRef)> {
        self.code.iter().filter_map(|ins| match &ins.op {
            Op::Invoke(kind, mref) => Some((*kind, mref)),
            _ => None,
        })
    }

    /// A symbolic reference to this method as declared by `owner`.
    #[must_use]
    pub fn as_method_ref(&self, owner: &str) -> MethodRef {
        MethodRef {
            owner: owner.to_string(),
            name: self.name.clone(),
            desc: self.desc.clone(),
        }
    }

    /// The local budget implied by the body and signature.
    ///
    /// Decoded classes usually carry a correct `max_locals`, but synthesized and freshly
    /// woven bodies may not; users of the local space take the maximum of both.
    #[must_use]
    pub fn computed_max_locals(&self) -> u16 {
        let mut max = self.arg_slots();
        for ins in &self.code {
            if let Op::Load(kind, slot) | Op::Store(kind, slot) = ins.op {
                max = max.max(slot + kind.width());
            }
        }
        max
    }
}

/// A fully decoded class.
///
/// # Examples
///
/// ```rust
/// use classweave::prelude::*;
///
/// let mut class = ClassFile::new("demo/Widget");
/// let mut tick = MethodInfo::new("tick", "()V")?;
/// tick.code.push(Op::Return(None).into());
/// class.methods.push(tick);
///
/// assert!(class.method("tick", "()V").is_some());
/// assert!(class.find_method(&MethodPredicate::Constructor).is_none());
/// # Ok::<(), classweave::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassFile {
    /// Internal name (e.g. `com/example/Widget`)
    pub name: String,
    /// Internal name of the superclass; `None` only for `java/lang/Object` itself
    pub super_name: Option<String>,
    /// Internal names of all directly implemented interfaces
    pub interfaces: Vec<String>,
    /// Access and property flags
    pub access: ClassAccess,
    /// Declared fields
    pub fields: Vec<FieldInfo>,
    /// Declared methods
    pub methods: Vec<MethodInfo>,
    /// Class file major version
    pub version: u16,
}

impl ClassFile {
    /// Construct an empty class extending `java/lang/Object`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        ClassFile {
            name: name.into(),
            super_name: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            access: ClassAccess::empty(),
            fields: Vec::new(),
            methods: Vec::new(),
            version: DEFAULT_CLASS_VERSION,
        }
    }

    /// Whether this declaration is an interface.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.access.contains(ClassAccess::INTERFACE)
    }

    /// Every constant in the class: all method-body constants plus field initializers.
    pub fn constants(&self) -> impl Iterator<Item = &ConstValue> {
        self.methods
            .iter()
            .flat_map(MethodInfo::constants)
            .chain(self.fields.iter().filter_map(|field| field.constant.as_ref()))
    }

    /// Whether any method body or field initializer carries the given constant.
    #[must_use]
    pub fn has_constant(&self, value: &ConstValue) -> bool {
        self.constants().any(|candidate| candidate == value)
    }

    /// Whether any method body or field initializer carries the given string literal.
    #[must_use]
    pub fn has_str_constant(&self, text: &str) -> bool {
        self.constants().any(|candidate| candidate.as_str() == Some(text))
    }

    /// Look up a method by exact name and descriptor text.
    #[must_use]
    pub fn method(&self, name: &str, desc: &str) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|method| method.name == name && method.desc.raw() == desc)
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// The first declared method matching the predicate, in declaration order.
    #[must_use]
    pub fn find_method(&self, predicate: &MethodPredicate) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|method| predicate.matches(&MethodSubject::declared(self, method)))
    }

    /// All declared methods matching the predicate, in declaration order.
    pub fn methods_matching<'a>(
        &'a self,
        predicate: &'a MethodPredicate,
    ) -> impl Iterator<Item = &'a MethodInfo> + 'a {
        self.methods
            .iter()
            .filter(move |method| predicate.matches(&MethodSubject::declared(self, method)))
    }

    /// Indices of all declared methods matching the predicate.
    #[must_use]
    pub fn matching_indices(&self, predicate: &MethodPredicate) -> Vec<usize> {
        self.methods
            .iter()
            .enumerate()
            .filter(|(_, method)| predicate.matches(&MethodSubject::declared(self, method)))
            .map(|(index, _)| index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::fixtures;

    #[test]
    fn test_constants_include_field_initializers() {
        let mut class = ClassFile::new("demo/Widget");
        let mut field = FieldInfo::new("version", "Ljava/lang/String;").unwrap();
        field.constant = Some(ConstValue::Str("1.8.9".into()));
        class.fields.push(field);

        assert!(class.has_str_constant("1.8.9"));
        assert!(!class.has_str_constant("1.8.8"));
    }

    #[test]
    fn test_method_lookup_by_descriptor() {
        let class = fixtures::class_with_methods(
            "demo/Widget",
            vec![
                fixtures::returning_method("get", "()I", ConstValue::Int(1)),
                fixtures::returning_method("get", "()J", ConstValue::Long(1)),
            ],
        );
        assert_eq!(class.method("get", "()J").unwrap().desc.raw(), "()J");
        assert!(class.method("get", "()D").is_none());
    }

    #[test]
    fn test_find_method_declaration_order() {
        let class = fixtures::class_with_methods(
            "demo/Widget",
            vec![
                fixtures::returning_method("first", "()I", ConstValue::Int(1)),
                fixtures::returning_method("second", "()I", ConstValue::Int(2)),
            ],
        );
        let found = class
            .find_method(&MethodPredicate::HasConstant(ConstValue::Int(2)))
            .unwrap();
        assert_eq!(found.name, "second");
    }

    #[test]
    fn test_arg_slots_counts_receiver() {
        let mut method = MethodInfo::new("update", "(JI)V").unwrap();
        assert_eq!(method.arg_slots(), 4);
        method.access |= MethodAccess::STATIC;
        assert_eq!(method.arg_slots(), 3);
    }

    #[test]
    fn test_computed_max_locals() {
        let mut method = MethodInfo::new("update", "()V").unwrap();
        method.access |= MethodAccess::STATIC;
        method.code = vec![
            Op::Ldc(ConstValue::Long(5)).into(),
            Op::Store(crate::classfile::VarKind::Long, 3).into(),
            Op::Return(None).into(),
        ];
        assert_eq!(method.computed_max_locals(), 5);
    }

    #[test]
    fn test_calls_in_instruction_order() {
        let method = fixtures::calling_method(
            "run",
            "()V",
            &[
                ("demo/A", "first", "()V"),
                ("demo/B", "second", "()V"),
            ],
        );
        let names: Vec<&str> = method.calls().map(|(_, mref)| mref.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
