//! The composable method predicate tree.

use serde::{Deserialize, Serialize};

use crate::classfile::{ClassFile, ConstValue, MethodAccess, MethodDesc, MethodInfo, MethodRef};
use crate::matching::ShapePattern;
use crate::Result;

/// The method a predicate is being evaluated against.
///
/// Predicates apply to two kinds of subject: a method *declared* in a class whose body is
/// available, or a bare call-site *reference* where only owner, name and descriptor are
/// known. Body-dependent predicates answer `false` for bare references instead of failing,
/// which is what makes [`MethodPredicate::Calls`] composable: the inner predicate is
/// evaluated against each call-site reference of the outer method.
#[derive(Debug, Clone)]
pub enum MethodSubject<'a> {
    /// A method declared by a class, with its body available for inspection
    Declared {
        /// The declaring class
        owner: &'a ClassFile,
        /// The declared method
        method: &'a MethodInfo,
    },
    /// A bare symbolic reference; only owner, name and descriptor are known
    Reference(&'a MethodRef),
}

impl<'a> MethodSubject<'a> {
    /// A declared-method subject.
    #[must_use]
    pub fn declared(owner: &'a ClassFile, method: &'a MethodInfo) -> Self {
        MethodSubject::Declared { owner, method }
    }

    /// A bare-reference subject.
    #[must_use]
    pub fn reference(mref: &'a MethodRef) -> Self {
        MethodSubject::Reference(mref)
    }

    /// The subject's method name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            MethodSubject::Declared { method, .. } => &method.name,
            MethodSubject::Reference(mref) => &mref.name,
        }
    }

    /// The subject's method descriptor.
    #[must_use]
    pub fn desc(&self) -> &MethodDesc {
        match self {
            MethodSubject::Declared { method, .. } => &method.desc,
            MethodSubject::Reference(mref) => &mref.desc,
        }
    }

    /// The declared method's body view, when this subject has one.
    #[must_use]
    fn declared_method(&self) -> Option<&MethodInfo> {
        match self {
            MethodSubject::Declared { method, .. } => Some(method),
            MethodSubject::Reference(_) => None,
        }
    }
}

/// A structural predicate over methods.
///
/// Predicates form a tree of combinators over primitive tests. Evaluation is pure and
/// total: [`MethodPredicate::matches`] never fails, never allocates per call beyond what
/// the primitives need, and has no observable side effects, so the engine is free to
/// evaluate the same predicate against thousands of classes concurrently.
///
/// Body-dependent primitives ([`MethodPredicate::HasConstant`],
/// [`MethodPredicate::CallsNamed`], [`MethodPredicate::Calls`],
/// [`MethodPredicate::HasModifier`], [`MethodPredicate::OwnerIsInterface`]) answer `false`
/// when the subject is a bare reference, because the information simply is not there.
///
/// # Examples
///
/// ```rust
/// use classweave::prelude::*;
///
/// // A static method that loads "mods.json" somewhere in its body.
/// let selector = MethodPredicate::And(vec![
///     MethodPredicate::HasModifier(MethodAccess::STATIC),
///     MethodPredicate::HasConstant(ConstValue::Str("mods.json".into())),
/// ]);
/// # let _ = selector;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MethodPredicate {
    /// All children must match; the empty conjunction matches everything
    And(Vec<MethodPredicate>),
    /// At least one child must match; the empty disjunction matches nothing
    Or(Vec<MethodPredicate>),
    /// The child must not match
    Not(Box<MethodPredicate>),
    /// The method name equals the given string
    Named(String),
    /// The signature matches the given shape pattern
    Signature(ShapePattern),
    /// The body pushes the given constant
    HasConstant(ConstValue),
    /// The body invokes a method with the given name
    CallsNamed(String),
    /// The body invokes a method whose call-site reference matches the child predicate
    Calls(Box<MethodPredicate>),
    /// The declared access flags contain all the given flags
    HasModifier(MethodAccess),
    /// The declaring class is an interface
    OwnerIsInterface,
    /// The method is an instance constructor (`<init>`)
    Constructor,
    /// The method is the class initializer (`<clinit>`)
    StaticInitializer,
    /// Matches every method
    Any,
}

impl MethodPredicate {
    /// A [`MethodPredicate::Named`] predicate.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        MethodPredicate::Named(name.into())
    }

    /// A [`MethodPredicate::Signature`] predicate parsed from pattern text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Predicate`] or [`crate::Error::Descriptor`] if the pattern
    /// text is malformed.
    pub fn signature(pattern: &str) -> Result<Self> {
        Ok(MethodPredicate::Signature(ShapePattern::parse(pattern)?))
    }

    /// A [`MethodPredicate::HasConstant`] predicate over a string literal.
    #[must_use]
    pub fn has_str(text: impl Into<String>) -> Self {
        MethodPredicate::HasConstant(ConstValue::Str(text.into()))
    }

    /// A [`MethodPredicate::CallsNamed`] predicate.
    #[must_use]
    pub fn calls_named(name: impl Into<String>) -> Self {
        MethodPredicate::CallsNamed(name.into())
    }

    /// Evaluate the predicate against a subject.
    #[must_use]
    pub fn matches(&self, subject: &MethodSubject<'_>) -> bool {
        match self {
            MethodPredicate::And(children) => children.iter().all(|child| child.matches(subject)),
            MethodPredicate::Or(children) => children.iter().any(|child| child.matches(subject)),
            MethodPredicate::Not(child) => !child.matches(subject),
            MethodPredicate::Named(name) => subject.name() == name,
            MethodPredicate::Signature(pattern) => pattern.matches(subject.desc()),
            MethodPredicate::HasConstant(value) => subject
                .declared_method()
                .is_some_and(|method| method.has_constant(value)),
            MethodPredicate::CallsNamed(name) => subject
                .declared_method()
                .is_some_and(|method| method.calls().any(|(_, mref)| &mref.name == name)),
            MethodPredicate::Calls(inner) => subject.declared_method().is_some_and(|method| {
                method
                    .calls()
                    .any(|(_, mref)| inner.matches(&MethodSubject::reference(mref)))
            }),
            MethodPredicate::HasModifier(flags) => subject
                .declared_method()
                .is_some_and(|method| method.access.contains(*flags)),
            MethodPredicate::OwnerIsInterface => match subject {
                MethodSubject::Declared { owner, .. } => owner.is_interface(),
                MethodSubject::Reference(_) => false,
            },
            MethodPredicate::Constructor => subject.name() == "<init>",
            MethodPredicate::StaticInitializer => subject.name() == "<clinit>",
            MethodPredicate::Any => true,
        }
    }
}
