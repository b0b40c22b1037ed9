//! Symbolic references to methods and fields of other classes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classfile::{MethodDesc, TypeDesc};
use crate::Result;

/// A symbolic reference to a method: owner class, name and descriptor.
///
/// This is the operand of [`crate::classfile::Op::Invoke`] and the payload of resolved
/// method facts. The descriptor is parsed at construction, so a `MethodRef` in hand is
/// always well-formed.
///
/// # Examples
///
/// ```rust
/// use classweave::classfile::MethodRef;
///
/// let mref = MethodRef::new("java/io/PrintStream", "println", "(Ljava/lang/String;)V")?;
/// assert_eq!(mref.desc.arg_slots(), 1);
/// # Ok::<(), classweave::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    /// Internal name of the class declaring the method
    pub owner: String,
    /// The method name
    pub name: String,
    /// The parsed method descriptor
    pub desc: MethodDesc,
}

impl MethodRef {
    /// Construct a method reference, parsing and validating the descriptor text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Descriptor`] if `desc` is not a well-formed method
    /// descriptor.
    pub fn new(owner: impl Into<String>, name: impl Into<String>, desc: &str) -> Result<Self> {
        Ok(MethodRef {
            owner: owner.into(),
            name: name.into(),
            desc: MethodDesc::parse(desc)?,
        })
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.owner, self.name, self.desc)
    }
}

/// A symbolic reference to a field: owner class, name and type.
///
/// This is the operand of the four field-access instructions and the payload of resolved
/// field facts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    /// Internal name of the class declaring the field
    pub owner: String,
    /// The field name
    pub name: String,
    /// The parsed field type
    pub desc: TypeDesc,
}

impl FieldRef {
    /// Construct a field reference, parsing and validating the type descriptor text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Descriptor`] if `desc` is not a well-formed field type
    /// descriptor, or is `void`.
    pub fn new(owner: impl Into<String>, name: impl Into<String>, desc: &str) -> Result<Self> {
        let parsed = TypeDesc::parse(desc)?;
        if parsed.is_void() {
            return Err(crate::Error::Descriptor {
                message: "field type cannot be void".to_string(),
            });
        }
        Ok(FieldRef {
            owner: owner.into(),
            name: name.into(),
            desc: parsed,
        })
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:{}", self.owner, self.name, self.desc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_ref_parses_descriptor() {
        let mref = MethodRef::new("demo/Widget", "resize", "(II)Z").unwrap();
        assert_eq!(mref.desc.args().len(), 2);
        assert_eq!(mref.to_string(), "demo/Widget.resize(II)Z");
    }

    #[test]
    fn test_method_ref_rejects_field_descriptor() {
        assert!(MethodRef::new("demo/Widget", "resize", "I").is_err());
    }

    #[test]
    fn test_field_ref_parses_descriptor() {
        let fref = FieldRef::new("demo/Widget", "size", "J").unwrap();
        assert_eq!(fref.desc, TypeDesc::Long);
        assert_eq!(fref.to_string(), "demo/Widget.size:J");
    }

    #[test]
    fn test_field_ref_rejects_method_descriptor() {
        assert!(FieldRef::new("demo/Widget", "size", "()J").is_err());
        assert!(FieldRef::new("demo/Widget", "size", "V").is_err());
    }
}
