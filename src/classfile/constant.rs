//! Constant-pool values carried by instructions and field initializers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A loadable constant value.
///
/// This is the operand type of [`crate::classfile::Op::Ldc`] and the type of a field's
/// `ConstantValue` initializer. Decoders normalize every constant-pushing instruction
/// (`iconst_*`, `bipush`, `sipush`, `ldc`, `ldc_w`, `ldc2_w`) down to an `Ldc` of one of
/// these values, so matchers never need to care which encoding the compiler chose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    /// A 32-bit integer constant
    Int(i32),
    /// A 64-bit integer constant, occupying two stack slots
    Long(i64),
    /// A 32-bit floating point constant
    Float(f32),
    /// A 64-bit floating point constant, occupying two stack slots
    Double(f64),
    /// A string literal
    Str(String),
    /// A class literal, holding the internal name of the referenced class
    Class(String),
}

impl ConstValue {
    /// Number of operand-stack slots this value occupies when pushed.
    #[must_use]
    pub fn slot_width(&self) -> u16 {
        match self {
            ConstValue::Long(_) | ConstValue::Double(_) => 2,
            _ => 1,
        }
    }

    /// The string payload, if this is a [`ConstValue::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstValue::Str(value) => Some(value),
            _ => None,
        }
    }

    /// The internal class name, if this is a [`ConstValue::Class`].
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        match self {
            ConstValue::Class(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(value) => write!(f, "{}", value),
            ConstValue::Long(value) => write!(f, "{}L", value),
            ConstValue::Float(value) => write!(f, "{}f", value),
            ConstValue::Double(value) => write!(f, "{}d", value),
            ConstValue::Str(value) => write!(f, "{:?}", value),
            ConstValue::Class(name) => write!(f, "{}.class", name),
        }
    }
}

impl From<i32> for ConstValue {
    fn from(value: i32) -> Self {
        ConstValue::Int(value)
    }
}

impl From<i64> for ConstValue {
    fn from(value: i64) -> Self {
        ConstValue::Long(value)
    }
}

impl From<f32> for ConstValue {
    fn from(value: f32) -> Self {
        ConstValue::Float(value)
    }
}

impl From<f64> for ConstValue {
    fn from(value: f64) -> Self {
        ConstValue::Double(value)
    }
}

impl From<&str> for ConstValue {
    fn from(value: &str) -> Self {
        ConstValue::Str(value.to_string())
    }
}

impl From<String> for ConstValue {
    fn from(value: String) -> Self {
        ConstValue::Str(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_width() {
        assert_eq!(ConstValue::Int(3).slot_width(), 1);
        assert_eq!(ConstValue::Str("x".into()).slot_width(), 1);
        assert_eq!(ConstValue::Long(3).slot_width(), 2);
        assert_eq!(ConstValue::Double(0.5).slot_width(), 2);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(ConstValue::Str("mods.json".into()).as_str(), Some("mods.json"));
        assert_eq!(ConstValue::Int(1).as_str(), None);
        assert_eq!(
            ConstValue::Class("demo/Widget".into()).class_name(),
            Some("demo/Widget")
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ConstValue::Long(7).to_string(), "7L");
        assert_eq!(ConstValue::Str("a\"b".into()).to_string(), "\"a\\\"b\"");
        assert_eq!(ConstValue::Class("demo/Widget".into()).to_string(), "demo/Widget.class");
    }
}
