//! JVM type and method descriptor parsing.
//!
//! Descriptors enter the system as text (`"(Ljava/lang/String;I)V"`) and are parsed exactly
//! once, at the point where a reference or pattern is constructed. Everything downstream
//! works with the parsed [`TypeDesc`] / [`MethodDesc`] values and can rely on them being
//! well-formed. Parsing is strict: trailing characters, unterminated class names and `void`
//! parameters are all rejected with [`crate::Error::Descriptor`].

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::classfile::instruction::VarKind;
use crate::Result;

/// A parsed JVM field type descriptor.
///
/// Covers the full descriptor grammar: the eight primitives, `void`, object types holding
/// their internal name, and arrays of any element type.
///
/// # Examples
///
/// ```rust
/// use classweave::classfile::TypeDesc;
///
/// let desc = TypeDesc::parse("[Ljava/lang/String;")?;
/// assert_eq!(desc.raw(), "[Ljava/lang/String;");
/// assert_eq!(desc.slot_width(), 1);
/// # Ok::<(), classweave::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    /// The `void` pseudo-type, only valid in return position
    Void,
    /// `boolean`, descriptor `Z`
    Boolean,
    /// `byte`, descriptor `B`
    Byte,
    /// `char`, descriptor `C`
    Char,
    /// `short`, descriptor `S`
    Short,
    /// `int`, descriptor `I`
    Int,
    /// `long`, descriptor `J`, occupying two slots
    Long,
    /// `float`, descriptor `F`
    Float,
    /// `double`, descriptor `D`, occupying two slots
    Double,
    /// A class or interface type, holding the internal name (e.g. `java/lang/String`)
    Object(String),
    /// An array type with the given element type
    Array(Box<TypeDesc>),
}

impl TypeDesc {
    /// Parse a single complete field descriptor.
    ///
    /// The entire input must be consumed; trailing characters are an error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Descriptor`] if the text is not exactly one well-formed
    /// descriptor.
    pub fn parse(text: &str) -> Result<Self> {
        let mut pos = 0;
        let desc = Self::read(text, &mut pos)?;
        if pos != text.len() {
            return Err(crate::Error::Descriptor {
                message: format!("trailing characters after type descriptor in {:?}", text),
            });
        }
        Ok(desc)
    }

    /// Convenience constructor for an object type.
    #[must_use]
    pub fn object(name: impl Into<String>) -> Self {
        TypeDesc::Object(name.into())
    }

    /// Read one descriptor starting at `pos`, advancing `pos` past it.
    pub(crate) fn read(text: &str, pos: &mut usize) -> Result<Self> {
        let Some(&tag) = text.as_bytes().get(*pos) else {
            return Err(crate::Error::Descriptor {
                message: format!("unexpected end of descriptor {:?}", text),
            });
        };
        *pos += 1;
        match tag {
            b'V' => Ok(TypeDesc::Void),
            b'Z' => Ok(TypeDesc::Boolean),
            b'B' => Ok(TypeDesc::Byte),
            b'C' => Ok(TypeDesc::Char),
            b'S' => Ok(TypeDesc::Short),
            b'I' => Ok(TypeDesc::Int),
            b'J' => Ok(TypeDesc::Long),
            b'F' => Ok(TypeDesc::Float),
            b'D' => Ok(TypeDesc::Double),
            b'L' => {
                let rest = &text[*pos..];
                let Some(end) = rest.find(';') else {
                    return Err(crate::Error::Descriptor {
                        message: format!("unterminated object type in {:?}", text),
                    });
                };
                if end == 0 {
                    return Err(crate::Error::Descriptor {
                        message: format!("empty class name in {:?}", text),
                    });
                }
                let name = rest[..end].to_string();
                *pos += end + 1;
                Ok(TypeDesc::Object(name))
            }
            b'[' => Ok(TypeDesc::Array(Box::new(Self::read(text, pos)?))),
            other => Err(crate::Error::Descriptor {
                message: format!("unexpected character {:?} in descriptor {:?}", other as char, text),
            }),
        }
    }

    /// The textual descriptor form.
    #[must_use]
    pub fn raw(&self) -> String {
        self.to_string()
    }

    /// Number of operand-stack / local-variable slots a value of this type occupies.
    ///
    /// `void` occupies zero slots, `long` and `double` two, everything else one.
    #[must_use]
    pub fn slot_width(&self) -> u16 {
        match self {
            TypeDesc::Void => 0,
            TypeDesc::Long | TypeDesc::Double => 2,
            _ => 1,
        }
    }

    /// The internal name, if this is an object type.
    #[must_use]
    pub fn internal_name(&self) -> Option<&str> {
        match self {
            TypeDesc::Object(name) => Some(name),
            _ => None,
        }
    }

    /// Whether this is the `void` pseudo-type.
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, TypeDesc::Void)
    }

    /// Whether values of this type are references (objects and arrays).
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self, TypeDesc::Object(_) | TypeDesc::Array(_))
    }

    /// The load/store variable kind for values of this type.
    ///
    /// Returns `None` for `void`, which has no values. Sub-int primitives share the `int`
    /// kind, as they do on the operand stack.
    #[must_use]
    pub fn var_kind(&self) -> Option<VarKind> {
        match self {
            TypeDesc::Void => None,
            TypeDesc::Long => Some(VarKind::Long),
            TypeDesc::Float => Some(VarKind::Float),
            TypeDesc::Double => Some(VarKind::Double),
            TypeDesc::Object(_) | TypeDesc::Array(_) => Some(VarKind::Ref),
            _ => Some(VarKind::Int),
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Void => f.write_str("V"),
            TypeDesc::Boolean => f.write_str("Z"),
            TypeDesc::Byte => f.write_str("B"),
            TypeDesc::Char => f.write_str("C"),
            TypeDesc::Short => f.write_str("S"),
            TypeDesc::Int => f.write_str("I"),
            TypeDesc::Long => f.write_str("J"),
            TypeDesc::Float => f.write_str("F"),
            TypeDesc::Double => f.write_str("D"),
            TypeDesc::Object(name) => write!(f, "L{};", name),
            TypeDesc::Array(inner) => write!(f, "[{}", inner),
        }
    }
}

impl Serialize for TypeDesc {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw())
    }
}

impl<'de> Deserialize<'de> for TypeDesc {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        TypeDesc::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// A parsed JVM method descriptor.
///
/// Holds the argument types and return type along with the validated textual form.
///
/// # Examples
///
/// ```rust
/// use classweave::classfile::{MethodDesc, TypeDesc};
///
/// let desc = MethodDesc::parse("(Ljava/lang/String;J)V")?;
/// assert_eq!(desc.args().len(), 2);
/// assert_eq!(desc.arg_slots(), 3);
/// assert_eq!(*desc.ret(), TypeDesc::Void);
/// # Ok::<(), classweave::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDesc {
    args: Vec<TypeDesc>,
    ret: TypeDesc,
    raw: String,
}

impl MethodDesc {
    /// Parse a complete method descriptor of the form `(<args>)<ret>`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Descriptor`] if the argument list is unbalanced, a parameter
    /// is `void`, or any contained type descriptor is malformed.
    pub fn parse(text: &str) -> Result<Self> {
        let bytes = text.as_bytes();
        if bytes.first() != Some(&b'(') {
            return Err(crate::Error::Descriptor {
                message: format!("method descriptor {:?} must start with '('", text),
            });
        }

        let mut pos = 1;
        let mut args = Vec::new();
        loop {
            match bytes.get(pos) {
                Some(b')') => {
                    pos += 1;
                    break;
                }
                Some(_) => {
                    let arg = TypeDesc::read(text, &mut pos)?;
                    if arg.is_void() {
                        return Err(crate::Error::Descriptor {
                            message: format!("void parameter in method descriptor {:?}", text),
                        });
                    }
                    args.push(arg);
                }
                None => {
                    return Err(crate::Error::Descriptor {
                        message: format!("unterminated argument list in {:?}", text),
                    });
                }
            }
        }

        let ret = TypeDesc::read(text, &mut pos)?;
        if pos != text.len() {
            return Err(crate::Error::Descriptor {
                message: format!("trailing characters after method descriptor in {:?}", text),
            });
        }

        Ok(MethodDesc {
            args,
            ret,
            raw: text.to_string(),
        })
    }

    /// The textual descriptor form.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The argument types, in declaration order.
    #[must_use]
    pub fn args(&self) -> &[TypeDesc] {
        &self.args
    }

    /// The first argument type, if the method takes any arguments.
    #[must_use]
    pub fn first_arg(&self) -> Option<&TypeDesc> {
        self.args.first()
    }

    /// The return type.
    #[must_use]
    pub fn ret(&self) -> &TypeDesc {
        &self.ret
    }

    /// Total number of local-variable slots the arguments occupy.
    ///
    /// Does not include the `this` slot of instance methods.
    #[must_use]
    pub fn arg_slots(&self) -> u16 {
        self.args.iter().map(TypeDesc::slot_width).sum()
    }
}

impl fmt::Display for MethodDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for MethodDesc {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for MethodDesc {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        MethodDesc::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitives() {
        assert_eq!(TypeDesc::parse("I").unwrap(), TypeDesc::Int);
        assert_eq!(TypeDesc::parse("J").unwrap(), TypeDesc::Long);
        assert_eq!(TypeDesc::parse("V").unwrap(), TypeDesc::Void);
        assert_eq!(TypeDesc::parse("Z").unwrap(), TypeDesc::Boolean);
    }

    #[test]
    fn test_parse_object_and_array() {
        assert_eq!(
            TypeDesc::parse("Ljava/lang/String;").unwrap(),
            TypeDesc::Object("java/lang/String".into())
        );
        assert_eq!(
            TypeDesc::parse("[[I").unwrap(),
            TypeDesc::Array(Box::new(TypeDesc::Array(Box::new(TypeDesc::Int))))
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(TypeDesc::parse("").is_err());
        assert!(TypeDesc::parse("Q").is_err());
        assert!(TypeDesc::parse("Ljava/lang/String").is_err());
        assert!(TypeDesc::parse("L;").is_err());
        assert!(TypeDesc::parse("II").is_err());
        assert!(TypeDesc::parse("[").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["I", "Ljava/util/Set;", "[[Ljava/lang/Object;", "D"] {
            assert_eq!(TypeDesc::parse(text).unwrap().raw(), text);
        }
    }

    #[test]
    fn test_method_desc_parse() {
        let desc = MethodDesc::parse("(Ljava/lang/String;Ljava/lang/String;[Ljava/lang/Object;)Ljava/lang/String;")
            .unwrap();
        assert_eq!(desc.args().len(), 3);
        assert_eq!(desc.ret().internal_name(), Some("java/lang/String"));
        assert_eq!(desc.arg_slots(), 3);
    }

    #[test]
    fn test_method_desc_wide_args() {
        let desc = MethodDesc::parse("(JDI)V").unwrap();
        assert_eq!(desc.arg_slots(), 5);
    }

    #[test]
    fn test_method_desc_rejects_malformed() {
        assert!(MethodDesc::parse("()").is_err());
        assert!(MethodDesc::parse("(V)V").is_err());
        assert!(MethodDesc::parse("(I").is_err());
        assert!(MethodDesc::parse("I)V").is_err());
        assert!(MethodDesc::parse("()VV").is_err());
    }

    #[test]
    fn test_var_kind() {
        assert_eq!(TypeDesc::parse("I").unwrap().var_kind(), Some(VarKind::Int));
        assert_eq!(TypeDesc::parse("S").unwrap().var_kind(), Some(VarKind::Int));
        assert_eq!(TypeDesc::parse("J").unwrap().var_kind(), Some(VarKind::Long));
        assert_eq!(
            TypeDesc::parse("[I").unwrap().var_kind(),
            Some(VarKind::Ref)
        );
        assert_eq!(TypeDesc::parse("V").unwrap().var_kind(), None);
    }
}
