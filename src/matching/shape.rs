//! Wildcard-capable method signature patterns.
//!
//! A [`ShapePattern`] matches a [`MethodDesc`] position by position. Each position is a
//! [`TypePattern`]: an exact descriptor, the `*` wildcard, or an object-prefix form like
//! `Llunar/*;` that matches any class under a package. A trailing `..` leaves the argument
//! list open-ended. The text grammar is validated eagerly at construction, so matching
//! itself is infallible.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::classfile::{MethodDesc, TypeDesc};
use crate::Result;

/// A pattern over a single type position.
#[derive(Debug, Clone, PartialEq)]
pub enum TypePattern {
    /// Matches any type, written `*`
    Any,
    /// Matches exactly the given type
    Is(TypeDesc),
    /// Matches any object type whose internal name starts with the prefix,
    /// written `Lprefix/*;`
    ObjectPrefix(String),
}

impl TypePattern {
    /// Whether the pattern matches the given type.
    #[must_use]
    pub fn matches(&self, desc: &TypeDesc) -> bool {
        match self {
            TypePattern::Any => true,
            TypePattern::Is(expected) => expected == desc,
            TypePattern::ObjectPrefix(prefix) => desc
                .internal_name()
                .is_some_and(|name| name.starts_with(prefix.as_str())),
        }
    }
}

impl fmt::Display for TypePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypePattern::Any => f.write_str("*"),
            TypePattern::Is(desc) => desc.fmt(f),
            TypePattern::ObjectPrefix(prefix) => write!(f, "L{}*;", prefix),
        }
    }
}

/// A structural pattern over a whole method signature.
///
/// # Text form
///
/// The text form mirrors a method descriptor with pattern positions:
///
/// - `(Ljava/lang/String;*)Ljava/util/Set;` - two arguments, the second arbitrary
/// - `(Ljava/lang/String;..)V` - a leading `String`, any further arguments
/// - `(*)Llunar/*;` - one argument of any type, returning anything under `lunar/`
///
/// # Examples
///
/// ```rust
/// use classweave::matching::ShapePattern;
/// use classweave::classfile::MethodDesc;
///
/// let pattern = ShapePattern::parse("(Ljava/lang/String;..)*")?;
/// assert!(pattern.matches(&MethodDesc::parse("(Ljava/lang/String;I)V")?));
/// assert!(!pattern.matches(&MethodDesc::parse("(I)V")?));
/// # Ok::<(), classweave::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ShapePattern {
    args: Vec<TypePattern>,
    ret: TypePattern,
    args_tail_open: bool,
}

impl ShapePattern {
    /// A pattern matching exactly the given argument positions and return pattern.
    #[must_use]
    pub fn exact(args: Vec<TypePattern>, ret: TypePattern) -> Self {
        ShapePattern {
            args,
            ret,
            args_tail_open: false,
        }
    }

    /// A pattern matching the given leading argument positions, any further arguments,
    /// and the return pattern.
    #[must_use]
    pub fn with_open_tail(args: Vec<TypePattern>, ret: TypePattern) -> Self {
        ShapePattern {
            args,
            ret,
            args_tail_open: true,
        }
    }

    /// A pattern constrained only by its return position.
    #[must_use]
    pub fn returning(ret: TypePattern) -> Self {
        Self::with_open_tail(Vec::new(), ret)
    }

    /// Parse the text form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Predicate`] for grammar-level problems (missing
    /// parentheses, a `..` that is not in trailing position) and
    /// [`crate::Error::Descriptor`] when an embedded exact descriptor is malformed.
    pub fn parse(text: &str) -> Result<Self> {
        let bytes = text.as_bytes();
        if bytes.first() != Some(&b'(') {
            return Err(crate::Error::Predicate {
                message: format!("shape pattern {:?} must start with '('", text),
            });
        }

        let mut pos = 1;
        let mut args = Vec::new();
        let mut args_tail_open = false;
        loop {
            match bytes.get(pos) {
                Some(b')') => {
                    pos += 1;
                    break;
                }
                Some(_) if args_tail_open => {
                    return Err(crate::Error::Predicate {
                        message: format!("'..' must be the last argument position in {:?}", text),
                    });
                }
                Some(b'.') => {
                    if bytes.get(pos + 1) != Some(&b'.') {
                        return Err(crate::Error::Predicate {
                            message: format!("stray '.' in shape pattern {:?}", text),
                        });
                    }
                    args_tail_open = true;
                    pos += 2;
                }
                Some(_) => args.push(Self::read_position(text, &mut pos)?),
                None => {
                    return Err(crate::Error::Predicate {
                        message: format!("unterminated argument list in shape pattern {:?}", text),
                    });
                }
            }
        }

        let ret = Self::read_position(text, &mut pos)?;
        if pos != text.len() {
            return Err(crate::Error::Predicate {
                message: format!("trailing characters in shape pattern {:?}", text),
            });
        }

        Ok(ShapePattern {
            args,
            ret,
            args_tail_open,
        })
    }

    /// Read one pattern position starting at `pos`.
    fn read_position(text: &str, pos: &mut usize) -> Result<TypePattern> {
        let bytes = text.as_bytes();
        match bytes.get(*pos) {
            Some(b'*') => {
                *pos += 1;
                Ok(TypePattern::Any)
            }
            Some(b'L') => {
                // An object position ending in `/*;` (or the bare `L*;`) is a prefix
                // pattern; anything else is an exact descriptor.
                let rest = &text[*pos + 1..];
                if let Some(end) = rest.find(';') {
                    if let Some(prefix) = rest[..end].strip_suffix('*') {
                        *pos += 1 + end + 1;
                        return Ok(TypePattern::ObjectPrefix(prefix.to_string()));
                    }
                }
                Ok(TypePattern::Is(TypeDesc::read(text, pos)?))
            }
            Some(_) => Ok(TypePattern::Is(TypeDesc::read(text, pos)?)),
            None => Err(crate::Error::Predicate {
                message: format!("unexpected end of shape pattern {:?}", text),
            }),
        }
    }

    /// The argument position patterns.
    #[must_use]
    pub fn args(&self) -> &[TypePattern] {
        &self.args
    }

    /// The return position pattern.
    #[must_use]
    pub fn ret(&self) -> &TypePattern {
        &self.ret
    }

    /// Whether the argument list is open-ended.
    #[must_use]
    pub fn is_tail_open(&self) -> bool {
        self.args_tail_open
    }

    /// Whether the pattern matches the given method descriptor.
    #[must_use]
    pub fn matches(&self, desc: &MethodDesc) -> bool {
        let args = desc.args();
        if self.args_tail_open {
            if args.len() < self.args.len() {
                return false;
            }
        } else if args.len() != self.args.len() {
            return false;
        }

        self.args
            .iter()
            .zip(args)
            .all(|(pattern, arg)| pattern.matches(arg))
            && self.ret.matches(desc.ret())
    }
}

impl fmt::Display for ShapePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for arg in &self.args {
            arg.fmt(f)?;
        }
        if self.args_tail_open {
            f.write_str("..")?;
        }
        f.write_str(")")?;
        self.ret.fmt(f)
    }
}

impl Serialize for ShapePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ShapePattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        ShapePattern::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(text: &str) -> MethodDesc {
        MethodDesc::parse(text).unwrap()
    }

    #[test]
    fn test_exact_match() {
        let pattern = ShapePattern::parse("(Ljava/lang/String;I)V").unwrap();
        assert!(pattern.matches(&desc("(Ljava/lang/String;I)V")));
        assert!(!pattern.matches(&desc("(Ljava/lang/String;)V")));
        assert!(!pattern.matches(&desc("(Ljava/lang/String;I)I")));
    }

    #[test]
    fn test_any_positions() {
        let pattern = ShapePattern::parse("(*)*").unwrap();
        assert!(pattern.matches(&desc("(I)V")));
        assert!(pattern.matches(&desc("([[Ljava/lang/Object;)J")));
        assert!(!pattern.matches(&desc("()V")));
        assert!(!pattern.matches(&desc("(II)V")));
    }

    #[test]
    fn test_open_tail() {
        let pattern = ShapePattern::parse("(Ljava/lang/String;..)V").unwrap();
        assert!(pattern.matches(&desc("(Ljava/lang/String;)V")));
        assert!(pattern.matches(&desc("(Ljava/lang/String;IJ)V")));
        assert!(!pattern.matches(&desc("(I)V")));
        assert!(!pattern.matches(&desc("()V")));
    }

    #[test]
    fn test_object_prefix() {
        let pattern = ShapePattern::parse("(*)Llunar/*;").unwrap();
        assert!(pattern.matches(&desc("(I)Llunar/chat/Component;")));
        assert!(!pattern.matches(&desc("(I)Ljava/lang/String;")));
        assert!(!pattern.matches(&desc("(I)I")));

        let any_object = ShapePattern::parse("()L*;").unwrap();
        assert!(any_object.matches(&desc("()Ljava/lang/String;")));
        assert!(!any_object.matches(&desc("()[Ljava/lang/String;")));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ShapePattern::parse("Ljava/lang/String;").is_err());
        assert!(ShapePattern::parse("(..I)V").is_err());
        assert!(ShapePattern::parse("(.I)V").is_err());
        assert!(ShapePattern::parse("(I V").is_err());
        assert!(ShapePattern::parse("(I)").is_err());
        assert!(ShapePattern::parse("(I)VV").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for text in [
            "(Ljava/lang/String;*)Ljava/util/Set;",
            "(Ljava/lang/String;..)V",
            "(*)Llunar/*;",
            "()V",
        ] {
            assert_eq!(ShapePattern::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_returning_constructor() {
        let pattern = ShapePattern::returning(TypePattern::Is(TypeDesc::object("demo/Mappings")));
        assert!(pattern.matches(&desc("()Ldemo/Mappings;")));
        assert!(pattern.matches(&desc("(IJ)Ldemo/Mappings;")));
        assert!(!pattern.matches(&desc("()V")));
    }
}
