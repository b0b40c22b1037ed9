//! JVM access-flag groups for classes, methods and fields.
//!
//! Flag values follow the `access_flags` encoding of the JVM class file format. Each
//! declaration kind gets its own [`bitflags`] type so a field flag can never be asked of a
//! method, and each type carries an extractor that masks a raw `u16` down to the bits that
//! are meaningful for that kind.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Class-level access and property flags
    pub struct ClassAccess: u16 {
        /// Declared public; may be accessed from outside its package
        const PUBLIC = 0x0001;
        /// Declared final; no subclasses allowed
        const FINAL = 0x0010;
        /// Treat superclass methods specially when dispatched by invokespecial
        const SUPER = 0x0020;
        /// Is an interface, not a class
        const INTERFACE = 0x0200;
        /// Declared abstract; must not be instantiated
        const ABSTRACT = 0x0400;
        /// Declared synthetic; not present in the source code
        const SYNTHETIC = 0x1000;
        /// Declared as an annotation interface
        const ANNOTATION = 0x2000;
        /// Declared as an enum class
        const ENUM = 0x4000;
    }
}

impl ClassAccess {
    /// Extract class flags from a raw `access_flags` value
    #[must_use]
    pub fn from_raw_flags(flags: u16) -> Self {
        Self::from_bits_truncate(flags)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method-level access and property flags
    pub struct MethodAccess: u16 {
        /// Declared public; may be accessed from outside its package
        const PUBLIC = 0x0001;
        /// Declared private; accessible only within the defining class
        const PRIVATE = 0x0002;
        /// Declared protected; may be accessed within subclasses
        const PROTECTED = 0x0004;
        /// Declared static
        const STATIC = 0x0008;
        /// Declared final; must not be overridden
        const FINAL = 0x0010;
        /// Declared synchronized; invocation is wrapped by a monitor
        const SYNCHRONIZED = 0x0020;
        /// A bridge method, generated by the compiler
        const BRIDGE = 0x0040;
        /// Declared with a variable number of arguments
        const VARARGS = 0x0080;
        /// Declared native; implemented in a language other than Java
        const NATIVE = 0x0100;
        /// Declared abstract; no implementation is provided
        const ABSTRACT = 0x0400;
        /// Declared strictfp; floating-point mode is FP-strict
        const STRICT = 0x0800;
        /// Declared synthetic; not present in the source code
        const SYNTHETIC = 0x1000;
    }
}

impl MethodAccess {
    /// Extract method flags from a raw `access_flags` value
    #[must_use]
    pub fn from_raw_flags(flags: u16) -> Self {
        Self::from_bits_truncate(flags)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Field-level access and property flags
    pub struct FieldAccess: u16 {
        /// Declared public; may be accessed from outside its package
        const PUBLIC = 0x0001;
        /// Declared private; accessible only within the defining class
        const PRIVATE = 0x0002;
        /// Declared protected; may be accessed within subclasses
        const PROTECTED = 0x0004;
        /// Declared static
        const STATIC = 0x0008;
        /// Declared final; never directly assigned after construction
        const FINAL = 0x0010;
        /// Declared volatile; cannot be cached
        const VOLATILE = 0x0040;
        /// Declared transient; not written by persistent object managers
        const TRANSIENT = 0x0080;
        /// Declared synthetic; not present in the source code
        const SYNTHETIC = 0x1000;
        /// Declared as an element of an enum class
        const ENUM = 0x4000;
    }
}

impl FieldAccess {
    /// Extract field flags from a raw `access_flags` value
    #[must_use]
    pub fn from_raw_flags(flags: u16) -> Self {
        Self::from_bits_truncate(flags)
    }
}

impl Default for ClassAccess {
    fn default() -> Self {
        Self::empty()
    }
}

impl Default for MethodAccess {
    fn default() -> Self {
        Self::empty()
    }
}

impl Default for FieldAccess {
    fn default() -> Self {
        Self::empty()
    }
}

// Flags serialize as their raw bit value so configuration files and the wire form of a
// class descriptor stay stable across flag additions.

impl Serialize for ClassAccess {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.bits())
    }
}

impl<'de> Deserialize<'de> for ClassAccess {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Self::from_bits_retain(u16::deserialize(deserializer)?))
    }
}

impl Serialize for MethodAccess {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.bits())
    }
}

impl<'de> Deserialize<'de> for MethodAccess {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Self::from_bits_retain(u16::deserialize(deserializer)?))
    }
}

impl Serialize for FieldAccess {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.bits())
    }
}

impl<'de> Deserialize<'de> for FieldAccess {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Self::from_bits_retain(u16::deserialize(deserializer)?))
    }
}
