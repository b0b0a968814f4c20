//! Built-in types
//!
//! This module defines the built-in type names of the schema language and
//! the integer family with its bit widths and bounds. These types form the
//! foundation of value domain synthesis.

use std::fmt;

// =============================================================================
// Built-in type names
// =============================================================================

/// int8 type name
pub const INT8: &str = "int8";
/// int16 type name
pub const INT16: &str = "int16";
/// int32 type name
pub const INT32: &str = "int32";
/// int64 type name
pub const INT64: &str = "int64";
/// uint8 type name
pub const UINT8: &str = "uint8";
/// uint16 type name
pub const UINT16: &str = "uint16";
/// uint32 type name
pub const UINT32: &str = "uint32";
/// uint64 type name
pub const UINT64: &str = "uint64";
/// decimal64 type name
pub const DECIMAL64: &str = "decimal64";
/// string type name
pub const STRING: &str = "string";
/// boolean type name
pub const BOOLEAN: &str = "boolean";
/// empty type name
pub const EMPTY: &str = "empty";
/// enumeration type name
pub const ENUMERATION: &str = "enumeration";
/// bits type name
pub const BITS: &str = "bits";
/// binary type name
pub const BINARY: &str = "binary";
/// identityref type name
pub const IDENTITYREF: &str = "identityref";
/// instance-identifier type name
pub const INSTANCE_IDENTIFIER: &str = "instance-identifier";
/// union type name
pub const UNION: &str = "union";
/// leafref type name
pub const LEAFREF: &str = "leafref";

/// All built-in type names
pub const BUILTIN_TYPES: &[&str] = &[
    INT8,
    INT16,
    INT32,
    INT64,
    UINT8,
    UINT16,
    UINT32,
    UINT64,
    DECIMAL64,
    STRING,
    BOOLEAN,
    EMPTY,
    ENUMERATION,
    BITS,
    BINARY,
    IDENTITYREF,
    INSTANCE_IDENTIFIER,
    UNION,
    LEAFREF,
];

/// Check if a type name refers to a built-in type
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_TYPES.contains(&name)
}

// =============================================================================
// Integer family
// =============================================================================

/// Integer built-in types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerKind {
    /// 8-bit signed
    Int8,
    /// 16-bit signed
    Int16,
    /// 32-bit signed
    Int32,
    /// 64-bit signed
    Int64,
    /// 8-bit unsigned
    Uint8,
    /// 16-bit unsigned
    Uint16,
    /// 32-bit unsigned
    Uint32,
    /// 64-bit unsigned
    Uint64,
}

impl IntegerKind {
    /// Look up an integer kind by type name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            INT8 => Some(Self::Int8),
            INT16 => Some(Self::Int16),
            INT32 => Some(Self::Int32),
            INT64 => Some(Self::Int64),
            UINT8 => Some(Self::Uint8),
            UINT16 => Some(Self::Uint16),
            UINT32 => Some(Self::Uint32),
            UINT64 => Some(Self::Uint64),
            _ => None,
        }
    }

    /// Type name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int8 => INT8,
            Self::Int16 => INT16,
            Self::Int32 => INT32,
            Self::Int64 => INT64,
            Self::Uint8 => UINT8,
            Self::Uint16 => UINT16,
            Self::Uint32 => UINT32,
            Self::Uint64 => UINT64,
        }
    }

    /// Bit width
    pub fn bits(&self) -> u32 {
        match self {
            Self::Int8 | Self::Uint8 => 8,
            Self::Int16 | Self::Uint16 => 16,
            Self::Int32 | Self::Uint32 => 32,
            Self::Int64 | Self::Uint64 => 64,
        }
    }

    /// Whether the type is signed
    pub fn is_signed(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// Smallest representable value
    pub fn min(&self) -> i128 {
        if self.is_signed() {
            -(1i128 << (self.bits() - 1))
        } else {
            0
        }
    }

    /// Largest representable value
    pub fn max(&self) -> i128 {
        if self.is_signed() {
            (1i128 << (self.bits() - 1)) - 1
        } else {
            (1i128 << self.bits()) - 1
        }
    }

    /// Boundary samples used when no range is declared:
    /// `[min, min + 2^(bits-2), max]`
    pub fn default_samples(&self) -> [i128; 3] {
        let min = self.min();
        [min, min + (1i128 << (self.bits() - 2)), self.max()]
    }

    /// Check that a value fits the type
    pub fn contains(&self, value: i128) -> bool {
        value >= self.min() && value <= self.max()
    }
}

impl fmt::Display for IntegerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Raw bounds of decimal64 values: the scaled 64-bit integer range.
/// The value bounds are these divided by 10^fraction-digits.
pub fn decimal64_raw_bounds() -> (i128, i128) {
    (i64::MIN as i128, i64::MAX as i128)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_bounds() {
        assert_eq!(IntegerKind::Int8.min(), -128);
        assert_eq!(IntegerKind::Int8.max(), 127);
        assert_eq!(IntegerKind::Uint8.min(), 0);
        assert_eq!(IntegerKind::Uint8.max(), 255);
        assert_eq!(IntegerKind::Int64.min(), i64::MIN as i128);
        assert_eq!(IntegerKind::Uint64.max(), u64::MAX as i128);
    }

    #[test]
    fn test_default_samples() {
        assert_eq!(IntegerKind::Int8.default_samples(), [-128, -64, 127]);
        assert_eq!(IntegerKind::Uint8.default_samples(), [0, 64, 255]);
        assert_eq!(IntegerKind::Uint16.default_samples(), [0, 16384, 65535]);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(IntegerKind::from_name("uint32"), Some(IntegerKind::Uint32));
        assert_eq!(IntegerKind::from_name("string"), None);
        assert!(is_builtin("leafref"));
        assert!(!is_builtin("interface-ref"));
    }
}
