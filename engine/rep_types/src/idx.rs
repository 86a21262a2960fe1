//! Compact type handle.
//!
//! Builtin scalar types live at fixed indices below [`TypeId::FIRST_DYNAMIC`]
//! so they can be named without a table. Everything a host registers gets
//! an index at or above it.

use std::fmt;

/// A 32-bit handle into the [`TypeTable`](crate::TypeTable).
///
/// Types are compared by index, never structurally.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    // === Builtin Types (indices 0-10) ===

    /// Dynamically-typed slot: the declared type of a member that may hold anything.
    pub const ANY: Self = Self(0);
    /// `bool`.
    pub const BOOL: Self = Self(1);
    /// 64-bit signed integer.
    pub const INT: Self = Self(2);
    /// 64-bit unsigned integer.
    pub const UINT: Self = Self(3);
    /// 8-bit unsigned integer.
    pub const BYTE: Self = Self(4);
    /// 64-bit float.
    pub const FLOAT: Self = Self(5);
    /// Unicode scalar value.
    pub const CHAR: Self = Self(6);
    /// Shared immutable string.
    pub const TEXT: Self = Self(7);
    /// 128-bit globally unique identifier.
    pub const GUID: Self = Self(8);
    /// Point in time, in ticks.
    pub const TIMESTAMP: Self = Self(9);
    /// Signed span of time, in ticks.
    pub const DURATION: Self = Self(10);

    /// Number of builtin types.
    pub const BUILTIN_COUNT: u32 = 11;

    // === Reserved Range (11-63) ===

    /// First index handed out to registered types.
    pub const FIRST_DYNAMIC: u32 = 64;

    /// Sentinel for "no type".
    pub const NONE: Self = Self(u32::MAX);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check if this is one of the fixed builtin types.
    #[inline]
    pub const fn is_builtin(self) -> bool {
        self.0 < Self::BUILTIN_COUNT
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Name of a builtin type, `None` for registered types.
    pub const fn builtin_name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("any"),
            1 => Some("bool"),
            2 => Some("int"),
            3 => Some("uint"),
            4 => Some("byte"),
            5 => Some("float"),
            6 => Some("char"),
            7 => Some("text"),
            8 => Some("guid"),
            9 => Some("timestamp"),
            10 => Some("duration"),
            _ => None,
        }
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "TypeId::NONE");
        }
        match self.builtin_name() {
            Some(name) => write!(f, "TypeId({name})"),
            None => write!(f, "TypeId({})", self.0),
        }
    }
}

impl Default for TypeId {
    fn default() -> Self {
        Self::NONE
    }
}
