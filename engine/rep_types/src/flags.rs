//! Policy flags attached to types and members.
//!
//! Flags are declared once at registration and never change afterwards,
//! so every cached decision derived from them stays valid.

use bitflags::bitflags;

bitflags! {
    /// Per-type copy policy.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TypeFlags: u16 {
        /// Instances never need copying: a whitelisted immutable leaf.
        const IMMUTABLE = 1 << 0;
        /// Member walks stop before this base type. Its fields and its
        /// ancestors' fields are carried over untouched.
        const BOUNDARY = 1 << 1;
        /// The container cannot be constructed empty, so it is copied
        /// member-wise instead of through its collection adapter.
        const NO_DEFAULT_CTOR = 1 << 2;
        /// Opaque native type that knows how to duplicate itself.
        const SELF_CLONE = 1 << 3;
    }
}

bitflags! {
    /// Per-member copy policy.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct FieldFlags: u8 {
        /// Member is excluded from copying and reset to its default.
        const IGNORE = 1 << 0;
        /// Member is explicitly kept, overriding `NON_SERIALIZED`.
        const KEEP = 1 << 1;
        /// Member is transient. Ignored unless `KEEP` is also set.
        const NON_SERIALIZED = 1 << 2;
        /// Member is write-once after construction.
        const READONLY = 1 << 3;
    }
}

impl FieldFlags {
    /// Resolve the member ignore policy.
    ///
    /// `IGNORE` wins, then `KEEP`, then `NON_SERIALIZED`.
    #[inline]
    pub fn is_ignored(self) -> bool {
        if self.contains(Self::IGNORE) {
            true
        } else if self.contains(Self::KEEP) {
            false
        } else {
            self.contains(Self::NON_SERIALIZED)
        }
    }
}
