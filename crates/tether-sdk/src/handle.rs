//! Opaque token for a runtime-managed object
//!
//! A `Handle` is the raw reference the foreign runtime hands out for every
//! object it allocates. It is a plain 64-bit token: copying it is free and
//! says nothing about ownership. The runtime may reclaim the referenced
//! object at any allocation unless the handle is protected by a
//! [`Protect`](crate::Protect) scope, preserved through the
//! [`registry`](crate::registry), or wrapped in a [`Sexp`](crate::Sexp).
//!
//! # Encoding
//!
//! The bit layout belongs to the runtime. The SDK only compares handles for
//! identity and moves the bits across the boundary with `from_bits`/`to_bits`.

/// Opaque, non-owning reference to a runtime object.
///
/// Equality is identity equality in the runtime's object space.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Handle(u64);

impl Handle {
    /// Create from raw bits (runtime-defined encoding)
    #[inline(always)]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Get raw bits (runtime-defined encoding)
    #[inline(always)]
    pub const fn to_bits(self) -> u64 {
        self.0
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({:#x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_roundtrip() {
        let h = Handle::from_bits(0x1_0000_002a);
        assert_eq!(h.to_bits(), 0x1_0000_002a);
        assert_eq!(Handle::from_bits(h.to_bits()), h);
    }

    #[test]
    fn test_identity_equality() {
        let a = Handle::from_bits(7);
        let b = a;
        assert_eq!(a, b);
        assert_ne!(a, Handle::from_bits(8));
    }

    #[test]
    fn test_debug_format() {
        let s = format!("{:?}", Handle::from_bits(255));
        assert_eq!(s, "Handle(0xff)");
    }
}
