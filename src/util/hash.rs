//! Content fingerprinting.
//!
//! Every bake cache is keyed by a 64-bit fingerprint built by feeding typed
//! fields to a streaming hasher in a fixed order. Equal fingerprints are
//! treated as canonical equality; there is no fallback byte compare.

use fnv::FnvHasher;
use std::hash::Hasher as _;

/// 64-bit content fingerprint used as a cache key.
pub type Fingerprint = u64;

/// Streaming fingerprint hasher over FNV-1a.
///
/// Field order matters: callers must feed fields in the documented order for
/// each entity, and interleave separator words between variable-length byte
/// blocks so two blocks cannot alias across their boundary.
pub struct Hasher {
    inner: FnvHasher,
}

impl Hasher {
    /// Create a fresh hasher.
    pub fn new() -> Self {
        Self {
            inner: FnvHasher::default(),
        }
    }

    /// Feed raw bytes.
    #[inline]
    pub fn data(&mut self, bytes: &[u8]) {
        self.inner.write(bytes);
    }

    /// Feed a u32 field.
    #[inline]
    pub fn u32(&mut self, v: u32) {
        self.inner.write(&v.to_le_bytes());
    }

    /// Feed an i32 field.
    #[inline]
    pub fn i32(&mut self, v: i32) {
        self.inner.write(&v.to_le_bytes());
    }

    /// Feed a u64 field.
    #[inline]
    pub fn u64(&mut self, v: u64) {
        self.inner.write(&v.to_le_bytes());
    }

    /// Feed an f32 field by bit pattern.
    #[inline]
    pub fn f32(&mut self, v: f32) {
        self.inner.write(&v.to_bits().to_le_bytes());
    }

    /// Feed a length-prefixed string.
    #[inline]
    pub fn string(&mut self, s: &str) {
        self.u32(s.len() as u32);
        self.inner.write(s.as_bytes());
    }

    /// Finish and return the fingerprint.
    #[inline]
    pub fn get(&self) -> Fingerprint {
        self.inner.finish()
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let mut a = Hasher::new();
        a.u32(42);
        a.string("normal.png");
        a.f32(1.5);

        let mut b = Hasher::new();
        b.u32(42);
        b.string("normal.png");
        b.f32(1.5);

        assert_eq!(a.get(), b.get());
    }

    #[test]
    fn test_field_order_matters() {
        let mut a = Hasher::new();
        a.u32(1);
        a.u32(2);

        let mut b = Hasher::new();
        b.u32(2);
        b.u32(1);

        assert_ne!(a.get(), b.get());
    }

    #[test]
    fn test_separator_prevents_concatenation_alias() {
        // "ab" + "c" must not collide with "a" + "bc" once separators
        // are interleaved between the blocks.
        let mut a = Hasher::new();
        a.data(b"ab");
        a.u32(0xff);
        a.data(b"c");

        let mut b = Hasher::new();
        b.data(b"a");
        b.u32(0xff);
        b.data(b"bc");

        assert_ne!(a.get(), b.get());
    }

    #[test]
    fn test_string_is_length_prefixed() {
        let mut a = Hasher::new();
        a.string("ab");
        a.string("c");

        let mut b = Hasher::new();
        b.string("a");
        b.string("bc");

        assert_ne!(a.get(), b.get());
    }
}
