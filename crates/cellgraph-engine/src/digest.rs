//! Output digest for reproducibility checks.
//!
//! FNV-1a over the exact bytes handed to the output. Two runs with the
//! same input, threshold and ordering produce the same digest. Not
//! cryptographically secure; it only replaces a byte-for-byte diff.

use std::io::{self, Write};

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

/// Incremental 64-bit FNV-1a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fnv1a(u64);

impl Default for Fnv1a {
    fn default() -> Self {
        Self(FNV_OFFSET)
    }
}

impl Fnv1a {
    /// Fresh state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `bytes` into the state.
    #[inline]
    pub fn update(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 ^ b as u64).wrapping_mul(FNV_PRIME);
        }
    }

    /// Current hash value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// `Write` adapter that hashes every byte the inner writer accepts.
#[derive(Debug)]
pub(crate) struct DigestWriter<W> {
    inner: W,
    hash: Fnv1a,
}

impl<W: Write> DigestWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self {
            inner,
            hash: Fnv1a::new(),
        }
    }

    pub(crate) fn digest(&self) -> u64 {
        self.hash.value()
    }

    pub(crate) fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub(crate) fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hash.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
