//! Hashing of canonical forms.
//!
//! Two graphs are isomorphic iff their canonical adjacencies are equal;
//! `CanonicalKey` condenses that equality into a 256-bit token suitable for
//! hash maps and collection indexes. Hashing uses domain separation and
//! length prefixing so that distinct shapes cannot collide structurally.
//!
//! # Citations
//! - SHA-256: NIST FIPS 180-4 (2015)
//! - Domain separation & length prefixing: Bernstein et al., "How to hash
//!   into elliptic curves" (2009)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A 256-bit hash value.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashValue(pub [u8; 32]);

impl HashValue {
    /// Creates a zero hash (all zeros).
    #[inline]
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Creates a hash from a raw byte array.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw byte array.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Computes SHA-256 of `data` with domain separation.
    ///
    /// The domain prefix is `b"RLB:<domain>:v1" || length_prefix(data)`,
    /// with a 64-bit little-endian byte count as the length prefix.
    pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"RLB:");
        hasher.update(domain);
        hasher.update(b":v1");
        hasher.update((data.len() as u64).to_le_bytes());
        hasher.update(data);
        Self(hasher.finalize().into())
    }
}

impl std::fmt::Display for HashValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HashValue({:02x}{:02x}{:02x}{:02x}…)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// Indexing token of a canonical form.
///
/// Equal keys mean isomorphic graphs up to hash collision; compare
/// canonical adjacencies directly when certainty is required.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(HashValue);

impl CanonicalKey {
    /// Creates a key from a hash value.
    #[inline]
    pub const fn from_hash(hash: HashValue) -> Self {
        Self(hash)
    }

    /// Returns the underlying hash value.
    #[inline]
    pub const fn hash(&self) -> HashValue {
        self.0
    }
}

/// Hashes a canonical adjacency into its indexing key.
///
/// Encoding: vertex count, then per row a length prefix and the sorted
/// neighbor positions, all as 64-bit little-endian values.
pub fn canonical_key(adjacency: &[Vec<usize>]) -> CanonicalKey {
    let mut data = Vec::with_capacity(8 * (1 + 2 * adjacency.len()));
    data.extend_from_slice(&(adjacency.len() as u64).to_le_bytes());
    for row in adjacency {
        data.extend_from_slice(&(row.len() as u64).to_le_bytes());
        for &position in row {
            data.extend_from_slice(&(position as u64).to_le_bytes());
        }
    }
    CanonicalKey::from_hash(HashValue::hash_with_domain(b"CANON_ADJ", &data))
}
