//! Permutations of a finite vertex set.
//!
//! A `Perm` is a bijection of `[0, n)` stored as a dense image table. The
//! search reports discovered automorphisms as `Perm` values, and the group
//! adapter hands them back to the pruning engine when a node's stabilizer
//! gains generators.
//!
//! # Determinism
//! - Equality and hashing are over the image table.
//! - `Display` prints disjoint cycles with the smallest moved point first,
//!   cycles ordered by their smallest element.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error type for permutation construction failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermError {
    /// The image table is not a bijection of `[0, n)`.
    NotABijection {
        /// A value that is missing or repeated among the images.
        value: usize,
    },
}

impl fmt::Display for PermError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermError::NotABijection { value } => {
                write!(f, "image table is not a bijection: value {} missing or repeated", value)
            }
        }
    }
}

impl std::error::Error for PermError {}

/// A permutation of `[0, n)` as a dense image table.
///
/// # Invariant
/// - `map` is a bijection of `[0, map.len())`; `image(v) == map[v]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Perm {
    map: Vec<usize>,
}

impl Perm {
    /// Creates the identity permutation on `n` points.
    pub fn identity(n: usize) -> Self {
        Self { map: (0..n).collect() }
    }

    /// Creates a permutation from an image table.
    ///
    /// Returns an error if `map` is not a bijection of `[0, map.len())`.
    pub fn from_images(map: Vec<usize>) -> Result<Self, PermError> {
        let n = map.len();
        let mut seen = vec![false; n];
        for &img in &map {
            if img >= n || seen[img] {
                return Err(PermError::NotABijection { value: img });
            }
            seen[img] = true;
        }
        Ok(Self { map })
    }

    /// Number of points the permutation acts on.
    #[inline]
    pub fn degree(&self) -> usize {
        self.map.len()
    }

    /// The image of point `v`.
    ///
    /// # Panics
    /// Panics if `v` is out of range.
    #[inline]
    pub fn image(&self, v: usize) -> usize {
        self.map[v]
    }

    /// Whether every point is fixed.
    pub fn is_identity(&self) -> bool {
        self.map.iter().enumerate().all(|(v, &img)| v == img)
    }

    /// The inverse permutation.
    pub fn inverse(&self) -> Self {
        let mut inv = vec![0; self.map.len()];
        for (v, &img) in self.map.iter().enumerate() {
            inv[img] = v;
        }
        Self { map: inv }
    }

    /// Composition `self ∘ other`: first apply `other`, then `self`.
    ///
    /// # Panics
    /// Panics if the degrees differ.
    pub fn compose(&self, other: &Perm) -> Self {
        assert_eq!(self.degree(), other.degree(), "degree mismatch in composition");
        Self {
            map: other.map.iter().map(|&v| self.map[v]).collect(),
        }
    }

    /// The image table as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.map
    }
}

impl fmt::Display for Perm {
    /// Disjoint cycle notation; the identity prints as `()`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut seen = vec![false; self.map.len()];
        let mut any = false;
        for start in 0..self.map.len() {
            if seen[start] || self.map[start] == start {
                continue;
            }
            any = true;
            write!(f, "({}", start)?;
            let mut v = self.map[start];
            seen[start] = true;
            while v != start {
                seen[v] = true;
                write!(f, " {}", v)?;
                v = self.map[v];
            }
            write!(f, ")")?;
        }
        if !any {
            write!(f, "()")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_fixes_everything() {
        let id = Perm::identity(5);
        assert!(id.is_identity());
        for v in 0..5 {
            assert_eq!(id.image(v), v);
        }
    }

    #[test]
    fn from_images_rejects_non_bijections() {
        assert!(Perm::from_images(vec![0, 0, 1]).is_err());
        assert!(Perm::from_images(vec![0, 3, 1]).is_err());
        assert!(Perm::from_images(vec![2, 0, 1]).is_ok());
    }

    #[test]
    fn inverse_round_trips() {
        let p = Perm::from_images(vec![2, 0, 1, 3]).unwrap();
        let inv = p.inverse();
        assert!(p.compose(&inv).is_identity());
        assert!(inv.compose(&p).is_identity());
    }

    #[test]
    fn compose_applies_right_operand_first() {
        // other: 0->1->2->0, self: swap 0 and 1
        let other = Perm::from_images(vec![1, 2, 0]).unwrap();
        let this = Perm::from_images(vec![1, 0, 2]).unwrap();
        let composed = this.compose(&other);
        // 0 -other-> 1 -self-> 0
        assert_eq!(composed.image(0), 0);
        assert_eq!(composed.image(1), 2);
        assert_eq!(composed.image(2), 1);
    }

    #[test]
    fn cycle_notation() {
        let p = Perm::from_images(vec![1, 0, 2, 4, 3]).unwrap();
        assert_eq!(p.to_string(), "(0 1)(3 4)");
        assert_eq!(Perm::identity(3).to_string(), "()");
    }
}
