//! Hashed identity of a lexical nesting context.
//!
//! Relative constant lookups are memoized per `(nesting, name)`. A nesting is
//! an ordered list of enclosing types, so its identity is an XXHash64 over the
//! type indices with a per-position mix, the same construction used for
//! deterministic type hashes elsewhere in the workspace.

use std::fmt;

use xxhash_rust::xxh64::xxh64;

use crate::TypeId;

const NESTING_SEED: u64 = 0x6a09e667f3bcc908;
const POSITION_MIX: u64 = 0x9e3779b97f4a7c15;

/// Hash of an ordered list of enclosing types, innermost first.
///
/// Two nestings with the same scopes in the same order share a key; order is
/// significant.
///
/// ```
/// use corundum_core::{NestingKey, TypeId};
///
/// let a = TypeId::new(1);
/// let b = TypeId::new(2);
/// assert_eq!(NestingKey::from_scopes(&[a, b]), NestingKey::from_scopes(&[a, b]));
/// assert_ne!(NestingKey::from_scopes(&[a, b]), NestingKey::from_scopes(&[b, a]));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NestingKey(u64);

impl NestingKey {
    pub fn from_scopes(scopes: &[TypeId]) -> Self {
        let mut hash = NESTING_SEED;
        for (position, scope) in scopes.iter().enumerate() {
            let mixed = (position as u64 + 1).wrapping_mul(POSITION_MIX);
            let bytes = (u64::from(scope.index()) ^ mixed).to_le_bytes();
            hash = xxh64(&bytes, hash);
        }
        NestingKey(hash)
    }
}

impl fmt::Display for NestingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nesting:{:016x}", self.0)
    }
}
