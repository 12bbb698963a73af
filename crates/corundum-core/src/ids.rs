//! Arena identifiers for the object space.
//!
//! Every type, proxy node and heap object lives in a dense vector owned by
//! the object space. These identifiers are indices into those vectors; they
//! are only meaningful for the space that produced them.

use std::fmt;

/// Identifies a class, module or singleton type.
///
/// # Example
///
/// ```
/// use corundum_core::TypeId;
///
/// let id = TypeId::new(3);
/// assert_eq!(id.index(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    /// Create a new type ID with the given index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the underlying index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// The index as a `usize`, for arena access.
    #[inline]
    pub const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type_{}", self.0)
    }
}

impl From<u32> for TypeId {
    fn from(index: u32) -> Self {
        Self::new(index)
    }
}

/// Identifies one mixin proxy node (one module at one chain position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId(u32);

impl ProxyId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proxy_{}", self.0)
    }
}

/// Identity of a heap object.
///
/// Object IDs are handed out by a monotonically increasing generator and are
/// never reused, so they double as the object's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// One position in an ancestor chain.
///
/// A chain mixes real types (classes, singletons, modules that were not
/// mixed in) with proxy nodes standing in for mixed-in modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AncestorEntry {
    /// The type itself.
    Type(TypeId),
    /// A proxy node mirroring a module.
    Proxy(ProxyId),
}

impl AncestorEntry {
    /// Returns the type ID if this entry is a real type.
    pub fn as_type(self) -> Option<TypeId> {
        match self {
            AncestorEntry::Type(id) => Some(id),
            AncestorEntry::Proxy(_) => None,
        }
    }

    /// Returns the proxy ID if this entry is a proxy node.
    pub fn as_proxy(self) -> Option<ProxyId> {
        match self {
            AncestorEntry::Proxy(id) => Some(id),
            AncestorEntry::Type(_) => None,
        }
    }
}
