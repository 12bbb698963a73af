//! Type flags.

use bitflags::bitflags;

bitflags! {
    /// Flags describing what a type object is and how it has been reshaped.
    ///
    /// `CLASS`, `MODULE` and `SINGLETON` are mutually exclusive; the
    /// remaining flags are orthogonal markers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u8 {
        /// An instantiable class.
        const CLASS = 1 << 0;
        /// A mixin module.
        const MODULE = 1 << 1;
        /// A single-owner singleton type.
        const SINGLETON = 1 << 2;
        /// The type had a module prepended; its own methods now live in an
        /// origin proxy and the type itself is an empty redirect shell.
        const PREPEND_SHELL = 1 << 3;
        /// Created while bootstrapping the object space.
        const BOOT = 1 << 4;
    }
}

impl TypeFlags {
    /// The kind bits only (`CLASS`, `MODULE` or `SINGLETON`).
    pub fn kind(self) -> TypeFlags {
        self & (TypeFlags::CLASS | TypeFlags::MODULE | TypeFlags::SINGLETON)
    }
}
