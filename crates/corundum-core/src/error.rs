//! Error types for the object model.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ObjectModelError (top-level wrapper)
//! ├── TopologyError  - structural violations detected at the mutating call
//! ├── LookupError    - failed lookups that no hook resolved
//! ├── Raised         - errors signalled by method bodies
//! ├── ArgumentCount  - arity mismatch on a native method
//! └── ArenaExhausted - a type, proxy or object arena is full
//! ```
//!
//! Topology errors are never retried or recovered inside the object model;
//! they propagate to the caller that requested the mutation. Lookup errors
//! are only produced after the corresponding hook (`const_missing`,
//! `method_missing`) had its chance.
//!
//! ```
//! use corundum_core::{LookupError, ObjectModelError};
//!
//! fn resolve() -> Result<(), ObjectModelError> {
//!     Err(LookupError::UninitializedConstant { name: "Missing".into() })?
//! }
//!
//! let err = resolve().unwrap_err();
//! assert!(err.is_lookup());
//! assert_eq!(err.to_string(), "uninitialized constant Missing");
//! ```

use thiserror::Error;

// ============================================================================
// Topology Errors
// ============================================================================

/// Structural violations: the requested change would leave the type graph
/// inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// A class was reopened with a different superclass.
    #[error("superclass mismatch for class {name}")]
    SuperclassMismatch { name: String },

    /// An existing binding is of a different kind than requested.
    #[error("{name} is not a {expected}")]
    KindMismatch {
        name: String,
        expected: &'static str,
    },

    /// The requested superclass cannot be subclassed.
    #[error("can't make subclass of {name}: {reason}")]
    InvalidSuperclass {
        name: String,
        reason: &'static str,
    },

    /// The mixin would make a type its own ancestor.
    #[error("cyclic mixin detected: {module} into {target}")]
    CyclicMixin { module: String, target: String },

    /// The target already had a module prepended.
    #[error("cannot prepend {module}: {target} already has a prepended module")]
    DoublePrepend { module: String, target: String },

    /// A class or singleton type was used where a module is required.
    #[error("wrong argument type {name} (expected module)")]
    NotAModule { name: String },

    /// Modules and singleton types have no instances.
    #[error("can't allocate instances of {name}")]
    NotInstantiable { name: String },

    /// Immediate values have no identity to attach a singleton type to.
    #[error("can't define singleton for {value}")]
    NoSingleton { value: String },
}

// ============================================================================
// Lookup Errors
// ============================================================================

/// Failed lookups that were not resolved by a hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("uninitialized constant {name}")]
    UninitializedConstant { name: String },

    #[error("super: no superclass method '{selector}' for {receiver}")]
    NoSuperclassMethod { selector: String, receiver: String },

    #[error("undefined method '{selector}' for {receiver}")]
    NoMethod { selector: String, receiver: String },

    /// Removal, undefinition or aliasing of a method the type does not have.
    #[error("method '{selector}' not defined in {owner}")]
    MethodNotDefined { selector: String, owner: String },

    #[error("uninitialized class variable {name} in {owner}")]
    UninitializedClassVariable { name: String, owner: String },

    #[error("wrong constant name {name}")]
    InvalidConstantName { name: String },

    #[error("'{name}' is not allowed as a class variable name")]
    InvalidClassVariableName { name: String },
}

// ============================================================================
// Top-level Error
// ============================================================================

/// Any error produced by the object model or by a method body running on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectModelError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Raised by a native method body.
    #[error("{message}")]
    Raised { message: String },

    #[error("wrong number of arguments for '{selector}' (given {given}, expected {expected})")]
    ArgumentCount {
        selector: String,
        expected: usize,
        given: usize,
    },

    /// An arena ran out of 32-bit indices.
    #[error("object space exhausted: too many {arena}")]
    ArenaExhausted { arena: &'static str },
}

impl ObjectModelError {
    /// Create an error raised by a method body.
    pub fn raise(message: impl Into<String>) -> Self {
        ObjectModelError::Raised {
            message: message.into(),
        }
    }

    pub fn is_topology(&self) -> bool {
        matches!(self, ObjectModelError::Topology(_))
    }

    pub fn is_lookup(&self) -> bool {
        matches!(self, ObjectModelError::Lookup(_))
    }
}

/// Result alias used throughout the object model.
pub type ModelResult<T> = Result<T, ObjectModelError>;
