//! Core vocabulary of the corundum object model.
//!
//! This crate holds everything the object space is built from but none of
//! its logic: arena identifiers, epoch counters, runtime values, the
//! value-keyed hash table, type flags, constant paths and the error
//! taxonomy. It has no dependency on the registry crate, so collaborators
//! can depend on it alone to name types and values.

mod epoch;
mod error;
mod flags;
mod ids;
mod nesting_key;
mod qualified_name;
mod value;
mod value_table;

pub use epoch::{Epoch, EpochCounter, Stamped};
pub use error::{LookupError, ModelResult, ObjectModelError, TopologyError};
pub use flags::TypeFlags;
pub use ids::{AncestorEntry, ObjectId, ProxyId, TypeId};
pub use nesting_key::NestingKey;
pub use qualified_name::QualifiedName;
pub use value::{Value, ValueKind};
pub use value_table::ValueTable;
