//! The corundum object space.
//!
//! [`ObjectSpace`] owns every type, mixin proxy and heap object of one
//! runtime, together with the caches derived from them. Everything is
//! addressed by arena index (`TypeId`, `ProxyId`, `ObjectId`), and derived
//! data (ancestor chains, dispatch tables, constant lookups) is memoized
//! against a structural epoch that every topology change bumps.
//!
//! Operations are grouped by concern:
//!
//! - `registry`: defining, reopening and instantiating types
//! - `ancestors`: include, prepend, extend and ancestor chains
//! - `singleton`: per-object and per-type singleton types
//! - `dispatch`: message send, `super`, method tables and stubs
//! - `constants`: qualified and lexical constant resolution
//! - `class_vars`: class variables

mod ancestors;
mod class_vars;
mod config;
mod constants;
mod dispatch;
mod method;
mod mixin_graph;
mod registry;
mod singleton;
mod space;
mod type_object;

pub use config::SpaceConfig;
pub use constants::{CONST_MISSING, Nesting};
pub use dispatch::METHOD_MISSING;
pub use method::{Invocation, MethodBody, MethodFn, MethodRecord, MethodTable, NativeMethod};
pub use space::{Builtins, ObjectSpace, SpaceStats};
pub use type_object::{Attached, Proxy, ProxyRole, TypeObject};
