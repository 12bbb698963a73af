//! Corundum: the object model core of a dynamic-language runtime.
//!
//! Types, modules, mixin composition, singleton types, message dispatch with
//! `super`, constant resolution and class variables, all living in one
//! [`ObjectSpace`].
//!
//! ```
//! use corundum::prelude::*;
//!
//! let mut space = ObjectSpace::new();
//! let object = space.builtins().object;
//! let loud = space.define_module(object, "Loud").unwrap();
//! let widget = space.define_class(object, "Widget", None).unwrap();
//! space.define_method(loud, "speak", NativeMethod::constant(Value::str("HI")));
//! space.include(loud, widget).unwrap();
//!
//! let instance = space.instantiate(widget, vec![]).unwrap();
//! assert_eq!(space.send(&instance, "speak", vec![]).unwrap(), Value::str("HI"));
//! assert_eq!(&space.ancestor_names(widget)[..2], ["Widget", "Loud"]);
//! ```

pub use corundum_core as core;
pub use corundum_registry as registry;

pub use corundum_core::{
    AncestorEntry, Epoch, LookupError, ModelResult, ObjectId, ObjectModelError, ProxyId,
    QualifiedName, TopologyError, TypeFlags, TypeId, Value, ValueKind, ValueTable,
};
pub use corundum_registry::{
    Attached, Builtins, CONST_MISSING, Invocation, METHOD_MISSING, MethodBody, MethodRecord,
    NativeMethod, Nesting, ObjectSpace, ProxyRole, SpaceConfig, SpaceStats,
};

/// Everything needed to build and drive an object space.
pub mod prelude {
    pub use corundum_core::{ModelResult, ObjectModelError, TypeId, Value};
    pub use corundum_registry::{Invocation, NativeMethod, Nesting, ObjectSpace, SpaceConfig};
}
