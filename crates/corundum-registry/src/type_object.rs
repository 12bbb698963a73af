//! Arena records: types, proxy nodes and heap objects.

use std::sync::Arc;

use corundum_core::{
    AncestorEntry, Epoch, ObjectId, ProxyId, Stamped, TypeFlags, TypeId, Value, ValueTable,
};

use crate::method::MethodTable;

/// What a singleton type is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attached {
    Type(TypeId),
    Object(ObjectId),
}

impl Attached {
    pub fn as_value(self) -> Value {
        match self {
            Attached::Type(id) => Value::Type(id),
            Attached::Object(id) => Value::Object(id),
        }
    }
}

/// Memoized dispatch table, valid for one structural epoch and one method
/// serial.
#[derive(Debug, Clone)]
pub(crate) struct DispatchCache {
    pub(crate) epoch: Epoch,
    pub(crate) serial: Epoch,
    pub(crate) table: Arc<MethodTable>,
}

/// A class, module or singleton type.
#[derive(Debug)]
pub struct TypeObject {
    pub(crate) id: TypeId,
    pub(crate) flags: TypeFlags,
    /// Simple name, set when first bound to a constant.
    pub(crate) name: Option<Arc<str>>,
    /// The scope the type was first bound into.
    pub(crate) lexical_parent: Option<TypeId>,
    pub(crate) superclass: Option<TypeId>,
    /// Own methods. Empty once the type became a prepend shell; see `origin`.
    pub(crate) methods: MethodTable,
    pub(crate) constants: ValueTable<Value>,
    pub(crate) class_variables: ValueTable<Value>,
    /// Proxy chain of included modules, nearest first.
    pub(crate) included: Vec<ProxyId>,
    /// Proxy chain of prepended modules, nearest first.
    pub(crate) prepended: Vec<ProxyId>,
    /// Proxy holding the moved-out method table of a prepend shell.
    pub(crate) origin: Option<ProxyId>,
    pub(crate) ancestor_cache: Option<Stamped<Arc<[AncestorEntry]>>>,
    pub(crate) dispatch_cache: Option<DispatchCache>,
    pub(crate) singleton: Option<TypeId>,
    pub(crate) attached: Option<Attached>,
}

impl TypeObject {
    pub(crate) fn new(id: TypeId, flags: TypeFlags, superclass: Option<TypeId>) -> Self {
        Self {
            id,
            flags,
            name: None,
            lexical_parent: None,
            superclass,
            methods: MethodTable::default(),
            constants: ValueTable::new(),
            class_variables: ValueTable::new(),
            included: Vec::new(),
            prepended: Vec::new(),
            origin: None,
            ancestor_cache: None,
            dispatch_cache: None,
            singleton: None,
            attached: None,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    /// The simple name, if the type has been bound to a constant.
    pub fn simple_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn superclass(&self) -> Option<TypeId> {
        self.superclass
    }

    pub fn is_class(&self) -> bool {
        self.flags.contains(TypeFlags::CLASS)
    }

    pub fn is_module(&self) -> bool {
        self.flags.contains(TypeFlags::MODULE)
    }

    pub fn is_singleton(&self) -> bool {
        self.flags.contains(TypeFlags::SINGLETON)
    }

    pub fn is_prepend_shell(&self) -> bool {
        self.flags.contains(TypeFlags::PREPEND_SHELL)
    }

    pub fn singleton(&self) -> Option<TypeId> {
        self.singleton
    }

    pub fn attached(&self) -> Option<Attached> {
        self.attached
    }

    pub fn own_included(&self) -> &[ProxyId] {
        &self.included
    }

    pub fn own_prepended(&self) -> &[ProxyId] {
        &self.prepended
    }

    pub fn origin(&self) -> Option<ProxyId> {
        self.origin
    }
}

/// How a proxy node entered its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyRole {
    Included,
    Prepended,
    /// The relocated own table of a prepend shell.
    Origin,
}

/// One module's method table at one position of one ancestor chain.
#[derive(Debug)]
pub struct Proxy {
    pub(crate) id: ProxyId,
    /// The module this node mirrors.
    pub(crate) source: TypeId,
    /// The type whose chain this node sits in.
    pub(crate) target: TypeId,
    /// The module whose mixin created this node's segment.
    pub(crate) group: TypeId,
    pub(crate) role: ProxyRole,
    /// First node of a segment; segments are re-spliced between roots.
    pub(crate) is_root_of_group: bool,
    /// False once the node was spliced out by a re-splice.
    pub(crate) live: bool,
    pub(crate) methods: MethodTable,
}

impl Proxy {
    pub fn id(&self) -> ProxyId {
        self.id
    }

    pub fn source(&self) -> TypeId {
        self.source
    }

    pub fn target(&self) -> TypeId {
        self.target
    }

    pub fn group(&self) -> TypeId {
        self.group
    }

    pub fn role(&self) -> ProxyRole {
        self.role
    }

    pub fn is_root_of_group(&self) -> bool {
        self.is_root_of_group
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }
}

/// An allocated instance.
#[derive(Debug)]
pub(crate) struct HeapObject {
    pub(crate) class: TypeId,
    pub(crate) singleton: Option<TypeId>,
    pub(crate) ivars: ValueTable<Value>,
}

impl HeapObject {
    pub(crate) fn new(class: TypeId) -> Self {
        Self {
            class,
            singleton: None,
            ivars: ValueTable::new(),
        }
    }
}
