//! ObjectSpace - the arena holding the whole type graph.
//!
//! This module provides [`ObjectSpace`], which owns every type object, proxy
//! node and heap object, the structural epoch counter and all memo caches.
//! The operations on it are split across sibling modules:
//!
//! - `registry`: defining and naming classes and modules
//! - `ancestors`: ancestor chains, include, prepend, extend
//! - `singleton`: lazily built singleton types
//! - `dispatch`: method tables, sends, `super`, stubs
//! - `constants`: qualified and lexical constant lookup
//! - `class_vars`: class variables shared across an ancestor family
//!
//! # Thread Safety
//!
//! `ObjectSpace` is single-threaded: every operation runs to completion before
//! the next starts and there are no suspension points. A multi-threaded host
//! must serialize structural mutations behind one lock.
//!
//! # Example
//!
//! ```
//! use corundum_core::Value;
//! use corundum_registry::{NativeMethod, ObjectSpace};
//!
//! let mut space = ObjectSpace::new();
//! let object = space.builtins().object;
//! let widget = space.define_class(object, "Widget", None).unwrap();
//! space.define_method(widget, "size", NativeMethod::constant(Value::Int(3)));
//!
//! let instance = space.allocate(widget).unwrap();
//! assert_eq!(space.send(&instance, "size", vec![]).unwrap(), Value::Int(3));
//! ```

use std::sync::Arc;

use corundum_core::{
    AncestorEntry, Epoch, EpochCounter, ModelResult, NestingKey, ObjectId, ObjectModelError,
    ProxyId, Stamped, TypeFlags, TypeId, Value, ValueKind,
};
use rustc_hash::FxHashMap;

use crate::config::SpaceConfig;
use crate::method::MethodTable;
use crate::mixin_graph::MixinGraph;
use crate::type_object::{Attached, HeapObject, Proxy, ProxyRole, TypeObject};

/// The types created while booting a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtins {
    /// Universal root class: hosts stubs and the default unknown-message
    /// behaviour.
    pub basic_object: TypeId,
    /// Default superclass and the top-level lexical scope.
    pub object: TypeId,
    /// Class of every module; parent of module singletons.
    pub module: TypeId,
    /// Class of every class; parent of the root class's singleton.
    pub class: TypeId,
    /// Module included into `object`, if configured.
    pub kernel: Option<TypeId>,
}

/// Cache counters, for tests and benchmarks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpaceStats {
    pub ancestor_rebuilds: u64,
    pub dispatch_rebuilds: u64,
    pub constant_hits: u64,
    pub constant_misses: u64,
}

/// Memo of a relative constant lookup. The scope list guards against
/// nesting-key collisions.
#[derive(Debug, Clone)]
pub(crate) struct RelativeMemo {
    pub(crate) scopes: Arc<[TypeId]>,
    pub(crate) memo: Stamped<Option<Value>>,
}

/// The object model: every type, proxy and object plus the caches over them.
pub struct ObjectSpace {
    pub(crate) config: SpaceConfig,
    pub(crate) types: Vec<TypeObject>,
    pub(crate) proxies: Vec<Proxy>,
    pub(crate) objects: Vec<HeapObject>,
    /// Bumped on type creation, mixin operations and constant changes.
    pub(crate) epoch: EpochCounter,
    /// Bumped on every method definition, removal, alias or undef.
    pub(crate) method_serial: EpochCounter,
    pub(crate) mixins: MixinGraph,
    /// Live proxies by the module they mirror, for keeping snapshots in sync.
    pub(crate) proxies_by_source: FxHashMap<TypeId, Vec<ProxyId>>,
    pub(crate) qualified_cache: FxHashMap<(TypeId, Arc<str>), Stamped<Option<Value>>>,
    pub(crate) relative_cache: FxHashMap<(NestingKey, Arc<str>), RelativeMemo>,
    pub(crate) value_classes: FxHashMap<ValueKind, TypeId>,
    pub(crate) builtins: Builtins,
    pub(crate) stats: SpaceStats,
}

impl Default for ObjectSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectSpace {
    /// Boot a space with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SpaceConfig::default())
    }

    /// Boot a space: root class, object class, `Module`, `Class` and the
    /// optional kernel module, all bound as top-level constants.
    pub fn with_config(config: SpaceConfig) -> Self {
        let placeholder = TypeId::new(0);
        let mut space = Self {
            config,
            types: Vec::new(),
            proxies: Vec::new(),
            objects: Vec::new(),
            epoch: EpochCounter::new(),
            method_serial: EpochCounter::new(),
            mixins: MixinGraph::new(),
            proxies_by_source: FxHashMap::default(),
            qualified_cache: FxHashMap::default(),
            relative_cache: FxHashMap::default(),
            value_classes: FxHashMap::default(),
            builtins: Builtins {
                basic_object: placeholder,
                object: placeholder,
                module: placeholder,
                class: placeholder,
                kernel: None,
            },
            stats: SpaceStats::default(),
        };
        space.bootstrap();
        space
    }

    fn bootstrap(&mut self) {
        let boot_class = TypeFlags::CLASS | TypeFlags::BOOT;
        let [basic_object, object, module, class, kernel] = [0, 1, 2, 3, 4].map(TypeId::new);
        self.push_type(basic_object, boot_class, None);
        self.push_type(object, boot_class, Some(basic_object));
        self.push_type(module, boot_class, Some(object));
        self.push_type(class, boot_class, Some(module));
        self.builtins = Builtins {
            basic_object,
            object,
            module,
            class,
            kernel: None,
        };

        let names = [
            (basic_object, self.config.root_name.clone()),
            (object, self.config.object_name.clone()),
            (module, self.config.module_name.clone()),
            (class, self.config.class_name.clone()),
        ];
        for (ty, name) in names {
            self.bind_name(object, &name, ty);
        }

        if let Some(kernel_name) = self.config.kernel_name.clone() {
            self.push_type(kernel, TypeFlags::MODULE | TypeFlags::BOOT, None);
            self.bind_name(object, &kernel_name, kernel);
            // Cannot fail: the proxy arena is empty at boot.
            let attached = self.attach_group(kernel, object, ProxyRole::Included);
            if attached.is_ok() {
                self.builtins.kernel = Some(kernel);
            }
        }

        for kind in ValueKind::IMMEDIATES {
            self.value_classes.insert(kind, object);
        }

        let stubs = self.config.initial_stubs.clone();
        self.add_stubs(&stubs);
        self.epoch.bump();
        tracing::debug!(types = self.types.len(), "object space booted");
    }

    fn bind_name(&mut self, scope: TypeId, name: &str, ty: TypeId) {
        let record = &mut self.types[ty.slot()];
        record.name = Some(Arc::from(name));
        record.lexical_parent = Some(scope);
        self.types[scope.slot()]
            .constants
            .insert(Value::symbol(name), Value::Type(ty));
    }

    // ==========================================================================
    // Arena access
    // ==========================================================================

    pub(crate) fn alloc_type(
        &mut self,
        flags: TypeFlags,
        superclass: Option<TypeId>,
    ) -> ModelResult<TypeId> {
        let id = TypeId::new(next_index(self.types.len(), "types")?);
        self.push_type(id, flags, superclass);
        Ok(id)
    }

    fn push_type(&mut self, id: TypeId, flags: TypeFlags, superclass: Option<TypeId>) {
        debug_assert_eq!(id.slot(), self.types.len());
        self.types.push(TypeObject::new(id, flags, superclass));
    }

    pub(crate) fn alloc_proxy(
        &mut self,
        source: TypeId,
        target: TypeId,
        group: TypeId,
        role: ProxyRole,
        is_root_of_group: bool,
        methods: MethodTable,
    ) -> ModelResult<ProxyId> {
        let id = ProxyId::new(next_index(self.proxies.len(), "proxies")?);
        self.proxies.push(Proxy {
            id,
            source,
            target,
            group,
            role,
            is_root_of_group,
            live: true,
            methods,
        });
        Ok(id)
    }

    /// The type object for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this space.
    pub fn get(&self, id: TypeId) -> &TypeObject {
        &self.types[id.slot()]
    }

    pub fn try_get(&self, id: TypeId) -> Option<&TypeObject> {
        self.types.get(id.slot())
    }

    pub fn proxy(&self, id: ProxyId) -> &Proxy {
        &self.proxies[id.slot()]
    }

    pub fn builtins(&self) -> Builtins {
        self.builtins
    }

    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch.current()
    }

    pub fn stats(&self) -> SpaceStats {
        self.stats
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn is_class(&self, ty: TypeId) -> bool {
        self.types[ty.slot()].is_class()
    }

    pub fn is_module(&self, ty: TypeId) -> bool {
        self.types[ty.slot()].is_module()
    }

    pub fn is_singleton(&self, ty: TypeId) -> bool {
        self.types[ty.slot()].is_singleton()
    }

    /// The superclass link. For a singleton type this is its parent type.
    pub fn superclass_of(&self, ty: TypeId) -> Option<TypeId> {
        self.types[ty.slot()].superclass
    }

    /// The type whose own data an ancestor entry stands for.
    pub(crate) fn entry_owner(&self, entry: AncestorEntry) -> TypeId {
        match entry {
            AncestorEntry::Type(ty) => ty,
            AncestorEntry::Proxy(proxy) => self.proxies[proxy.slot()].source,
        }
    }

    /// The method table an ancestor entry exposes to lookup.
    pub(crate) fn entry_table(&self, entry: AncestorEntry) -> &MethodTable {
        match entry {
            AncestorEntry::Type(ty) => &self.types[ty.slot()].methods,
            AncestorEntry::Proxy(proxy) => &self.proxies[proxy.slot()].methods,
        }
    }

    /// The table method definitions on `ty` write to: the origin proxy for a
    /// prepend shell, otherwise the type's own table.
    pub(crate) fn home_table(&self, ty: TypeId) -> &MethodTable {
        match self.types[ty.slot()].origin {
            Some(origin) => &self.proxies[origin.slot()].methods,
            None => &self.types[ty.slot()].methods,
        }
    }

    pub(crate) fn home_table_mut(&mut self, ty: TypeId) -> &mut MethodTable {
        match self.types[ty.slot()].origin {
            Some(origin) => &mut self.proxies[origin.slot()].methods,
            None => &mut self.types[ty.slot()].methods,
        }
    }

    // ==========================================================================
    // Names
    // ==========================================================================

    /// The qualified name of a type, computed from the scope it was first
    /// bound into.
    ///
    /// Anonymous types render as `#<Class:0x…>` / `#<Module:0x…>` and
    /// singleton types as `#<Class:Owner>`.
    pub fn type_name(&self, ty: TypeId) -> String {
        let record = &self.types[ty.slot()];
        if let Some(attached) = record.attached {
            return format!("#<Class:{}>", self.inspect(&attached.as_value()));
        }
        let Some(name) = &record.name else {
            return anonymous_name(ty, record);
        };

        // Bounded by the arena size; an anonymous scope ends the walk.
        let mut segments = vec![name.to_string()];
        let mut parent = record.lexical_parent;
        while let Some(scope) = parent {
            if scope == self.builtins.object || segments.len() > self.types.len() {
                break;
            }
            let scope_record = &self.types[scope.slot()];
            match &scope_record.name {
                Some(scope_name) => segments.push(scope_name.to_string()),
                None => {
                    segments.push(anonymous_name(scope, scope_record));
                    break;
                }
            }
            parent = scope_record.lexical_parent;
        }
        segments.reverse();
        segments.join("::")
    }

    /// Human-readable rendering of a value for messages.
    pub fn inspect(&self, value: &Value) -> String {
        match value {
            Value::Type(ty) => self.type_name(*ty),
            Value::Object(id) => match self.objects.get(id.slot()) {
                Some(object) => format!("#<{}:{}>", self.type_name(object.class), id),
                None => format!("#<object {id}>"),
            },
            other => other.to_string(),
        }
    }

    /// How a receiver is described in "no method" errors.
    pub(crate) fn describe_receiver(&self, value: &Value) -> String {
        match value {
            Value::Object(id) => match self.objects.get(id.slot()) {
                Some(object) => format!("an instance of {}", self.type_name(object.class)),
                None => self.inspect(value),
            },
            Value::Type(ty) if self.is_module(*ty) => format!("module {}", self.type_name(*ty)),
            Value::Type(ty) => format!("class {}", self.type_name(*ty)),
            other => format!("{} ({})", other, self.type_name(self.class_of(other))),
        }
    }

    // ==========================================================================
    // Objects
    // ==========================================================================

    /// The ordinary type of a value, ignoring any singleton type.
    pub fn class_of(&self, value: &Value) -> TypeId {
        match value {
            Value::Object(id) => self
                .objects
                .get(id.slot())
                .map_or(self.builtins.object, |object| object.class),
            Value::Type(ty) if self.is_module(*ty) => self.builtins.module,
            Value::Type(_) => self.builtins.class,
            other => self
                .value_classes
                .get(&other.kind())
                .copied()
                .unwrap_or(self.builtins.object),
        }
    }

    /// Route immediates of `kind` to `class` for dispatch.
    pub fn bind_value_class(&mut self, kind: ValueKind, class: TypeId) {
        self.value_classes.insert(kind, class);
    }

    /// Identity of a heap object.
    pub fn object_id(&self, value: &Value) -> Option<ObjectId> {
        value.as_object()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// The singleton type already attached to a value, without creating one.
    pub fn existing_singleton(&self, value: &Value) -> Option<TypeId> {
        match value {
            Value::Object(id) => self.objects.get(id.slot())?.singleton,
            Value::Type(ty) => self.types.get(ty.slot())?.singleton,
            _ => None,
        }
    }

    /// What a singleton type is attached to.
    pub fn attached_to(&self, ty: TypeId) -> Option<Attached> {
        self.types[ty.slot()].attached
    }

    /// Instance variable, `nil` when unset or when the value has no heap slot.
    pub fn ivar_get(&self, value: &Value, name: &str) -> Value {
        value
            .as_object()
            .and_then(|id| self.objects.get(id.slot()))
            .and_then(|object| object.ivars.get(&Value::symbol(name)).cloned())
            .unwrap_or_default()
    }

    pub fn ivar_set(&mut self, value: &Value, name: &str, new_value: Value) -> ModelResult<()> {
        let Some(object) = value
            .as_object()
            .and_then(|id| self.objects.get_mut(id.slot()))
        else {
            return Err(ObjectModelError::raise(format!(
                "can't modify instance variables of {value}"
            )));
        };
        object.ivars.insert(Value::symbol(name), new_value);
        Ok(())
    }

    /// Names of the instance variables set on an object, in assignment order.
    pub fn ivar_names(&self, value: &Value) -> Vec<String> {
        value
            .as_object()
            .and_then(|id| self.objects.get(id.slot()))
            .map(|object| {
                object
                    .ivars
                    .keys()
                    .filter_map(|key| key.as_symbol().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn anonymous_name(ty: TypeId, record: &TypeObject) -> String {
    if record.is_module() {
        format!("#<Module:0x{:08x}>", ty.index())
    } else {
        format!("#<Class:0x{:08x}>", ty.index())
    }
}

/// The index the next entry of an arena holding `len` entries will take.
pub(crate) fn next_index(len: usize, arena: &'static str) -> ModelResult<u32> {
    u32::try_from(len).map_err(|_| ObjectModelError::ArenaExhausted { arena })
}

impl std::fmt::Debug for ObjectSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectSpace")
            .field("types", &self.types.len())
            .field("proxies", &self.proxies.len())
            .field("objects", &self.objects.len())
            .field("epoch", &self.epoch.current())
            .finish()
    }
}
