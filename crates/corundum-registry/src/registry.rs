//! Type registry: defining, reopening and allocating classes and modules.
//!
//! A class or module is created once per `(scope, name)` pair. Reopening an
//! existing binding returns the same type, provided the kind and (for
//! classes) the superclass agree with the request.

use std::sync::Arc;

use corundum_core::{
    LookupError, ModelResult, ObjectId, QualifiedName, TopologyError, TypeFlags, TypeId, Value,
};

use crate::ObjectSpace;
use crate::constants::validate_constant_name;
use crate::space::next_index;
use crate::type_object::HeapObject;

impl ObjectSpace {
    /// Define or reopen class `name` in `scope`.
    ///
    /// Without a superclass a new class inherits from the object class, and
    /// an existing class is reopened whatever its superclass. With one, an
    /// existing class must already have exactly that superclass.
    ///
    /// A new class triggers `inherited(new_class)` on the superclass when the
    /// superclass responds to it.
    pub fn define_class(
        &mut self,
        scope: TypeId,
        name: &str,
        superclass: Option<TypeId>,
    ) -> ModelResult<TypeId> {
        validate_constant_name(name)?;

        if let Some(existing) = self.own_constant(scope, name) {
            let ty = match existing {
                Value::Type(ty) if self.is_class(ty) => ty,
                _ => {
                    return Err(TopologyError::KindMismatch {
                        name: self.qualified_constant_name(scope, name),
                        expected: "class",
                    }
                    .into());
                }
            };
            if superclass.is_some_and(|requested| self.superclass_of(ty) != Some(requested)) {
                return Err(TopologyError::SuperclassMismatch {
                    name: self.type_name(ty),
                }
                .into());
            }
            self.epoch.bump();
            return Ok(ty);
        }

        let parent = superclass.unwrap_or(self.builtins.object);
        self.check_subclassable(parent)?;

        let ty = self.alloc_type(TypeFlags::CLASS, Some(parent))?;
        self.bind_constant(scope, name, Value::Type(ty));
        self.epoch.bump();
        tracing::debug!(
            class = %self.type_name(ty),
            superclass = %self.type_name(parent),
            "defined class"
        );

        self.fire_hook(&Value::Type(parent), "inherited", vec![Value::Type(ty)])?;
        Ok(ty)
    }

    /// Define or reopen module `name` in `scope`.
    pub fn define_module(&mut self, scope: TypeId, name: &str) -> ModelResult<TypeId> {
        validate_constant_name(name)?;

        if let Some(existing) = self.own_constant(scope, name) {
            return match existing {
                Value::Type(ty) if self.is_module(ty) => {
                    self.epoch.bump();
                    Ok(ty)
                }
                _ => Err(TopologyError::KindMismatch {
                    name: self.qualified_constant_name(scope, name),
                    expected: "module",
                }
                .into()),
            };
        }

        let ty = self.alloc_type(TypeFlags::MODULE, None)?;
        self.bind_constant(scope, name, Value::Type(ty));
        self.epoch.bump();
        tracing::debug!(module = %self.type_name(ty), "defined module");
        Ok(ty)
    }

    /// Create an anonymous class. It is named when first bound to a constant.
    pub fn new_class(&mut self, superclass: Option<TypeId>) -> ModelResult<TypeId> {
        let parent = superclass.unwrap_or(self.builtins.object);
        self.check_subclassable(parent)?;

        let ty = self.alloc_type(TypeFlags::CLASS, Some(parent))?;
        self.epoch.bump();
        tracing::debug!(
            class = %ty,
            superclass = %self.type_name(parent),
            "created anonymous class"
        );

        self.fire_hook(&Value::Type(parent), "inherited", vec![Value::Type(ty)])?;
        Ok(ty)
    }

    /// Create an anonymous module.
    pub fn new_module(&mut self) -> ModelResult<TypeId> {
        let ty = self.alloc_type(TypeFlags::MODULE, None)?;
        self.epoch.bump();
        tracing::debug!(module = %ty, "created anonymous module");
        Ok(ty)
    }

    /// Allocate an instance of a class.
    pub fn allocate(&mut self, class: TypeId) -> ModelResult<Value> {
        if !self.is_class(class) {
            return Err(TopologyError::NotInstantiable {
                name: self.type_name(class),
            }
            .into());
        }
        let id = ObjectId::new(next_index(self.objects.len(), "objects")?);
        self.objects.push(HeapObject::new(class));
        Ok(Value::Object(id))
    }

    /// Allocate an instance and send it `initialize(*args)` when it responds.
    pub fn instantiate(&mut self, class: TypeId, args: Vec<Value>) -> ModelResult<Value> {
        let instance = self.allocate(class)?;
        if self.respond_to(&instance, "initialize") {
            self.send(&instance, "initialize", args)?;
        }
        Ok(instance)
    }

    /// Look up a `::`-separated constant path from the top-level scope.
    pub fn lookup_path(&mut self, path: &str) -> ModelResult<Value> {
        let name = QualifiedName::parse(path);
        let mut current = Value::Type(self.builtins.object);
        for segment in name.segments() {
            let Value::Type(scope) = current else {
                return Err(TopologyError::KindMismatch {
                    name: self.inspect(&current),
                    expected: "class/module",
                }
                .into());
            };
            current = self.const_get(scope, segment)?;
        }
        Ok(current)
    }

    /// Like [`lookup_path`](Self::lookup_path), but the path must name a type.
    pub fn lookup_type(&mut self, path: &str) -> ModelResult<TypeId> {
        match self.lookup_path(path)? {
            Value::Type(ty) => Ok(ty),
            other => Err(TopologyError::KindMismatch {
                name: format!("{path} ({})", self.inspect(&other)),
                expected: "class/module",
            }
            .into()),
        }
    }

    fn check_subclassable(&self, parent: TypeId) -> ModelResult<()> {
        let record = self.get(parent);
        let reason = if record.is_module() {
            Some("superclass must be a class")
        } else if record.is_singleton() {
            Some("can't make subclass of singleton class")
        } else if parent == self.builtins.class {
            Some("can't make subclass of Class")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(TopologyError::InvalidSuperclass {
                name: self.type_name(parent),
                reason,
            }
            .into()),
            None => Ok(()),
        }
    }

    /// Bind a constant without validation or epoch bump.
    ///
    /// An anonymous type takes its name from its first binding, unless the
    /// scope is the type itself or lies lexically inside it.
    pub(crate) fn bind_constant(&mut self, scope: TypeId, name: &str, value: Value) {
        if let Value::Type(ty) = value {
            let record = &self.types[ty.slot()];
            if record.name.is_none()
                && !record.is_singleton()
                && !self.lexically_encloses(ty, scope)
            {
                let record = &mut self.types[ty.slot()];
                record.name = Some(Arc::from(name));
                record.lexical_parent = Some(scope);
            }
        }
        self.types[scope.slot()]
            .constants
            .insert(Value::symbol(name), value);
    }

    /// Whether `ty` is `scope` or one of its lexical parents.
    fn lexically_encloses(&self, ty: TypeId, scope: TypeId) -> bool {
        let mut current = scope;
        for _ in 0..self.types.len() {
            if current == ty {
                return true;
            }
            match self.types[current.slot()].lexical_parent {
                Some(parent) if current != self.builtins.object => current = parent,
                _ => return false,
            }
        }
        false
    }

    /// Send `hook(*args)` to `receiver` if it responds to `hook`.
    pub(crate) fn fire_hook(
        &mut self,
        receiver: &Value,
        hook: &str,
        args: Vec<Value>,
    ) -> ModelResult<()> {
        if self.respond_to(receiver, hook) {
            tracing::trace!(hook, receiver = %self.inspect(receiver), "firing hook");
            self.send(receiver, hook, args)?;
        }
        Ok(())
    }

    /// `Scope::Name`, or just `Name` at top level.
    pub(crate) fn qualified_constant_name(&self, scope: TypeId, name: &str) -> String {
        if scope == self.builtins.object {
            name.to_string()
        } else {
            format!("{}::{}", self.type_name(scope), name)
        }
    }

    pub(crate) fn uninitialized_constant(&self, scope: TypeId, name: &str) -> LookupError {
        LookupError::UninitializedConstant {
            name: self.qualified_constant_name(scope, name),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use corundum_core::{ObjectModelError, TopologyError};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::NativeMethod;

    #[test]
    fn define_class_defaults_to_object() {
        let mut space = ObjectSpace::new();
        let object = space.builtins().object;
        let widget = space.define_class(object, "Widget", None).unwrap();

        assert_eq!(space.superclass_of(widget), Some(object));
        assert_eq!(space.type_name(widget), "Widget");
        assert_eq!(
            space.const_get(object, "Widget").unwrap(),
            Value::Type(widget)
        );
    }

    #[test]
    fn reopen_returns_same_class() {
        let mut space = ObjectSpace::new();
        let object = space.builtins().object;
        let base = space.define_class(object, "Base", None).unwrap();
        let widget = space.define_class(object, "Widget", Some(base)).unwrap();

        assert_eq!(space.define_class(object, "Widget", None).unwrap(), widget);
        assert_eq!(
            space.define_class(object, "Widget", Some(base)).unwrap(),
            widget
        );
    }

    #[test]
    fn superclass_mismatch() {
        let mut space = ObjectSpace::new();
        let object = space.builtins().object;
        let base = space.define_class(object, "Base", None).unwrap();
        space.define_class(object, "Widget", Some(base)).unwrap();

        let err = space
            .define_class(object, "Widget", Some(object))
            .unwrap_err();
        assert_eq!(
            err,
            ObjectModelError::Topology(TopologyError::SuperclassMismatch {
                name: "Widget".into(),
            })
        );
        assert_eq!(err.to_string(), "superclass mismatch for class Widget");
    }

    #[test]
    fn kind_mismatch_both_ways() {
        let mut space = ObjectSpace::new();
        let object = space.builtins().object;
        space.define_module(object, "Tool").unwrap();
        space.define_class(object, "Widget", None).unwrap();
        space.const_set(object, "Limit", Value::Int(3)).unwrap();

        let err = space.define_class(object, "Tool", None).unwrap_err();
        assert_eq!(err.to_string(), "Tool is not a class");
        let err = space.define_module(object, "Widget").unwrap_err();
        assert_eq!(err.to_string(), "Widget is not a module");
        let err = space.define_module(object, "Limit").unwrap_err();
        assert!(err.is_topology());
    }

    #[test]
    fn nested_names() {
        let mut space = ObjectSpace::new();
        let object = space.builtins().object;
        let ui = space.define_module(object, "Ui").unwrap();
        let widget = space.define_class(ui, "Widget", None).unwrap();

        assert_eq!(space.type_name(widget), "Ui::Widget");
        assert_eq!(space.lookup_type("Ui::Widget").unwrap(), widget);
        assert_eq!(space.lookup_path("::Ui").unwrap(), Value::Type(ui));
        assert!(space.lookup_path("Ui::Missing").is_err());
    }

    #[test]
    fn invalid_superclasses() {
        let mut space = ObjectSpace::new();
        let b = space.builtins();
        let tool = space.define_module(b.object, "Tool").unwrap();

        assert!(space.define_class(b.object, "A", Some(tool)).is_err());
        assert!(space.define_class(b.object, "B", Some(b.class)).is_err());

        let singleton = space.singleton_of(&Value::Type(b.object)).unwrap();
        let err = space.new_class(Some(singleton)).unwrap_err();
        assert!(matches!(
            err,
            ObjectModelError::Topology(TopologyError::InvalidSuperclass { .. })
        ));
    }

    #[test]
    fn anonymous_types_are_named_on_first_binding() {
        let mut space = ObjectSpace::new();
        let object = space.builtins().object;
        let ui = space.define_module(object, "Ui").unwrap();
        let anon = space.new_class(None).unwrap();
        assert!(space.type_name(anon).starts_with("#<Class:0x"));

        space.const_set(ui, "Button", Value::Type(anon)).unwrap();
        space.const_set(object, "Alias", Value::Type(anon)).unwrap();
        assert_eq!(space.type_name(anon), "Ui::Button");

        let module = space.new_module().unwrap();
        assert!(space.type_name(module).starts_with("#<Module:0x"));
    }

    #[test]
    fn anonymous_types_bound_into_each_other_keep_finite_names() {
        let mut space = ObjectSpace::new();
        let root = space.builtins().object;
        let outer = space.new_module().unwrap();
        let inner = space.new_module().unwrap();

        space.const_set(outer, "Inner", Value::Type(inner)).unwrap();
        space.const_set(inner, "Outer", Value::Type(outer)).unwrap();
        let anonymous = space.type_name(outer);
        assert!(anonymous.starts_with("#<Module:0x"));
        assert_eq!(space.type_name(inner), format!("{anonymous}::Inner"));
        assert_eq!(space.const_get(inner, "Outer").unwrap(), Value::Type(outer));

        space.const_set(root, "Outer", Value::Type(outer)).unwrap();
        assert_eq!(space.type_name(outer), "Outer");
        assert_eq!(space.inspect(&Value::Type(inner)), "Outer::Inner");
    }

    #[test]
    fn type_is_not_named_after_its_own_member() {
        let mut space = ObjectSpace::new();
        let host = space.new_module().unwrap();
        let widget = space.define_class(host, "Widget", None).unwrap();

        space.const_set(widget, "Host", Value::Type(host)).unwrap();
        space.const_set(host, "Again", Value::Type(host)).unwrap();
        assert!(space.type_name(host).starts_with("#<Module:0x"));
        assert!(space.type_name(widget).ends_with(">::Widget"));
    }

    #[test]
    fn inherited_hook_runs_for_new_classes_only() {
        let mut space = ObjectSpace::new();
        let object = space.builtins().object;
        let base = space.define_class(object, "Base", None).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        space
            .define_singleton_method(
                &Value::Type(base),
                "inherited",
                NativeMethod::with_arity(1, move |space, inv| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let child = inv.expect_arg(0)?.as_type().unwrap();
                    assert_eq!(space.superclass_of(child), inv.receiver.as_type());
                    Ok(Value::Nil)
                }),
            )
            .unwrap();

        space.define_class(object, "Widget", Some(base)).unwrap();
        space.define_class(object, "Widget", Some(base)).unwrap();
        space.new_class(Some(base)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn modules_and_singletons_are_not_instantiable() {
        let mut space = ObjectSpace::new();
        let object = space.builtins().object;
        let tool = space.define_module(object, "Tool").unwrap();
        assert!(space.allocate(tool).is_err());

        let singleton = space.singleton_of(&Value::Type(object)).unwrap();
        assert_eq!(
            space.allocate(singleton).unwrap_err().to_string(),
            "can't allocate instances of #<Class:Object>"
        );
    }

    #[test]
    fn instantiate_runs_initialize() {
        let mut space = ObjectSpace::new();
        let object = space.builtins().object;
        let point = space.define_class(object, "Point", None).unwrap();
        space.define_method(
            point,
            "initialize",
            NativeMethod::with_arity(1, |space, inv| {
                let x = inv.expect_arg(0)?.clone();
                space.ivar_set(&inv.receiver, "@x", x)?;
                Ok(Value::Nil)
            }),
        );

        let p = space.instantiate(point, vec![Value::Int(7)]).unwrap();
        assert_eq!(space.ivar_get(&p, "@x"), Value::Int(7));
        assert!(space.instantiate(point, vec![]).is_err());
    }

    #[test]
    fn definitions_bump_epoch() {
        let mut space = ObjectSpace::new();
        let object = space.builtins().object;
        let before = space.epoch();
        space.define_module(object, "Tool").unwrap();
        assert!(space.epoch() > before);
    }

    #[test]
    fn constant_names_are_validated() {
        let mut space = ObjectSpace::new();
        let object = space.builtins().object;
        assert!(space.define_class(object, "widget", None).is_err());
        assert!(space.define_module(object, "").is_err());
    }
}
