//! Singleton types: per-object and per-type method overrides.
//!
//! A singleton type is created on first request and then reused for the
//! lifetime of its owner. Its superclass link places it between the owner and
//! the owner's former type:
//!
//! - object: parent is the object's class
//! - class: parent is the superclass's singleton (built on demand), or the
//!   `Class` builtin for the root class
//! - module: parent is the `Module` builtin

use corundum_core::{ModelResult, TopologyError, TypeFlags, TypeId, Value};

use crate::ObjectSpace;
use crate::type_object::Attached;

impl ObjectSpace {
    /// The singleton type of `value`, creating it if needed.
    ///
    /// Immediate values have no identity and are rejected.
    pub fn singleton_of(&mut self, value: &Value) -> ModelResult<TypeId> {
        match value {
            Value::Type(owner) => self.type_singleton(*owner),
            Value::Object(id) => {
                let Some(object) = self.objects.get(id.slot()) else {
                    return Err(TopologyError::NoSingleton {
                        value: self.inspect(value),
                    }
                    .into());
                };
                if let Some(existing) = object.singleton {
                    return Ok(existing);
                }
                let parent = object.class;
                let singleton = self.alloc_singleton(parent, Attached::Object(*id))?;
                self.objects[id.slot()].singleton = Some(singleton);
                tracing::debug!(owner = %self.inspect(value), "created object singleton");
                Ok(singleton)
            }
            other => Err(TopologyError::NoSingleton {
                value: self.inspect(other),
            }
            .into()),
        }
    }

    fn type_singleton(&mut self, owner: TypeId) -> ModelResult<TypeId> {
        if let Some(existing) = self.types[owner.slot()].singleton {
            return Ok(existing);
        }

        let parent = if self.is_module(owner) {
            self.builtins.module
        } else {
            match self.superclass_of(owner) {
                Some(superclass) => self.type_singleton(superclass)?,
                None => self.builtins.class,
            }
        };

        let singleton = self.alloc_singleton(parent, Attached::Type(owner))?;
        self.types[owner.slot()].singleton = Some(singleton);
        tracing::debug!(
            owner = %self.type_name(owner),
            parent = %self.type_name(parent),
            "created type singleton"
        );
        Ok(singleton)
    }

    fn alloc_singleton(&mut self, parent: TypeId, attached: Attached) -> ModelResult<TypeId> {
        let singleton = self.alloc_type(TypeFlags::SINGLETON, Some(parent))?;
        self.types[singleton.slot()].attached = Some(attached);
        self.epoch.bump();
        Ok(singleton)
    }
}
