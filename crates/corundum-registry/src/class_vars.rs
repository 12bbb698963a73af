//! Class variables shared along the ancestor chain.
//!
//! A binding lives on exactly one type. Writes from a descendant update the
//! ancestor's binding in place, so every type below it observes the change.

use corundum_core::{LookupError, ModelResult, TypeId, Value};

use crate::ObjectSpace;
use crate::type_object::Attached;

fn validate_cvar_name(name: &str) -> ModelResult<()> {
    let valid = name.strip_prefix("@@").is_some_and(|rest| {
        let mut chars = rest.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    });
    if valid {
        Ok(())
    } else {
        Err(LookupError::InvalidClassVariableName {
            name: name.to_string(),
        }
        .into())
    }
}

impl ObjectSpace {
    /// Read `name` from `ty` or the nearest ancestor that binds it.
    pub fn cvar_get(&mut self, ty: TypeId, name: &str) -> ModelResult<Value> {
        validate_cvar_name(name)?;
        let home = self.cvar_scope(ty);
        match self.cvar_owner(home, name, true) {
            Some(owner) => Ok(self.types[owner.slot()]
                .class_variables
                .get(&Value::symbol(name))
                .cloned()
                .unwrap_or_default()),
            None => Err(LookupError::UninitializedClassVariable {
                name: name.to_string(),
                owner: self.type_name(home),
            }
            .into()),
        }
    }

    /// Write `name`. An existing binding on an ancestor is updated in place;
    /// otherwise the binding is created on `ty`.
    pub fn cvar_set(&mut self, ty: TypeId, name: &str, value: Value) -> ModelResult<()> {
        validate_cvar_name(name)?;
        let home = self.cvar_scope(ty);
        let owner = self.cvar_owner(home, name, false).unwrap_or(home);
        tracing::trace!(
            name,
            owner = %self.type_name(owner),
            "set class variable"
        );
        self.types[owner.slot()]
            .class_variables
            .insert(Value::symbol(name), value);
        Ok(())
    }

    pub fn cvar_defined(&mut self, ty: TypeId, name: &str) -> bool {
        if validate_cvar_name(name).is_err() {
            return false;
        }
        let home = self.cvar_scope(ty);
        self.cvar_owner(home, name, true).is_some()
    }

    /// Names bound directly on `ty`, in definition order.
    pub fn class_variables(&self, ty: TypeId) -> Vec<String> {
        self.types[ty.slot()]
            .class_variables
            .keys()
            .filter_map(|key| key.as_symbol().map(str::to_string))
            .collect()
    }

    /// Singleton types of classes and modules share their owner's variables.
    fn cvar_scope(&self, ty: TypeId) -> TypeId {
        match self.types[ty.slot()].attached {
            Some(Attached::Type(owner)) => owner,
            _ => ty,
        }
    }

    fn cvar_owner(&mut self, ty: TypeId, name: &str, include_self: bool) -> Option<TypeId> {
        let key = Value::symbol(name);
        let chain = self.ancestors(ty);
        chain
            .iter()
            .map(|&entry| self.entry_owner(entry))
            .filter(|&owner| include_self || owner != ty)
            .find(|&owner| self.has_own_cvar(owner, &key))
    }

    fn has_own_cvar(&self, ty: TypeId, key: &Value) -> bool {
        self.types[ty.slot()].class_variables.contains_key(key)
    }
}
