//! Constant resolution through lexical nesting and ancestor chains.
//!
//! Both lookup paths memoize their outcome, hits and confirmed misses alike,
//! against the structural epoch. Defining or removing a constant bumps the
//! epoch, so a stale memo is never served.
//!
//! Relative lookup order for a nesting `[innermost, ..., outermost]`:
//!
//! 1. the innermost scope's own constants
//! 2. the own constants of each enclosing scope, inner to outer
//! 3. the ancestors of the innermost scope
//! 4. the ancestors of the object class, when the innermost scope is a module

use std::sync::Arc;

use corundum_core::{LookupError, ModelResult, NestingKey, Stamped, TypeId, Value};

use crate::ObjectSpace;
use crate::space::RelativeMemo;

/// Hook sent to a scope when a constant lookup misses.
pub const CONST_MISSING: &str = "const_missing";

/// Lexical nesting context, innermost scope first.
///
/// Cheap to clone; carries the hash key used to memoize relative lookups.
///
/// ```
/// use corundum_core::TypeId;
/// use corundum_registry::Nesting;
///
/// let outer = TypeId::new(10);
/// let inner = TypeId::new(11);
/// let nesting = Nesting::top_level().enter(outer).enter(inner);
/// assert_eq!(nesting.scopes(), &[inner, outer]);
/// assert_eq!(nesting.innermost(), Some(inner));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nesting {
    scopes: Arc<[TypeId]>,
    key: NestingKey,
}

impl Nesting {
    /// A nesting from scopes listed innermost first.
    pub fn new(scopes: impl IntoIterator<Item = TypeId>) -> Self {
        let scopes: Arc<[TypeId]> = scopes.into_iter().collect();
        let key = NestingKey::from_scopes(&scopes);
        Self { scopes, key }
    }

    /// The top-level nesting, which resolves as if inside the object class.
    pub fn top_level() -> Self {
        Self::new([])
    }

    /// A nesting one level deeper, with `scope` as the new innermost scope.
    pub fn enter(&self, scope: TypeId) -> Self {
        Self::new(std::iter::once(scope).chain(self.scopes.iter().copied()))
    }

    pub fn scopes(&self) -> &[TypeId] {
        &self.scopes
    }

    pub fn innermost(&self) -> Option<TypeId> {
        self.scopes.first().copied()
    }

    pub fn key(&self) -> NestingKey {
        self.key
    }

    pub fn is_top_level(&self) -> bool {
        self.scopes.is_empty()
    }
}

/// Constant names start with an ASCII capital and continue with
/// alphanumerics or underscores.
pub(crate) fn validate_constant_name(name: &str) -> ModelResult<()> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(LookupError::InvalidConstantName {
            name: name.to_string(),
        }
        .into())
    }
}

impl ObjectSpace {
    /// Look `name` up in `ty` and then in `ty`'s ancestors.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve_qualified(&mut self, ty: TypeId, name: &str) -> Option<Value> {
        let epoch = self.epoch.current();
        let key = (ty, Arc::<str>::from(name));
        if let Some(memo) = self.qualified_cache.get(&key) {
            if let Some(value) = memo.get_if_current(epoch) {
                self.stats.constant_hits += 1;
                return value.clone();
            }
        }

        self.stats.constant_misses += 1;
        let found = match self.own_constant(ty, name) {
            Some(value) => Some(value),
            None => self.constant_in_ancestors(ty, name),
        };
        self.qualified_cache
            .insert(key, Stamped::new(epoch, found.clone()));
        found
    }

    /// Look `name` up lexically from `nesting`. See the module docs for the
    /// search order.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve_relative(&mut self, nesting: &Nesting, name: &str) -> Option<Value> {
        let epoch = self.epoch.current();
        let scopes: Arc<[TypeId]> = if nesting.is_top_level() {
            Arc::from([self.builtins.object])
        } else {
            Arc::clone(&nesting.scopes)
        };

        let key = (nesting.key(), Arc::<str>::from(name));
        if let Some(entry) = self.relative_cache.get(&key) {
            if entry.scopes == scopes {
                if let Some(value) = entry.memo.get_if_current(epoch) {
                    self.stats.constant_hits += 1;
                    return value.clone();
                }
            }
        }

        self.stats.constant_misses += 1;
        let found = self.search_lexical(&scopes, name);
        self.relative_cache.insert(
            key,
            RelativeMemo {
                scopes,
                memo: Stamped::new(epoch, found.clone()),
            },
        );
        found
    }

    fn search_lexical(&mut self, scopes: &[TypeId], name: &str) -> Option<Value> {
        let innermost = *scopes.first()?;
        for &scope in scopes {
            if let Some(value) = self.own_constant(scope, name) {
                return Some(value);
            }
        }
        if let Some(value) = self.constant_in_ancestors(innermost, name) {
            return Some(value);
        }
        if self.is_module(innermost) {
            let object = self.builtins.object;
            return self.constant_in_ancestors(object, name);
        }
        None
    }

    /// Qualified lookup that falls back to `const_missing(:name)` on `ty` and
    /// then fails with an uninitialized-constant error.
    pub fn const_get(&mut self, ty: TypeId, name: &str) -> ModelResult<Value> {
        validate_constant_name(name)?;
        if let Some(value) = self.resolve_qualified(ty, name) {
            return Ok(value);
        }
        self.constant_missing(ty, name)
    }

    /// Relative lookup that falls back to `const_missing(:name)` on the
    /// innermost scope and then fails with an uninitialized-constant error.
    pub fn const_lookup(&mut self, nesting: &Nesting, name: &str) -> ModelResult<Value> {
        validate_constant_name(name)?;
        if let Some(value) = self.resolve_relative(nesting, name) {
            return Ok(value);
        }
        let scope = nesting.innermost().unwrap_or(self.builtins.object);
        self.constant_missing(scope, name)
    }

    fn constant_missing(&mut self, scope: TypeId, name: &str) -> ModelResult<Value> {
        let receiver = Value::Type(scope);
        if self.respond_to(&receiver, CONST_MISSING) {
            tracing::trace!(scope = %self.type_name(scope), name, "constant missing hook");
            return self.send(&receiver, CONST_MISSING, vec![Value::symbol(name)]);
        }
        Err(self.uninitialized_constant(scope, name).into())
    }

    /// Bind constant `name` in `ty`. An anonymous type bound this way takes
    /// the name.
    pub fn const_set(&mut self, ty: TypeId, name: &str, value: Value) -> ModelResult<()> {
        validate_constant_name(name)?;
        self.bind_constant(ty, name, value);
        self.epoch.bump();
        tracing::debug!(scope = %self.type_name(ty), name, "set constant");
        Ok(())
    }

    /// Remove `ty`'s own binding of `name`, returning its value.
    pub fn const_remove(&mut self, ty: TypeId, name: &str) -> ModelResult<Value> {
        validate_constant_name(name)?;
        let removed = self.types[ty.slot()]
            .constants
            .remove(&Value::symbol(name));
        match removed {
            Some(value) => {
                self.epoch.bump();
                tracing::debug!(scope = %self.type_name(ty), name, "removed constant");
                Ok(value)
            }
            None => Err(self.uninitialized_constant(ty, name).into()),
        }
    }

    /// Whether qualified lookup of `name` from `ty` succeeds, without hooks.
    pub fn const_defined(&mut self, ty: TypeId, name: &str) -> bool {
        self.resolve_qualified(ty, name).is_some()
    }

    /// Names of `ty`'s own constants in definition order.
    pub fn constants(&self, ty: TypeId) -> Vec<String> {
        self.types[ty.slot()]
            .constants
            .keys()
            .filter_map(|key| key.as_symbol().map(str::to_string))
            .collect()
    }

    pub(crate) fn own_constant(&self, ty: TypeId, name: &str) -> Option<Value> {
        self.types[ty.slot()]
            .constants
            .get(&Value::symbol(name))
            .cloned()
    }

    fn constant_in_ancestors(&mut self, ty: TypeId, name: &str) -> Option<Value> {
        let chain = self.ancestors(ty);
        chain
            .iter()
            .find_map(|&entry| self.own_constant(self.entry_owner(entry), name))
    }
}
