//! Message dispatch, `super` resolution and method table maintenance.
//!
//! Ordinary sends look the selector up in a per-type dispatch table folded
//! from the ancestor chain (nearest entry wins, stubs never shadow real
//! definitions). The table is rebuilt lazily when either the structural epoch
//! or the method serial moved since it was folded.
//!
//! `super` walks the receiver's chain directly: it starts just after the
//! entry that owns the running method and takes the first real definition.

use std::collections::hash_map::Entry;
use std::sync::Arc;

use corundum_core::{Epoch, LookupError, ModelResult, ObjectModelError, TypeId, Value};

use crate::ObjectSpace;
use crate::method::{Invocation, MethodRecord, MethodTable, NativeMethod};
use crate::type_object::DispatchCache;

/// Selector of the unknown-message hook.
pub const METHOD_MISSING: &str = "method_missing";

impl ObjectSpace {
    /// The type a send to `receiver` starts from: its singleton type if it
    /// has one, otherwise its ordinary type.
    ///
    /// A class without a singleton of its own dispatches through the nearest
    /// superclass singleton, which is where its singleton would delegate.
    pub fn effective_type(&self, receiver: &Value) -> TypeId {
        if let Some(singleton) = self.existing_singleton(receiver) {
            return singleton;
        }
        if let Value::Type(ty) = receiver {
            if self.is_class(*ty) {
                let mut current = self.superclass_of(*ty);
                while let Some(ancestor) = current {
                    if let Some(singleton) = self.types[ancestor.slot()].singleton {
                        return singleton;
                    }
                    current = self.superclass_of(ancestor);
                }
            }
        }
        self.class_of(receiver)
    }

    /// The folded selector table of `ty`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn method_table(&mut self, ty: TypeId) -> Arc<MethodTable> {
        let epoch = self.epoch.current();
        let serial = self.method_serial.current();
        if let Some(cache) = &self.types[ty.slot()].dispatch_cache {
            if cache.epoch == epoch && cache.serial == serial {
                return Arc::clone(&cache.table);
            }
        }

        let chain = self.ancestors(ty);
        let mut table = MethodTable::default();
        for &entry in chain.iter() {
            for (selector, record) in self.entry_table(entry) {
                match table.entry(Arc::clone(selector)) {
                    Entry::Vacant(slot) => {
                        slot.insert(record.clone());
                    }
                    Entry::Occupied(mut slot) => {
                        if slot.get().is_stub() && !record.is_stub() {
                            slot.insert(record.clone());
                        }
                    }
                }
            }
        }

        let table = Arc::new(table);
        self.types[ty.slot()].dispatch_cache = Some(DispatchCache {
            epoch,
            serial,
            table: Arc::clone(&table),
        });
        self.stats.dispatch_rebuilds += 1;
        tracing::trace!(ty = %ty, selectors = table.len(), "rebuilt dispatch table");
        table
    }

    /// The record a send of `selector` to an instance of `ty` would use.
    ///
    /// May return a stub or an undefined marker; callers decide how to treat
    /// them.
    pub fn find_method(&mut self, ty: TypeId, selector: &str) -> Option<MethodRecord> {
        if self.config.dispatch_tables {
            return self.method_table(ty).get(selector).cloned();
        }

        let chain = self.ancestors(ty);
        let mut stub = None;
        for &entry in chain.iter() {
            if let Some(record) = self.entry_table(entry).get(selector) {
                if !record.is_stub() {
                    return Some(record.clone());
                }
                stub.get_or_insert_with(|| record.clone());
            }
        }
        stub
    }

    /// Whether a send of `selector` to `receiver` reaches a real body. Stubs
    /// and undefined markers count as absent.
    pub fn respond_to(&mut self, receiver: &Value, selector: &str) -> bool {
        let ty = self.effective_type(receiver);
        self.find_method(ty, selector)
            .is_some_and(|record| record.is_callable())
    }

    /// Sorted names of every selector instances of `ty` respond to.
    pub fn instance_method_names(&mut self, ty: TypeId) -> Vec<String> {
        let mut names: Vec<String> = self
            .method_table(ty)
            .iter()
            .filter(|(_, record)| record.is_callable())
            .map(|(selector, _)| selector.to_string())
            .collect();
        names.sort();
        names
    }

    /// Selectors defined directly on `ty` with a real body, sorted.
    pub fn own_method_names(&self, ty: TypeId) -> Vec<String> {
        let mut names: Vec<String> = self
            .home_table(ty)
            .iter()
            .filter(|(_, record)| record.is_callable())
            .map(|(selector, _)| selector.to_string())
            .collect();
        names.sort();
        names
    }

    /// Send `selector` to `receiver`.
    ///
    /// Stubs, undefined methods and absent selectors are forwarded to
    /// `method_missing(:selector, *args)` when the receiver defines it;
    /// otherwise the send fails with a no-method error.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn send(
        &mut self,
        receiver: &Value,
        selector: &str,
        args: Vec<Value>,
    ) -> ModelResult<Value> {
        let ty = self.effective_type(receiver);
        match self.find_method(ty, selector) {
            Some(record) if record.is_callable() => {
                self.invoke(&record, receiver.clone(), Arc::from(selector), args, None)
            }
            _ => self.unknown_message(ty, receiver, selector, args, false),
        }
    }

    /// Continue the running method with the next implementation in the
    /// receiver's chain, passing `args`.
    pub fn call_super(&mut self, invocation: &Invocation, args: Vec<Value>) -> ModelResult<Value> {
        let ty = self.effective_type(&invocation.receiver);
        let start = match invocation.chain_index {
            Some((epoch, index)) if epoch == self.epoch.current() => Some(index),
            _ => self.owner_index(ty, invocation.owner),
        };
        match self.next_after(ty, start, &invocation.method_name) {
            Some((index, record)) => {
                let resumed_at = Some((self.epoch.current(), index));
                self.invoke(
                    &record,
                    invocation.receiver.clone(),
                    Arc::clone(&invocation.method_name),
                    args,
                    resumed_at,
                )
            }
            None => {
                let receiver = &invocation.receiver;
                self.unknown_message(ty, receiver, &invocation.method_name, args, true)
            }
        }
    }

    /// The next real definition of `selector` after `current_owner` in the
    /// chain of `receiver`'s effective type.
    ///
    /// Returns `Ok(None)` when nothing follows and the receiver overrides
    /// `method_missing`; without that hook, absence is a
    /// [`LookupError::NoSuperclassMethod`].
    pub fn find_next_implementation(
        &mut self,
        receiver: &Value,
        selector: &str,
        current_owner: TypeId,
    ) -> ModelResult<Option<MethodRecord>> {
        let ty = self.effective_type(receiver);
        let start = self.owner_index(ty, current_owner);
        let found = self
            .next_after(ty, start, selector)
            .map(|(_, record)| record);

        if found.is_some() || self.method_missing_hook(ty).is_some() {
            return Ok(found);
        }
        Err(LookupError::NoSuperclassMethod {
            selector: selector.to_string(),
            receiver: self.describe_receiver(receiver),
        }
        .into())
    }

    /// Index of the first chain entry standing for `owner`.
    fn owner_index(&mut self, ty: TypeId, owner: TypeId) -> Option<usize> {
        let chain = self.ancestors(ty);
        chain
            .iter()
            .position(|&entry| self.entry_owner(entry) == owner)
    }

    /// First real record for `selector` strictly after `start`. Stubs are
    /// skipped; an undefined marker ends the search.
    fn next_after(
        &mut self,
        ty: TypeId,
        start: Option<usize>,
        selector: &str,
    ) -> Option<(usize, MethodRecord)> {
        let start = start?;
        let chain = self.ancestors(ty);
        for (index, &entry) in chain.iter().enumerate().skip(start + 1) {
            match self.entry_table(entry).get(selector) {
                Some(record) if record.is_stub() => continue,
                Some(record) if record.is_undefined() => return None,
                Some(record) => return Some((index, record.clone())),
                None => continue,
            }
        }
        None
    }

    fn method_missing_hook(&mut self, ty: TypeId) -> Option<MethodRecord> {
        self.find_method(ty, METHOD_MISSING)
            .filter(MethodRecord::is_callable)
    }

    fn unknown_message(
        &mut self,
        ty: TypeId,
        receiver: &Value,
        selector: &str,
        args: Vec<Value>,
        from_super: bool,
    ) -> ModelResult<Value> {
        if selector != METHOD_MISSING {
            if let Some(hook) = self.method_missing_hook(ty) {
                let mut forwarded = Vec::with_capacity(args.len() + 1);
                forwarded.push(Value::symbol(selector));
                forwarded.extend(args);
                let name = Arc::from(METHOD_MISSING);
                return self.invoke(&hook, receiver.clone(), name, forwarded, None);
            }
        }

        let receiver = self.describe_receiver(receiver);
        let selector = selector.to_string();
        Err(if from_super {
            LookupError::NoSuperclassMethod { selector, receiver }
        } else {
            LookupError::NoMethod { selector, receiver }
        }
        .into())
    }

    fn invoke(
        &mut self,
        record: &MethodRecord,
        receiver: Value,
        selector: Arc<str>,
        args: Vec<Value>,
        chain_index: Option<(Epoch, usize)>,
    ) -> ModelResult<Value> {
        let Some(method) = record.as_native().cloned() else {
            return Err(LookupError::NoMethod {
                receiver: self.describe_receiver(&receiver),
                selector: selector.to_string(),
            }
            .into());
        };
        let method_name = record
            .alias_of
            .clone()
            .unwrap_or_else(|| Arc::clone(&selector));
        let invocation = Invocation {
            receiver,
            selector,
            method_name,
            args,
            owner: record.owner,
            chain_index,
        };
        method.call(self, &invocation)
    }

    // ==========================================================================
    // Method table maintenance
    // ==========================================================================

    /// Define `selector` on `ty`.
    ///
    /// Lands in the origin table of a prepend shell. For a module, every live
    /// proxy mirroring it is updated too.
    pub fn define_method(&mut self, ty: TypeId, selector: &str, method: NativeMethod) {
        self.write_method(ty, selector, MethodRecord::native(ty, method));
        tracing::debug!(owner = %self.type_name(ty), selector, "defined method");
    }

    /// Define `selector` on the singleton type of `value`.
    pub fn define_singleton_method(
        &mut self,
        value: &Value,
        selector: &str,
        method: NativeMethod,
    ) -> ModelResult<TypeId> {
        let singleton = self.singleton_of(value)?;
        self.define_method(singleton, selector, method);
        Ok(singleton)
    }

    /// Remove `ty`'s own definition of `selector`, leaving a stub so lookup
    /// continues up the chain. Fires `method_removed(:selector)`.
    pub fn remove_method(&mut self, ty: TypeId, selector: &str) -> ModelResult<()> {
        let defined = self
            .home_table(ty)
            .get(selector)
            .is_some_and(|record| !record.is_stub());
        if !defined {
            return Err(self.method_not_defined(ty, selector));
        }

        self.write_method(ty, selector, MethodRecord::stub(ty));
        tracing::debug!(owner = %self.type_name(ty), selector, "removed method");
        let args = vec![Value::symbol(selector)];
        self.fire_hook(&Value::Type(ty), "method_removed", args)
    }

    /// Make instances of `ty` stop responding to `selector`, even where an
    /// ancestor defines it. Fires `method_undefined(:selector)`.
    pub fn undef_method(&mut self, ty: TypeId, selector: &str) -> ModelResult<()> {
        let reachable = self
            .find_method(ty, selector)
            .is_some_and(|record| record.is_callable());
        if !reachable {
            return Err(self.method_not_defined(ty, selector));
        }

        self.write_method(ty, selector, MethodRecord::undefined(ty));
        tracing::debug!(owner = %self.type_name(ty), selector, "undefined method");
        let args = vec![Value::symbol(selector)];
        self.fire_hook(&Value::Type(ty), "method_undefined", args)
    }

    /// Define `new_selector` on `ty` as a copy of what `old_selector`
    /// currently resolves to. Aliases of aliases point at the original.
    pub fn alias_method(
        &mut self,
        ty: TypeId,
        new_selector: &str,
        old_selector: &str,
    ) -> ModelResult<()> {
        let Some(original) = self
            .find_method(ty, old_selector)
            .filter(MethodRecord::is_callable)
        else {
            return Err(self.method_not_defined(ty, old_selector));
        };

        let alias_of = original
            .alias_of
            .clone()
            .unwrap_or_else(|| Arc::from(old_selector));
        let record = MethodRecord {
            alias_of: Some(alias_of),
            ..original
        };
        self.write_method(ty, new_selector, record);
        tracing::debug!(
            owner = %self.type_name(ty),
            new_selector,
            old_selector,
            "aliased method"
        );
        Ok(())
    }

    /// Install stub records on the root class for selectors that have no
    /// entry there yet. Returns how many were added.
    pub fn add_stubs<S: AsRef<str>>(&mut self, selectors: &[S]) -> usize {
        let root = self.builtins.basic_object;
        let mut added = 0;
        for selector in selectors {
            let selector = selector.as_ref();
            let table = self.home_table_mut(root);
            if !table.contains_key(selector) {
                table.insert(Arc::from(selector), MethodRecord::stub(root));
                added += 1;
            }
        }
        if added > 0 {
            self.method_serial.bump();
            tracing::trace!(added, "installed method stubs");
        }
        added
    }

    fn write_method(&mut self, ty: TypeId, selector: &str, record: MethodRecord) {
        let selector: Arc<str> = Arc::from(selector);
        self.home_table_mut(ty)
            .insert(Arc::clone(&selector), record.clone());

        if self.is_module(ty) {
            if let Some(proxies) = self.proxies_by_source.get(&ty) {
                for proxy in proxies {
                    self.proxies[proxy.slot()]
                        .methods
                        .insert(Arc::clone(&selector), record.clone());
                }
            }
        }
        self.method_serial.bump();
    }

    fn method_not_defined(&self, ty: TypeId, selector: &str) -> ObjectModelError {
        LookupError::MethodNotDefined {
            selector: selector.to_string(),
            owner: self.type_name(ty),
        }
        .into()
    }
}
