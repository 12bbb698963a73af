//! Ancestor composition: cached chains and mixin splicing.
//!
//! The chain of a type is `prepended ++ [self] ++ included ++ chain(superclass)`.
//! Mixed-in modules appear as proxy nodes, one per ancestor of the module,
//! grouped into segments whose first node is the segment root. Chains are
//! memoized against the structural epoch; any structural change bumps the
//! epoch and so invalidates every chain at once.

use std::sync::Arc;

use corundum_core::{
    AncestorEntry, ModelResult, ProxyId, Stamped, TopologyError, TypeFlags, TypeId, Value,
};

use crate::ObjectSpace;
use crate::method::MethodTable;
use crate::type_object::ProxyRole;

impl ObjectSpace {
    /// The method resolution order of `ty`, including proxy nodes.
    ///
    /// Two calls without a structural mutation in between return the same
    /// allocation.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn ancestors(&mut self, ty: TypeId) -> Arc<[AncestorEntry]> {
        let epoch = self.epoch.current();
        if let Some(chain) = self.types[ty.slot()]
            .ancestor_cache
            .as_ref()
            .and_then(|cache| cache.get_if_current(epoch))
        {
            return Arc::clone(chain);
        }

        let record = &self.types[ty.slot()];
        let superclass = record.superclass;
        let mut chain: Vec<AncestorEntry> = record
            .prepended
            .iter()
            .map(|&proxy| AncestorEntry::Proxy(proxy))
            .collect();
        chain.push(match record.origin {
            Some(origin) => AncestorEntry::Proxy(origin),
            None => AncestorEntry::Type(ty),
        });
        chain.extend(record.included.iter().copied().map(AncestorEntry::Proxy));
        if let Some(superclass) = superclass {
            chain.extend(self.ancestors(superclass).iter().copied());
        }

        let chain: Arc<[AncestorEntry]> = chain.into();
        self.types[ty.slot()].ancestor_cache = Some(Stamped::new(epoch, Arc::clone(&chain)));
        self.stats.ancestor_rebuilds += 1;
        tracing::trace!(ty = %ty, len = chain.len(), %epoch, "rebuilt ancestor chain");
        chain
    }

    /// The ancestor chain with every proxy replaced by the module it mirrors.
    pub fn ancestor_types(&mut self, ty: TypeId) -> Vec<TypeId> {
        self.ancestors(ty)
            .iter()
            .map(|&entry| self.entry_owner(entry))
            .collect()
    }

    /// The ancestor chain rendered as type names.
    pub fn ancestor_names(&mut self, ty: TypeId) -> Vec<String> {
        self.ancestor_types(ty)
            .into_iter()
            .map(|ancestor| self.type_name(ancestor))
            .collect()
    }

    /// Whether `module` is mixed in anywhere in `ty`'s chain.
    pub fn includes_module(&mut self, ty: TypeId, module: TypeId) -> bool {
        ty != module && self.is_module(module) && self.ancestor_types(ty).contains(&module)
    }

    /// Whether `ty` is in the chain of the value's effective type.
    pub fn is_a(&mut self, value: &Value, ty: TypeId) -> bool {
        let effective = self.effective_type(value);
        self.ancestor_types(effective).contains(&ty)
    }

    /// Modules mixed directly into `ty`, with the role they were mixed in as.
    pub fn direct_mixins(&self, ty: TypeId) -> Vec<(TypeId, ProxyRole)> {
        self.mixins.mixins_of(ty)
    }

    /// Mix `module` into `target` after `target`'s own methods.
    ///
    /// Including a module that is already a segment root in `target` rebuilds
    /// that segment in place. Fires `included(target)` on the module.
    pub fn include(&mut self, module: TypeId, target: TypeId) -> ModelResult<()> {
        self.include_into(module, target)?;
        self.fire_hook(&Value::Type(module), "included", vec![Value::Type(target)])
    }

    /// Mix `module` into `target` before `target`'s own methods.
    ///
    /// The first prepend turns `target` into a redirect shell whose methods
    /// live in an origin node after the prepended segment. A target accepts
    /// only one prepend. Fires `prepended(target)` on the module.
    pub fn prepend(&mut self, module: TypeId, target: TypeId) -> ModelResult<()> {
        self.prepend_into(module, target)?;
        self.fire_hook(&Value::Type(module), "prepended", vec![Value::Type(target)])
    }

    /// Include `module` into the singleton type of `value`. Fires
    /// `extended(value)` on the module.
    pub fn extend(&mut self, value: &Value, module: TypeId) -> ModelResult<()> {
        self.require_module(module)?;
        let singleton = self.singleton_of(value)?;
        self.include_into(module, singleton)?;
        self.fire_hook(&Value::Type(module), "extended", vec![value.clone()])
    }

    fn include_into(&mut self, module: TypeId, target: TypeId) -> ModelResult<()> {
        self.require_module(module)?;
        self.check_cycle(module, target)?;

        let existing = self.group_root(target, module, ProxyRole::Included);
        if existing.is_some() {
            self.resplice(target, module, ProxyRole::Included)?;
        } else if self.chain_has_source(target, module) {
            tracing::trace!(
                module = %self.type_name(module),
                target = %self.type_name(target),
                "module already mixed in"
            );
            return Ok(());
        } else {
            self.attach_group(module, target, ProxyRole::Included)?;
        }

        tracing::debug!(
            module = %self.type_name(module),
            target = %self.type_name(target),
            "included module"
        );
        self.propagate(target)
    }

    fn prepend_into(&mut self, module: TypeId, target: TypeId) -> ModelResult<()> {
        self.require_module(module)?;
        self.check_cycle(module, target)?;
        if self.types[target.slot()].is_prepend_shell() {
            return Err(TopologyError::DoublePrepend {
                module: self.type_name(module),
                target: self.type_name(target),
            }
            .into());
        }

        self.make_prepend_shell(target)?;
        self.attach_group(module, target, ProxyRole::Prepended)?;
        tracing::debug!(
            module = %self.type_name(module),
            target = %self.type_name(target),
            "prepended module"
        );
        self.propagate(target)
    }

    fn require_module(&self, module: TypeId) -> ModelResult<()> {
        if self.is_module(module) {
            Ok(())
        } else {
            Err(TopologyError::NotAModule {
                name: self.type_name(module),
            }
            .into())
        }
    }

    fn check_cycle(&mut self, module: TypeId, target: TypeId) -> ModelResult<()> {
        if self.ancestor_types(module).contains(&target) {
            return Err(TopologyError::CyclicMixin {
                module: self.type_name(module),
                target: self.type_name(target),
            }
            .into());
        }
        Ok(())
    }

    /// Move `target`'s own table into an origin node placed where the type
    /// used to sit in its chain.
    fn make_prepend_shell(&mut self, target: TypeId) -> ModelResult<()> {
        let origin = self.alloc_proxy(
            target,
            target,
            target,
            ProxyRole::Origin,
            true,
            MethodTable::default(),
        )?;
        let record = &mut self.types[target.slot()];
        self.proxies[origin.slot()].methods = std::mem::take(&mut record.methods);
        record.origin = Some(origin);
        record.flags |= TypeFlags::PREPEND_SHELL;
        self.epoch.bump();
        Ok(())
    }

    /// Splice a new segment for `module` directly after `target`'s own
    /// position (for includes) or directly before it (for prepends).
    pub(crate) fn attach_group(
        &mut self,
        module: TypeId,
        target: TypeId,
        role: ProxyRole,
    ) -> ModelResult<()> {
        let group = self.build_group(module, target, role)?;
        self.role_list_mut(target, role).splice(0..0, group);
        self.mixins.record(target, module, role);
        self.epoch.bump();
        Ok(())
    }

    /// One proxy per ancestor of `module`, snapshotting each one's table.
    fn build_group(
        &mut self,
        module: TypeId,
        target: TypeId,
        role: ProxyRole,
    ) -> ModelResult<Vec<ProxyId>> {
        let members = self.ancestor_types(module);
        let mut group = Vec::with_capacity(members.len());
        for (position, source) in members.into_iter().enumerate() {
            let snapshot = self.home_table(source).clone();
            let proxy = self.alloc_proxy(source, target, module, role, position == 0, snapshot)?;
            self.proxies_by_source
                .entry(source)
                .or_default()
                .push(proxy);
            group.push(proxy);
        }
        Ok(group)
    }

    /// Rebuild `module`'s segment in `target` from the module's current
    /// chain, keeping the segment's position.
    fn resplice(&mut self, target: TypeId, module: TypeId, role: ProxyRole) -> ModelResult<()> {
        let Some(start) = self.group_root(target, module, role) else {
            return Ok(());
        };
        let list = self.role_list(target, role);
        let end = list[start + 1..]
            .iter()
            .position(|&proxy| self.proxies[proxy.slot()].is_root_of_group)
            .map_or(list.len(), |offset| start + 1 + offset);
        let retired: Vec<ProxyId> = list[start..end].to_vec();

        let group = self.build_group(module, target, role)?;
        for proxy in &retired {
            let node = &mut self.proxies[proxy.slot()];
            node.live = false;
            let source = node.source;
            if let Some(live) = self.proxies_by_source.get_mut(&source) {
                live.retain(|candidate| candidate != proxy);
            }
        }

        self.role_list_mut(target, role).splice(start..end, group);
        self.epoch.bump();
        tracing::trace!(
            module = %self.type_name(module),
            target = %self.type_name(target),
            retired = retired.len(),
            "re-spliced mixin segment"
        );
        Ok(())
    }

    /// After `changed`'s chain was altered, rebuild its segment in every
    /// target it is mixed into, transitively.
    fn propagate(&mut self, changed: TypeId) -> ModelResult<()> {
        if !self.is_module(changed) {
            return Ok(());
        }
        let mut pending = vec![changed];
        while let Some(module) = pending.pop() {
            for (dependent, role) in self.mixins.dependents(module) {
                self.resplice(dependent, module, role)?;
                if self.is_module(dependent) {
                    pending.push(dependent);
                }
            }
        }
        Ok(())
    }

    fn group_root(&self, target: TypeId, module: TypeId, role: ProxyRole) -> Option<usize> {
        self.role_list(target, role).iter().position(|&proxy| {
            let node = &self.proxies[proxy.slot()];
            node.is_root_of_group && node.group == module
        })
    }

    /// Whether `target`'s own mixin segments already mirror `module`.
    fn chain_has_source(&self, target: TypeId, module: TypeId) -> bool {
        let record = &self.types[target.slot()];
        record
            .included
            .iter()
            .chain(record.prepended.iter())
            .any(|&proxy| self.proxies[proxy.slot()].source == module)
    }

    fn role_list(&self, target: TypeId, role: ProxyRole) -> &[ProxyId] {
        let record = &self.types[target.slot()];
        match role {
            ProxyRole::Prepended => &record.prepended,
            ProxyRole::Included | ProxyRole::Origin => &record.included,
        }
    }

    fn role_list_mut(&mut self, target: TypeId, role: ProxyRole) -> &mut Vec<ProxyId> {
        let record = &mut self.types[target.slot()];
        match role {
            ProxyRole::Prepended => &mut record.prepended,
            ProxyRole::Included | ProxyRole::Origin => &mut record.included,
        }
    }
}
