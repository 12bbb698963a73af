//! Property-based tests for ancestor composition and dispatch.
//!
//! Random sequences of include/prepend operations over a small pool of
//! modules and a three-level class hierarchy are applied to a fresh space.
//! Operations the space rejects are skipped; the invariants below must hold
//! for whatever topology results.

#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use corundum::LookupError::NoSuperclassMethod;
use corundum::prelude::*;
use corundum::{TopologyError, TypeId};
use proptest::prelude::*;

const MODULES: usize = 5;

#[derive(Debug, Clone)]
enum Op {
    /// Include module `m` into module `t`.
    IncludeIntoModule(usize, usize),
    /// Include module `m` into class `c`.
    IncludeIntoClass(usize, usize),
    /// Prepend module `m` to class `c`.
    Prepend(usize, usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..MODULES, 0..MODULES).prop_map(|(m, t)| Op::IncludeIntoModule(m, t)),
        (0..MODULES, 0..3usize).prop_map(|(m, c)| Op::IncludeIntoClass(m, c)),
        (0..MODULES, 0..3usize).prop_map(|(m, c)| Op::Prepend(m, c)),
    ]
}

struct World {
    space: ObjectSpace,
    modules: Vec<TypeId>,
    /// Root first: `classes[1] < classes[0]`, `classes[2] < classes[1]`.
    classes: Vec<TypeId>,
}

impl World {
    fn new() -> Self {
        let mut space = ObjectSpace::new();
        let object = space.builtins().object;
        let modules = (0..MODULES)
            .map(|i| space.define_module(object, &format!("M{i}")).unwrap())
            .collect();
        let mut classes = Vec::new();
        let mut parent = None;
        for i in 0..3 {
            let class = space
                .define_class(object, &format!("C{i}"), parent)
                .unwrap();
            classes.push(class);
            parent = Some(class);
        }
        Self {
            space,
            modules,
            classes,
        }
    }

    fn apply(&mut self, op: &Op) -> ModelResult<()> {
        match *op {
            Op::IncludeIntoModule(m, t) => self.space.include(self.modules[m], self.modules[t]),
            Op::IncludeIntoClass(m, c) => self.space.include(self.modules[m], self.classes[c]),
            Op::Prepend(m, c) => self.space.prepend(self.modules[m], self.classes[c]),
        }
    }

    fn all_types(&self) -> Vec<TypeId> {
        self.modules.iter().chain(&self.classes).copied().collect()
    }

    /// `P ++ [T] ++ I ++ ancestors(S)` from the type's own lists.
    fn composed_chain(&mut self, ty: TypeId) -> Vec<TypeId> {
        let record = self.space.get(ty);
        let prepended: Vec<_> = record.own_prepended().to_vec();
        let included: Vec<_> = record.own_included().to_vec();
        let origin = record.origin();
        let superclass = record.superclass();

        let mut chain: Vec<TypeId> = prepended
            .iter()
            .map(|&p| self.space.proxy(p).source())
            .collect();
        match origin {
            Some(origin) => chain.push(self.space.proxy(origin).source()),
            None => chain.push(ty),
        }
        chain.extend(included.iter().map(|&p| self.space.proxy(p).source()));
        if let Some(superclass) = superclass {
            chain.extend(self.space.ancestor_types(superclass));
        }
        chain
    }
}

fn build(ops: &[Op]) -> World {
    let mut world = World::new();
    for op in ops {
        let _ = world.apply(op);
    }
    world
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn ancestors_follow_composition(ops in prop::collection::vec(op_strategy(), 0..24)) {
        let mut world = build(&ops);
        for ty in world.all_types() {
            let expected = world.composed_chain(ty);
            prop_assert_eq!(world.space.ancestor_types(ty), expected);
        }
    }

    #[test]
    fn modules_never_reach_themselves(ops in prop::collection::vec(op_strategy(), 0..24)) {
        let mut world = build(&ops);
        for (i, &module) in world.modules.clone().iter().enumerate() {
            let chain = world.space.ancestor_types(module);
            prop_assert_eq!(chain[0], module);
            prop_assert!(!chain[1..].contains(&module), "M{} reaches itself", i);
        }
    }

    #[test]
    fn cyclic_includes_are_rejected(
        ops in prop::collection::vec(op_strategy(), 0..24),
        m in 0..MODULES,
        t in 0..MODULES,
    ) {
        let mut world = build(&ops);
        let module = world.modules[m];
        let target = world.modules[t];
        if world.space.ancestor_types(module).contains(&target) {
            let result = world.space.include(module, target);
            prop_assert!(
                matches!(
                    result,
                    Err(ObjectModelError::Topology(TopologyError::CyclicMixin { .. }))
                ),
                "include succeeded: {:?}",
                result
            );
        }
    }

    #[test]
    fn ancestor_cache_is_stable_between_mutations(
        ops in prop::collection::vec(op_strategy(), 1..24),
    ) {
        let mut world = build(&ops[..ops.len() - 1]);
        let leaf = world.classes[2];
        let first = world.space.ancestors(leaf);
        let second = world.space.ancestors(leaf);
        prop_assert!(std::sync::Arc::ptr_eq(&first, &second));

        let before = world.space.epoch();
        let _ = world.apply(&ops[ops.len() - 1]);
        let after = world.space.ancestors(leaf);
        if world.space.epoch() == before {
            prop_assert!(std::sync::Arc::ptr_eq(&first, &after));
        }
        let expected = world.composed_chain(leaf);
        prop_assert_eq!(world.space.ancestor_types(leaf), expected);
    }

    #[test]
    fn super_visits_every_definer_once(ops in prop::collection::vec(op_strategy(), 0..24)) {
        let mut world = build(&ops);
        for ty in world.all_types() {
            let label = world.space.type_name(ty);
            world.space.define_method(
                ty,
                "trail",
                NativeMethod::new(move |space, inv| {
                    let mut trail = vec![Value::str(&label)];
                    match space.call_super(inv, vec![]) {
                        Ok(Value::Array(rest)) => trail.extend(rest.iter().cloned()),
                        Ok(other) => panic!("unexpected {other}"),
                        Err(ObjectModelError::Lookup(NoSuperclassMethod { .. })) => {}
                        Err(other) => return Err(other),
                    }
                    Ok(Value::array(trail))
                }),
            );
        }

        let leaf = world.classes[2];
        let expected: Vec<Value> = world
            .space
            .ancestor_names(leaf)
            .into_iter()
            .filter(|name| name.starts_with('M') || name.starts_with('C'))
            .map(Value::str)
            .collect();
        let instance = world.space.instantiate(leaf, vec![]).unwrap();
        let trail = world.space.send(&instance, "trail", vec![]).unwrap();
        prop_assert_eq!(trail, Value::array(expected));
    }
}
