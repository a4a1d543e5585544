//! Property tests for chain shape and lookup

use proptest::prelude::*;
use protochain_core::{Method, Registry, TemplateId, Value};
use std::collections::HashSet;

/// Each entry picks the parent of the next template among those created so far
fn build(parents: &[usize]) -> (Registry, Vec<TemplateId>) {
    let mut registry = Registry::new();
    let mut ids = vec![registry.root()];
    for (i, pick) in parents.iter().enumerate() {
        let parent = ids[pick % ids.len()];
        ids.push(registry.create_template(format!("T{i}"), parent).unwrap());
    }
    (registry, ids)
}

proptest! {
    #[test]
    fn chains_reach_root_without_repeats(parents in prop::collection::vec(any::<usize>(), 0..40)) {
        let (registry, ids) = build(&parents);
        for id in ids {
            let chain: Vec<_> = registry.ancestors(id).collect();
            let unique: HashSet<_> = chain.iter().copied().collect();
            prop_assert_eq!(unique.len(), chain.len());
            prop_assert_eq!(chain.last().copied(), Some(TemplateId::ROOT));
            prop_assert!(chain.len() <= registry.len());
        }
    }

    #[test]
    fn rejected_reparents_keep_chains_acyclic(
        parents in prop::collection::vec(any::<usize>(), 1..20),
        moves in prop::collection::vec((any::<usize>(), any::<usize>()), 0..20),
    ) {
        let (mut registry, ids) = build(&parents);
        for (from, to) in moves {
            let template = ids[from % ids.len()];
            let parent = ids[to % ids.len()];
            let creates_cycle = registry.is_ancestor(template, parent);
            let result = registry.set_parent(template, parent);
            prop_assert_eq!(result.is_err(), creates_cycle || template.is_root());
        }
        for id in ids {
            prop_assert_eq!(registry.ancestors(id).last(), Some(TemplateId::ROOT));
        }
    }

    #[test]
    fn nearest_definition_wins(
        parents in prop::collection::vec(any::<usize>(), 1..30),
        pick in any::<usize>(),
    ) {
        let (mut registry, ids) = build(&parents);
        for (i, id) in ids.iter().enumerate().filter(|(i, _)| i % 3 == 0) {
            registry.define_method(*id, "f", Method::constant(i as i64)).unwrap();
        }

        let start = ids[pick % ids.len()];
        let expected = registry
            .ancestors(start)
            .find(|id| id.index() % 3 == 0);
        let resolution = registry.resolve(start, "f").unwrap();
        prop_assert_eq!(resolution.as_ref().map(|r| r.owner), expected);

        if let (Some(resolution), Some(owner)) = (resolution, expected) {
            let mut receiver = registry.create_instance(start).unwrap();
            let value = resolution.method.invoke(&mut receiver, &[]).unwrap();
            prop_assert_eq!(value, Value::from(owner.index() as i64));
        }
    }
}
