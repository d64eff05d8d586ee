//! Property tests for wire names and sorter partitions.

use std::sync::Arc;

use fers_fields::{
    parse_name, Choices, FieldDefinition, FieldRegistry, Form, NamespacePath, RenderConfig,
    SorterOptions, Submission, TEMPLATE_PREFIX,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Key(String),
    Index(usize),
    Template,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => "[a-z][a-z0-9_-]{0,5}".prop_map(Step::Key),
        3 => (0usize..20).prop_map(Step::Index),
        1 => Just(Step::Template),
    ]
}

/// Paths from either a storage base or the root, with template marks anywhere.
fn path() -> impl Strategy<Value = NamespacePath> {
    let start = prop_oneof![
        "[a-z][a-z0-9_]{0,5}".prop_map(NamespacePath::new),
        "[a-z][a-z0-9_]{0,5}".prop_map(|id| NamespacePath::root().key(id)),
    ];
    (start, prop::collection::vec(step(), 0..6)).prop_map(|(start, steps)| {
        steps.into_iter().fold(start, |p, s| match s {
            Step::Key(k) => p.key(k),
            Step::Index(i) => p.index(i),
            Step::Template => p.template(),
        })
    })
}

fn identity(p: &NamespacePath) -> (Vec<String>, usize) {
    (p.raw_segments(), p.template_depth())
}

fn universe(n: usize) -> Choices {
    (0..n).map(|i| (format!("k{i}"), format!("Item {i}"))).collect()
}

proptest! {
    #[test]
    fn distinct_paths_have_distinct_names(a in path(), b in path()) {
        if identity(&a) != identity(&b) {
            prop_assert_ne!(a.to_string(), b.to_string());
        } else {
            prop_assert_eq!(a.to_string(), b.to_string());
        }
    }

    #[test]
    fn names_parse_back_to_segments(p in path()) {
        let name = p.to_string();
        let prefix = TEMPLATE_PREFIX.repeat(p.template_depth());
        prop_assert!(name.starts_with(&prefix));
        prop_assert_eq!(parse_name(&name[prefix.len()..]).unwrap(), p.raw_segments());
        prop_assert!(!p.is_template() || Submission::new().get(&p).is_none());

        let nested = p.template();
        prop_assert_eq!(nested.template_depth(), p.template_depth() + 1);
        prop_assert_eq!(nested.to_string(), format!("{TEMPLATE_PREFIX}{name}"));
    }

    #[test]
    fn saved_sorter_partitions_universe(
        (keys, split) in (1usize..8)
            .prop_flat_map(|n| {
                let keys: Vec<String> = (0..n).map(|i| format!("k{i}")).collect();
                (Just(keys).prop_shuffle(), 0..=n)
            }),
        hidden in any::<bool>(),
    ) {
        let n = keys.len();
        let mut options = SorterOptions::new(universe(n));
        if hidden {
            options = options.hide_disabled();
        }
        let form = Form::new(
            Arc::new(FieldRegistry::with_defaults()),
            RenderConfig::default(),
            None,
            vec![FieldDefinition::sorter("modules", options)],
        )
        .unwrap();

        let (enabled, disabled) = keys.split_at(split);
        let mut pairs: Vec<(String, String)> = enabled
            .iter()
            .map(|k| (format!("modules[enabled][{k}]"), k.clone()))
            .collect();
        if !hidden {
            pairs.extend(disabled.iter().map(|k| (format!("modules[disabled][{k}]"), k.clone())));
        }
        let outcome = form.save(&Submission::from_pairs(pairs).unwrap());
        prop_assert!(outcome.is_ok());

        let state = outcome.values["modules"].as_sorter().unwrap();
        prop_assert_eq!(state.len(), n);
        prop_assert!(state.enabled.keys().all(|k| !state.disabled.contains_key(k)));
        prop_assert_eq!(state.enabled.keys().cloned().collect::<Vec<_>>(), enabled.to_vec());
        if hidden {
            let mut expected: Vec<&String> = disabled.iter().collect();
            expected.sort_by_key(|k| k[1..].parse::<usize>().unwrap_or_default());
            prop_assert_eq!(state.disabled.keys().collect::<Vec<_>>(), expected);
        } else {
            prop_assert_eq!(state.disabled.keys().cloned().collect::<Vec<_>>(), disabled.to_vec());
        }
    }
}
