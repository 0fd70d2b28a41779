//! Property-based tests for casting and merging.

use super::merger::FragmentMerger;
use super::{ProfileConfig, ProfilePool};
use crate::caster::{cast_value, ALL_CASTERS, DEFAULT_CASTERS};
use crate::config::LoadOptions;
use crate::loader::Source;
use crate::value::{Fragment, Value};
use proptest::prelude::*;

// Scalars that are never strings
fn non_string_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        prop::collection::vec("[a-z@:]{0,8}".prop_map(Value::String), 0..4)
            .prop_map(Value::Sequence),
    ]
}

fn leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![non_string_strategy(), "[a-z0-9]{0,8}".prop_map(Value::String)]
}

// Small fragments over a few keys so merges collide
fn fragment_strategy() -> impl Strategy<Value = Fragment> {
    let value = leaf_strategy().prop_recursive(3, 16, 4, |inner| {
        prop::collection::vec(("[a-d]", inner), 0..4)
            .prop_map(|pairs| Value::Mapping(pairs.into_iter().collect()))
    });
    prop::collection::vec(("[a-d]", value), 0..5).prop_map(|pairs| pairs.into_iter().collect())
}

fn merged(fragments: &[&Fragment]) -> Fragment {
    let mut result = Fragment::new();
    for fragment in fragments {
        FragmentMerger::merge_into(&mut result, fragment);
    }
    result
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    // A string without any caster's marker passes through every caster
    #[test]
    fn lenient_cast_without_prefix_is_identity(text in "[a-zA-Z0-9 ._-]{0,24}") {
        prop_assume!(text != "null");
        for caster in ALL_CASTERS {
            prop_assert_eq!(caster.cast(&text, false).unwrap(), Value::from(text.as_str()));
        }
        prop_assert_eq!(cast_value(Value::from(text.as_str()), ALL_CASTERS), Value::from(text.as_str()));
    }

    // Strict casting without the prefix is always an error
    #[test]
    fn strict_cast_without_prefix_fails(text in "[a-z0-9]{0,16}") {
        prop_assume!(text != "null");
        for caster in ALL_CASTERS {
            prop_assert!(caster.cast(&text, true).is_err());
        }
    }

    // Non-string values are never cast
    #[test]
    fn cast_of_non_string_is_identity(value in non_string_strategy()) {
        prop_assert_eq!(cast_value(value.clone(), DEFAULT_CASTERS), value);
    }

    // Merging a fragment into itself changes nothing
    #[test]
    fn merge_is_idempotent(fragment in fragment_strategy()) {
        prop_assert_eq!(merged(&[&fragment, &fragment]), fragment);
    }

    // Merging an empty fragment either way changes nothing
    #[test]
    fn empty_fragment_is_neutral(fragment in fragment_strategy()) {
        let empty = Fragment::new();
        prop_assert_eq!(merged(&[&empty, &fragment]), fragment.clone());
        prop_assert_eq!(merged(&[&fragment, &empty]), fragment);
    }

    // Every top-level key of the later fragment ends up with a value from it
    // unless both sides hold mappings
    #[test]
    fn later_scalar_wins(a in fragment_strategy(), b in fragment_strategy()) {
        let result = merged(&[&a, &b]);
        for (key, value) in &b {
            let nested = value.is_mapping() && a.get(key).is_some_and(Value::is_mapping);
            if !nested {
                prop_assert_eq!(&result[key], value);
            }
        }
        for key in a.keys() {
            prop_assert!(result.contains_key(key));
        }
    }

    // Owned and borrowed merges agree
    #[test]
    fn owned_merge_matches_borrowed(a in fragment_strategy(), b in fragment_strategy()) {
        let mut owned = a.clone();
        FragmentMerger::merge_owned(&mut owned, b.clone());
        prop_assert_eq!(owned, merged(&[&a, &b]));
    }

    // A profile view is its base with the profile merged on top
    #[test]
    fn view_is_base_then_profile(base in fragment_strategy(), profile in fragment_strategy()) {
        let mut loaded = Fragment::new();
        loaded.insert("default".to_string(), Value::Mapping(base.clone()));
        loaded.insert("p".to_string(), Value::Mapping(profile.clone()));

        let mut pool = ProfilePool::new();
        pool.absorb(loaded.clone(), "prop", true);
        prop_assert_eq!(pool.get("p"), Some(&profile));

        let mut config =
            ProfileConfig::load_one(Source::mapping(loaded), None, LoadOptions::default()).unwrap();
        config.use_profile("p", Some("default")).unwrap();
        prop_assert_eq!(config.detach(), merged(&[&base, &profile]));
        config.use_profile("p", None).unwrap();
        prop_assert_eq!(config.view(), &profile);
    }
}
