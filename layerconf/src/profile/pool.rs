//! The profile pool: every profile's accumulated fragment.

use indexmap::IndexMap;

use super::merger::FragmentMerger;
use crate::value::{uppercase_keys, Fragment, Value};

/// Name of the profile every pool contains.
pub const DEFAULT_PROFILE: &str = "default";

/// Profile name to merged fragment, in first-seen order.
///
/// Names are lowercased on insertion, so `[TEST]` and `[test]` are one
/// profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePool {
    profiles: IndexMap<String, Fragment>,
}

impl ProfilePool {
    /// An empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one source's profile-keyed result into the pool.
    ///
    /// Top-level values that are not mappings are not profiles and are
    /// skipped. With `case_sensitive` unset, keys are upper-cased first.
    pub fn absorb(&mut self, loaded: Fragment, origin: &str, case_sensitive: bool) {
        for (name, value) in loaded {
            let fragment = match value {
                Value::Mapping(fragment) => fragment,
                other => {
                    log::debug!(
                        "{origin}: skipping top-level `{name}` ({}), not a profile",
                        other.kind()
                    );
                    continue;
                }
            };
            let fragment = if case_sensitive {
                fragment
            } else {
                uppercase_keys(fragment)
            };
            let entry = self.profiles.entry(name.to_lowercase()).or_default();
            FragmentMerger::merge_owned(entry, fragment);
        }
    }

    /// Adds an empty `default` profile if there is none.
    pub fn ensure_default(&mut self) {
        self.profiles.entry(DEFAULT_PROFILE.to_string()).or_default();
    }

    /// The fragment of `profile`.
    #[must_use]
    pub fn get(&self, profile: &str) -> Option<&Fragment> {
        self.profiles.get(profile)
    }

    /// Whether `profile` is in the pool.
    #[must_use]
    pub fn contains(&self, profile: &str) -> bool {
        self.profiles.contains_key(profile)
    }

    /// Profile names in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Profiles and their fragments in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fragment)> {
        self.profiles.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the pool has no profiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Removes every profile.
    pub fn clear(&mut self) {
        self.profiles.clear();
    }

    /// The pool as one nested fragment.
    #[must_use]
    pub fn to_fragment(&self) -> Fragment {
        self.profiles
            .iter()
            .map(|(name, fragment)| (name.clone(), Value::Mapping(fragment.clone())))
            .collect()
    }
}
