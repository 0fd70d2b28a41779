//! Recursive fragment merging.
//!
//! Later fragments win. Nested mappings merge key by key; any other value,
//! sequences included, replaces what was there.

use crate::value::{Fragment, Value};

/// Merges fragments according to precedence rules.
///
/// # Examples
///
/// ```
/// use layerconf::profile::FragmentMerger;
/// use layerconf::Value;
/// use serde_json::json;
///
/// let base = Value::from(json!({"db": {"host": "h", "port": 1}})).into_mapping().unwrap();
/// let over = Value::from(json!({"db": {"port": 2}})).into_mapping().unwrap();
///
/// let mut result = base;
/// FragmentMerger::merge_into(&mut result, &over);
/// assert_eq!(Value::Mapping(result), Value::from(json!({"db": {"host": "h", "port": 2}})));
/// ```
pub struct FragmentMerger;

impl FragmentMerger {
    /// Merge fragments given from lowest to highest precedence.
    #[must_use]
    pub fn merge(fragments: Vec<Fragment>) -> Fragment {
        let mut result = Fragment::new();
        for fragment in fragments {
            Self::merge_owned(&mut result, fragment);
        }
        result
    }

    /// Merge `source` into `target`, cloning what is taken from `source`.
    pub fn merge_into(target: &mut Fragment, source: &Fragment) {
        for (key, value) in source {
            match value {
                Value::Mapping(incoming) => {
                    if let Some(Value::Mapping(existing)) = target.get_mut(key) {
                        Self::merge_into(existing, incoming);
                    } else {
                        target.insert(key.clone(), value.clone());
                    }
                }
                other => {
                    target.insert(key.clone(), other.clone());
                }
            }
        }
    }

    /// Merge `source` into `target`, consuming `source`.
    pub fn merge_owned(target: &mut Fragment, source: Fragment) {
        for (key, value) in source {
            match value {
                Value::Mapping(incoming) => {
                    if let Some(Value::Mapping(existing)) = target.get_mut(&key) {
                        Self::merge_owned(existing, incoming);
                    } else {
                        target.insert(key, Value::Mapping(incoming));
                    }
                }
                other => {
                    target.insert(key, other);
                }
            }
        }
    }
}
