//! Profiles: named configuration fragments layered over a base.
//!
//! Sources loaded in profile mode are merged into a [`ProfilePool`] keyed by
//! lowercased profile name. [`ProfileConfig`] materializes one view from the
//! pool at a time:
//!
//! 1. the base profile (`default` unless told otherwise), if any
//! 2. the selected profile, merged on top with [`FragmentMerger`]
//!
//! # Examples
//!
//! ```
//! use layerconf::{LoadOptions, ProfileConfig, ProfileState, Source, Value};
//! use serde_json::json;
//!
//! let pool = Value::from(json!({
//!     "default": {"a": 1, "b": 2},
//!     "p1": {"a": 6},
//! }))
//! .into_mapping()
//! .unwrap();
//!
//! let mut config = ProfileConfig::load_one(Source::mapping(pool), None, LoadOptions::default())?;
//! config.use_profile("p1", Some("default"))?;
//! assert_eq!(config.state(), ProfileState::ProfileActive("p1".to_string()));
//! assert_eq!(Value::Mapping(config.detach()), Value::from(json!({"a": 6, "b": 2})));
//! # Ok::<(), layerconf::Error>(())
//! ```

mod merger;
mod pool;
mod state;

#[cfg(test)]
mod proptests;

pub use merger::FragmentMerger;
pub use pool::{ProfilePool, DEFAULT_PROFILE};
pub use state::{ProfileConfig, ProfileGuard, ProfileState, META_KEY, POOL_KEY};
