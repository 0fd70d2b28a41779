//! Load options and flat loading.
//!
//! [`LoadOptions`] is shared by the flat [`Config`] facade and by
//! [`ProfileConfig`](crate::ProfileConfig).
//!
//! # Examples
//!
//! ```
//! use layerconf::{Config, LoadOptions, Loaders, Source};
//! use layerconf::Value;
//! use serde_json::json;
//!
//! let low = Value::from(json!({"db": {"host": "h", "port": 1}})).into_mapping().unwrap();
//! let high = Value::from(json!({"db": {"port": 2}})).into_mapping().unwrap();
//!
//! let merged = Config::load(
//!     [Source::mapping(low), Source::mapping(high)],
//!     Loaders::Auto,
//!     &LoadOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(Value::Mapping(merged), Value::from(json!({"db": {"host": "h", "port": 2}})));
//! ```

use crate::error::Result;
use crate::loader::{resolve_all, ContentTransform, LoaderChoice, Loaders, Source, TransformRegistry};
use crate::profile::{FragmentMerger, DEFAULT_PROFILE};
use crate::value::{uppercase_keys, Fragment};

/// Options for loading sources and switching profiles.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Treat missing files as empty instead of failing.
    pub ignore_missing: bool,
    /// Keep keys as loaded; when unset, keys are upper-cased.
    pub case_sensitive: bool,
    /// Base profile for the view materialized after loading.
    pub base: Option<String>,
    /// Treat a missing base profile as empty instead of failing.
    pub allow_missing_base: bool,
    /// Content transforms for templated sources.
    pub transforms: TransformRegistry,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            ignore_missing: false,
            case_sensitive: true,
            base: Some(DEFAULT_PROFILE.to_string()),
            allow_missing_base: false,
            transforms: TransformRegistry::new(),
        }
    }
}

impl LoadOptions {
    /// Default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether missing files are ignored.
    #[must_use]
    pub fn ignore_missing(mut self, ignore: bool) -> Self {
        self.ignore_missing = ignore;
        self
    }

    /// Set whether keys keep their case.
    #[must_use]
    pub fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.case_sensitive = sensitive;
        self
    }

    /// Set the base profile used after loading.
    #[must_use]
    pub fn base(mut self, base: Option<&str>) -> Self {
        self.base = base.map(str::to_string);
        self
    }

    /// Set whether a missing base profile is allowed.
    #[must_use]
    pub fn allow_missing_base(mut self, allow: bool) -> Self {
        self.allow_missing_base = allow;
        self
    }

    /// Register a content transform for a template tag.
    #[must_use]
    pub fn with_transform(mut self, tag: &str, transform: impl ContentTransform + 'static) -> Self {
        self.transforms = self.transforms.with(tag, transform);
        self
    }

    pub(crate) fn normalize(&self, fragment: Fragment) -> Fragment {
        if self.case_sensitive {
            fragment
        } else {
            uppercase_keys(fragment)
        }
    }
}

/// Flat loading: every source merged into one fragment, later sources win.
pub struct Config;

impl Config {
    /// Load and merge `sources` in order.
    ///
    /// Every loader is resolved before any source is read.
    ///
    /// # Errors
    ///
    /// Returns the first resolution, read, parse or conversion error.
    pub fn load<I>(sources: I, loaders: Loaders, options: &LoadOptions) -> Result<Fragment>
    where
        I: IntoIterator<Item = Source>,
    {
        let resolved = resolve_all(sources.into_iter().collect(), loaders, &options.transforms)?;
        let mut merged = Fragment::new();
        for (source, loader) in resolved {
            let loaded = loader.load(source, options.ignore_missing)?;
            FragmentMerger::merge_owned(&mut merged, options.normalize(loaded));
        }
        Ok(merged)
    }

    /// Load one source, detecting its loader unless one is given.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_one(
        source: Source,
        loader: Option<LoaderChoice>,
        options: &LoadOptions,
    ) -> Result<Fragment> {
        Self::load([source], Loaders::PerSource(vec![loader]), options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::value::Value;
    use serde_json::json;

    fn frag(value: serde_json::Value) -> Fragment {
        Value::from(value).into_mapping().unwrap()
    }

    #[test]
    fn test_default_options() {
        let options = LoadOptions::default();
        assert!(!options.ignore_missing);
        assert!(options.case_sensitive);
        assert_eq!(options.base.as_deref(), Some("default"));
        assert!(!options.allow_missing_base);
    }

    #[test]
    fn test_builder_setters() {
        let options = LoadOptions::new()
            .ignore_missing(true)
            .case_sensitive(false)
            .base(None)
            .allow_missing_base(true);
        assert!(options.ignore_missing);
        assert!(!options.case_sensitive);
        assert!(options.base.is_none());
        assert!(options.allow_missing_base);
    }

    #[test]
    fn test_later_source_wins() {
        let merged = Config::load(
            [
                Source::mapping(frag(json!({"a": 1, "n": {"x": 1}}))),
                Source::text("[default]\na = @int:2\n"),
            ],
            Loaders::PerSource(vec![None, Some("ini".into())]),
            &LoadOptions::default(),
        )
        .unwrap();
        assert_eq!(Value::Mapping(merged), Value::from(json!({"a": 2, "n": {"x": 1}})));
    }

    #[test]
    fn test_case_insensitive_upper_cases_keys() {
        let merged = Config::load_one(
            Source::mapping(frag(json!({"port": 1, "db": {"host": "h"}}))),
            None,
            &LoadOptions::new().case_sensitive(false),
        )
        .unwrap();
        assert_eq!(Value::Mapping(merged), Value::from(json!({"PORT": 1, "DB": {"HOST": "h"}})));
    }

    #[test]
    fn test_resolution_fails_before_loading() {
        let err = Config::load(
            [Source::file("/no/such/a.ini"), Source::file("b.xml")],
            Loaders::Auto,
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::FormatNotSupported { .. }));
    }

    #[test]
    fn test_ignore_missing() {
        let merged = Config::load_one(
            Source::file("/no/such/a.toml"),
            None,
            &LoadOptions::new().ignore_missing(true),
        )
        .unwrap();
        assert!(merged.is_empty());
    }
}
