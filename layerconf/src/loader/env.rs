//! `.env` files and OS environment variables.
//!
//! Both are flat string maps. With profiles, each key is split on its first
//! `_`: `TEST_PORT` sets `PORT` in profile `TEST`.

use super::{Loader, Source};
use crate::caster::{cast, Caster, DEFAULT_CASTERS};
use crate::error::{Error, Result};
use crate::value::{Fragment, Value};

/// Loads `.env` sources with `dotenvy`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvLoader;

impl Loader for EnvLoader {
    fn name(&self) -> &str {
        "env"
    }

    fn casters(&self) -> &[Caster] {
        DEFAULT_CASTERS
    }

    fn parse(&self, content: &str, origin: &str) -> Result<Fragment> {
        let mut loaded = Fragment::new();
        for item in dotenvy::from_read_iter(content.as_bytes()) {
            let (key, value) = item.map_err(|source| Error::Dotenv {
                origin: origin.to_string(),
                source,
            })?;
            loaded.insert(key, Value::String(value));
        }
        Ok(loaded)
    }

    fn convert_with_profiles(&self, loaded: Fragment, origin: &str) -> Result<Fragment> {
        Ok(cast(split_profiles(loaded, origin), self.casters()))
    }
}

/// Loads OS environment variables under a namespace.
///
/// The namespace comes from [`Source::Environment`] or from the stem of a
/// `NAME.osenv` file name, which is never read. Namespace `APP` selects
/// `APP_*` variables and strips the prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEnvLoader;

impl OsEnvLoader {
    /// The namespace a source selects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSource`] for sources that name no namespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use layerconf::loader::{OsEnvLoader, Source};
    ///
    /// assert_eq!(OsEnvLoader::namespace(&Source::file("conf/APP.osenv")).unwrap(), "APP");
    /// assert_eq!(OsEnvLoader::namespace(&Source::env("")).unwrap(), "");
    /// ```
    pub fn namespace(source: &Source) -> Result<String> {
        match source {
            Source::Environment(namespace) => Ok(namespace.clone()),
            Source::File(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok(name.strip_suffix(".osenv").unwrap_or(&name).to_string())
            }
            other => Err(Error::InvalidSource {
                origin: other.origin(),
                reason: "environment variables need a namespace or an .osenv file name".to_string(),
            }),
        }
    }

    /// Variables under `namespace`, prefix stripped, sorted by name.
    #[must_use]
    pub fn scan(namespace: &str) -> Fragment {
        let prefix = if namespace.is_empty() {
            String::new()
        } else {
            format!("{namespace}_")
        };
        // non-unicode variables cannot be configuration strings
        let mut vars: Vec<(String, String)> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .filter_map(|(k, v)| {
                let key = k.strip_prefix(&prefix)?;
                (!key.is_empty()).then(|| (key.to_string(), v))
            })
            .collect();
        vars.sort_by(|a, b| a.0.cmp(&b.0));
        vars.into_iter().map(|(k, v)| (k, Value::String(v))).collect()
    }
}

impl Loader for OsEnvLoader {
    fn name(&self) -> &str {
        "osenv"
    }

    fn casters(&self) -> &[Caster] {
        DEFAULT_CASTERS
    }

    fn parse(&self, _content: &str, origin: &str) -> Result<Fragment> {
        Err(Error::InvalidSource {
            origin: origin.to_string(),
            reason: "environment variables are not parsed from text".to_string(),
        })
    }

    fn loading(&self, source: Source, _ignore_missing: bool) -> Result<Option<Fragment>> {
        let namespace = Self::namespace(&source)?;
        log::debug!("scanning environment for namespace `{namespace}`");
        Ok(Some(Self::scan(&namespace)))
    }

    fn convert_with_profiles(&self, loaded: Fragment, origin: &str) -> Result<Fragment> {
        Ok(cast(split_profiles(loaded, origin), self.casters()))
    }
}

/// Groups flat `PROFILE_KEY` entries by profile; keys without `_` are dropped.
pub(crate) fn split_profiles(flat: Fragment, origin: &str) -> Fragment {
    let mut profiles = Fragment::new();
    for (key, value) in flat {
        let Some((profile, rest)) = key.split_once('_') else {
            log::warn!("{origin}: No profile name found in key: {key}");
            continue;
        };
        let entry = profiles
            .entry(profile.to_string())
            .or_insert_with(|| Value::Mapping(Fragment::new()));
        if let Some(map) = entry.as_mapping_mut() {
            map.insert(rest.to_string(), value);
        }
    }
    profiles
}
