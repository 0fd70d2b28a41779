//! TOML documents.
//!
//! TOML is typed already, so only the `@none` and `null` casters apply.

use super::Loader;
use crate::caster::{Caster, TOML_CASTERS};
use crate::error::{Error, Result};
use crate::value::{Fragment, Value};

/// Loads TOML sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlLoader;

impl Loader for TomlLoader {
    fn name(&self) -> &str {
        "toml"
    }

    fn casters(&self) -> &[Caster] {
        TOML_CASTERS
    }

    fn parse(&self, content: &str, origin: &str) -> Result<Fragment> {
        let table: toml::Table = toml::from_str(content).map_err(|source| Error::Toml {
            origin: origin.to_string(),
            source,
        })?;
        Ok(table.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
    }
}
