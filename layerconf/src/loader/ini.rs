//! Ini-like files (`.ini`, `.cfg`, `.conf`, `.config`, `*rc`).
//!
//! Every section is a profile. Without profiles only the `default` section
//! is loaded. Values are strings until a caster converts them.

use ini::{Ini, ParseOption};

use super::Loader;
use crate::caster::{cast, Caster, DEFAULT_CASTERS};
use crate::error::{Error, Result};
use crate::value::{Fragment, Value};

/// Loads ini-like sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct IniLoader;

impl Loader for IniLoader {
    fn name(&self) -> &str {
        "ini"
    }

    fn casters(&self) -> &[Caster] {
        DEFAULT_CASTERS
    }

    fn parse(&self, content: &str, origin: &str) -> Result<Fragment> {
        // quotes and backslashes stay literal so casters see the raw text
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(content, options).map_err(|e| Error::Ini {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;

        let mut sections = Fragment::new();
        for (section, properties) in &ini {
            let Some(name) = section else {
                if properties.is_empty() {
                    continue;
                }
                return Err(Error::Ini {
                    origin: origin.to_string(),
                    message: "key found before any section header".to_string(),
                });
            };
            let entry = sections
                .entry(name.to_string())
                .or_insert_with(|| Value::Mapping(Fragment::new()));
            if let Some(map) = entry.as_mapping_mut() {
                for (key, value) in properties {
                    map.insert(key.to_string(), Value::from(value));
                }
            }
        }
        Ok(sections)
    }

    fn convert(&self, loaded: Fragment, origin: &str) -> Result<Fragment> {
        if loaded.len() > 1 {
            log::warn!(
                "{origin}: More than one section found, only the default section is loaded. \
                 Load with profiles to use the other sections."
            );
        }
        let default = loaded
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("default"))
            .and_then(|(_, section)| section.into_mapping());
        match default {
            Some(section) => Ok(cast(section, self.casters())),
            None => Err(Error::NoDefaultSection {
                origin: origin.to_string(),
            }),
        }
    }

    fn convert_with_profiles(&self, loaded: Fragment, _origin: &str) -> Result<Fragment> {
        Ok(loaded
            .into_iter()
            .map(|(name, section)| {
                let section = match section {
                    Value::Mapping(map) => Value::Mapping(cast(map, self.casters())),
                    other => other,
                };
                (name, section)
            })
            .collect())
    }
}
