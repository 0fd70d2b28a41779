//! YAML documents.

use super::{expect_mapping, Loader};
use crate::error::{Error, Result};
use crate::value::{Fragment, Value};

/// Loads YAML sources; the top level must be a mapping or empty. Values are
/// not cast.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlLoader;

impl Loader for YamlLoader {
    fn name(&self) -> &str {
        "yaml"
    }

    fn parse(&self, content: &str, origin: &str) -> Result<Fragment> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|source| Error::Yaml {
                origin: origin.to_string(),
                source,
            })?;
        expect_mapping(Value::from(value), origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Source;

    #[test]
    fn test_load_native_values_uncast() {
        let loaded = YamlLoader
            .load(
                Source::text("port: 8080\nratio: 0.5\nflag: \"@bool:1\"\nitems: [a, b]\n"),
                false,
            )
            .unwrap();
        assert_eq!(loaded["port"].as_i64(), Some(8080));
        assert_eq!(loaded["ratio"].as_f64(), Some(0.5));
        assert_eq!(loaded["flag"].as_str(), Some("@bool:1"));
        assert_eq!(loaded["items"].as_sequence().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn test_empty_document() {
        assert!(YamlLoader.load(Source::text(""), false).unwrap().is_empty());
    }

    #[test]
    fn test_profiles_keep_nesting() {
        let loaded = YamlLoader
            .load_with_profiles(
                Source::text("default:\n  db:\n    host: h\ntest:\n  db:\n    port: \"@int:5\"\n"),
                false,
            )
            .unwrap();
        let db = loaded["test"].as_mapping().unwrap()["db"].as_mapping().unwrap();
        assert_eq!(db["port"].as_str(), Some("@int:5"));
    }

    #[test]
    fn test_rejects_scalar_document() {
        assert!(YamlLoader.load(Source::text("just text"), false).is_err());
    }
}
