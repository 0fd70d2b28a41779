//! JSON documents.

use super::{expect_mapping, Loader};
use crate::error::{Error, Result};
use crate::value::{Fragment, Value};

/// Loads JSON sources; the top level must be an object. Values are not cast.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLoader;

impl Loader for JsonLoader {
    fn name(&self) -> &str {
        "json"
    }

    fn parse(&self, content: &str, origin: &str) -> Result<Fragment> {
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|source| Error::Json {
                origin: origin.to_string(),
                source,
            })?;
        expect_mapping(Value::from(value), origin)
    }
}
