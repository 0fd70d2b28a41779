//! In-memory mappings and Python literal text.

use super::{expect_mapping, Loader, Source};
use crate::caster::literal;
use crate::error::{Error, Result};
use crate::value::Fragment;

/// Loads [`Source::Mapping`] as is, or evaluates [`Source::Text`] as a
/// Python dict literal. No casting is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct DictLoader;

impl Loader for DictLoader {
    fn name(&self) -> &str {
        "dict"
    }

    fn parse(&self, content: &str, origin: &str) -> Result<Fragment> {
        expect_mapping(literal::eval(content)?, origin)
    }

    fn loading(&self, source: Source, _ignore_missing: bool) -> Result<Option<Fragment>> {
        match source {
            Source::Mapping(fragment) => Ok(Some(fragment)),
            Source::Text(content) => self.parse(&content, "<text>").map(Some),
            other => Err(Error::InvalidSource {
                origin: other.origin(),
                reason: "the dict loader takes a mapping or literal text".to_string(),
            }),
        }
    }
}
