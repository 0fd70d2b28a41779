//! Pre-parse content transforms for templated sources.
//!
//! No template engine is bundled. Callers register a [`ContentTransform`]
//! under a tag (`"j2"`, `"liq"`) and sources named like `app.toml.j2` are
//! rendered through it before the format loader parses them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{Loader, Source};
use crate::caster::Caster;
use crate::error::{Error, Result};
use crate::value::Fragment;

/// Renders raw source text before parsing.
pub trait ContentTransform: Send + Sync {
    /// Renders `content`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transform`] if rendering fails.
    fn render(&self, content: &str, origin: &str) -> Result<String>;
}

impl<F> ContentTransform for F
where
    F: Fn(&str) -> std::result::Result<String, String> + Send + Sync,
{
    fn render(&self, content: &str, origin: &str) -> Result<String> {
        self(content).map_err(|message| Error::Transform {
            origin: origin.to_string(),
            message,
        })
    }
}

/// Content transforms by template tag.
///
/// # Examples
///
/// ```
/// use layerconf::loader::TransformRegistry;
///
/// let registry = TransformRegistry::new()
///     .with("j2", |s: &str| -> Result<String, String> { Ok(s.replace("{{ port }}", "8080")) });
/// assert!(registry.contains("j2"));
/// assert!(!registry.contains("liq"));
/// ```
#[derive(Clone, Default)]
pub struct TransformRegistry {
    transforms: BTreeMap<String, Arc<dyn ContentTransform>>,
}

impl TransformRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transform, replacing any previous one for `tag`.
    #[must_use]
    pub fn with(mut self, tag: &str, transform: impl ContentTransform + 'static) -> Self {
        self.register(tag, Arc::new(transform));
        self
    }

    /// Registers a shared transform, replacing any previous one for `tag`.
    pub fn register(&mut self, tag: &str, transform: Arc<dyn ContentTransform>) {
        self.transforms.insert(tag.to_ascii_lowercase(), transform);
    }

    /// The transform for `tag`.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<Arc<dyn ContentTransform>> {
        self.transforms.get(&tag.to_ascii_lowercase()).cloned()
    }

    /// Whether `tag` has a transform.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.transforms.contains_key(&tag.to_ascii_lowercase())
    }

    /// Registered tags.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.transforms.keys().map(String::as_str)
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.tags()).finish()
    }
}

/// Renders content through a transform, then parses it with another loader.
pub struct TemplateLoader {
    name: String,
    inner: Arc<dyn Loader>,
    transform: Arc<dyn ContentTransform>,
}

impl TemplateLoader {
    /// Wraps `inner` so its content is rendered by `transform` first.
    pub fn new(
        name: impl Into<String>,
        inner: Arc<dyn Loader>,
        transform: Arc<dyn ContentTransform>,
    ) -> Self {
        Self {
            name: name.into(),
            inner,
            transform,
        }
    }
}

impl Loader for TemplateLoader {
    fn name(&self) -> &str {
        &self.name
    }

    fn casters(&self) -> &[Caster] {
        self.inner.casters()
    }

    fn parse(&self, content: &str, origin: &str) -> Result<Fragment> {
        let rendered = self.transform.render(content, origin)?;
        self.inner.parse(&rendered, origin)
    }

    fn read(&self, source: Source, ignore_missing: bool) -> Result<Option<String>> {
        self.inner.read(source, ignore_missing)
    }

    fn convert(&self, loaded: Fragment, origin: &str) -> Result<Fragment> {
        self.inner.convert(loaded, origin)
    }

    fn convert_with_profiles(&self, loaded: Fragment, origin: &str) -> Result<Fragment> {
        self.inner.convert_with_profiles(loaded, origin)
    }
}
