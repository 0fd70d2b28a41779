//! Format loaders.
//!
//! A [`Loader`] turns one [`Source`] into a [`Fragment`], either flat
//! ([`Loader::load`]) or keyed by profile name
//! ([`Loader::load_with_profiles`]). Loaders are resolved from an explicit
//! [`LoaderChoice`] or detected from the source (see [`LoaderSpec::detect`]).
//!
//! # Examples
//!
//! ```
//! use layerconf::loader::{resolve_loader, Source, TransformRegistry};
//!
//! let source = Source::text("[default]\nport = @int:8080\n");
//! let loader = resolve_loader(&source, Some(&"ini".into()), &TransformRegistry::new()).unwrap();
//! let loaded = loader.load(source, false).unwrap();
//! assert_eq!(loaded["port"].as_i64(), Some(8080));
//! ```

mod dict;
mod env;
mod format;
mod ini;
mod json;
mod template;
mod toml;
mod yaml;

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::caster::{cast, Caster};
use crate::error::{Error, Result};
use crate::value::{Fragment, Value};

pub use self::dict::DictLoader;
pub use self::env::{EnvLoader, OsEnvLoader};
pub use self::format::{Format, LoaderSpec};
pub use self::ini::IniLoader;
pub use self::json::JsonLoader;
pub use self::template::{ContentTransform, TemplateLoader, TransformRegistry};
pub use self::toml::TomlLoader;
pub use self::yaml::YamlLoader;

/// Where configuration data comes from.
pub enum Source {
    /// A file on disk; the loader is detected from its name.
    File(PathBuf),
    /// Raw text content; requires an explicit loader.
    Text(String),
    /// A stream read to its end; requires an explicit loader.
    Reader(Box<dyn Read + Send>),
    /// An in-memory mapping.
    Mapping(Fragment),
    /// OS environment variables under a namespace (`APP` selects `APP_*`).
    Environment(String),
}

impl Source {
    /// A file source.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// A text source.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// A stream source.
    pub fn reader(reader: impl Read + Send + 'static) -> Self {
        Self::Reader(Box::new(reader))
    }

    /// An in-memory mapping source.
    #[must_use]
    pub fn mapping(fragment: Fragment) -> Self {
        Self::Mapping(fragment)
    }

    /// An OS environment namespace; an empty namespace selects every variable.
    pub fn env(namespace: impl Into<String>) -> Self {
        Self::Environment(namespace.into())
    }

    /// Names the source in messages.
    ///
    /// # Examples
    ///
    /// ```
    /// use layerconf::loader::Source;
    ///
    /// assert_eq!(Source::file("/etc/app/app.ini").origin(), "app.ini");
    /// assert_eq!(Source::env("APP").origin(), "<env:APP>");
    /// ```
    #[must_use]
    pub fn origin(&self) -> String {
        match self {
            Self::File(path) => path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
            Self::Text(_) => "<text>".to_string(),
            Self::Reader(_) => "<reader>".to_string(),
            Self::Mapping(_) => "<mapping>".to_string(),
            Self::Environment(namespace) => format!("<env:{namespace}>"),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Reader(_) => f.write_str("Reader(..)"),
            Self::Mapping(map) => f.debug_tuple("Mapping").field(map).finish(),
            Self::Environment(ns) => f.debug_tuple("Environment").field(ns).finish(),
        }
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

impl From<&str> for Source {
    fn from(path: &str) -> Self {
        Self::File(PathBuf::from(path))
    }
}

impl From<Fragment> for Source {
    fn from(fragment: Fragment) -> Self {
        Self::Mapping(fragment)
    }
}

/// Reads and normalizes one kind of configuration source.
///
/// Implementors provide [`Loader::parse`]; the provided methods handle
/// reading, missing sources and casting. Loaders that do not read text
/// override [`Loader::loading`].
pub trait Loader: Send + Sync {
    /// Name used in messages.
    fn name(&self) -> &str;

    /// Casters applied to loaded values.
    fn casters(&self) -> &[Caster] {
        &[]
    }

    /// Parses text content into a raw fragment.
    ///
    /// # Errors
    ///
    /// Returns a format error if `content` is malformed.
    fn parse(&self, content: &str, origin: &str) -> Result<Fragment>;

    /// Reads the source's text, `None` if it is missing and that is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceNotFound`] for a missing file unless
    /// `ignore_missing` is set, or an I/O error.
    fn read(&self, source: Source, ignore_missing: bool) -> Result<Option<String>> {
        read_text(source, ignore_missing)
    }

    /// Reads and parses a source without casting.
    ///
    /// # Errors
    ///
    /// Propagates read and parse errors.
    fn loading(&self, source: Source, ignore_missing: bool) -> Result<Option<Fragment>> {
        let origin = source.origin();
        match self.read(source, ignore_missing)? {
            Some(content) => self.parse(&content, &origin).map(Some),
            None => Ok(None),
        }
    }

    /// Turns a raw fragment into the flat result.
    ///
    /// # Errors
    ///
    /// Loaders may reject raw fragments that have no flat reading.
    fn convert(&self, loaded: Fragment, _origin: &str) -> Result<Fragment> {
        Ok(cast(loaded, self.casters()))
    }

    /// Turns a raw fragment into profile name to fragment.
    ///
    /// # Errors
    ///
    /// Loaders may reject raw fragments that have no profile reading.
    fn convert_with_profiles(&self, loaded: Fragment, origin: &str) -> Result<Fragment> {
        self.convert(loaded, origin)
    }

    /// Loads a source as one flat fragment.
    ///
    /// # Errors
    ///
    /// Propagates read, parse and conversion errors.
    fn load(&self, source: Source, ignore_missing: bool) -> Result<Fragment> {
        let origin = source.origin();
        match self.loading(source, ignore_missing)? {
            Some(loaded) => self.convert(loaded, &origin),
            None => Ok(Fragment::new()),
        }
    }

    /// Loads a source as profile name to fragment.
    ///
    /// # Errors
    ///
    /// Propagates read, parse and conversion errors.
    fn load_with_profiles(&self, source: Source, ignore_missing: bool) -> Result<Fragment> {
        let origin = source.origin();
        match self.loading(source, ignore_missing)? {
            Some(loaded) => self.convert_with_profiles(loaded, &origin),
            None => Ok(Fragment::new()),
        }
    }
}

/// Reads text from a file, text or reader source.
///
/// The existence check happens immediately before the read.
///
/// # Errors
///
/// Returns [`Error::SourceNotFound`] for a missing file unless
/// `ignore_missing` is set, [`Error::InvalidSource`] for sources without
/// text, or an I/O error.
pub fn read_text(source: Source, ignore_missing: bool) -> Result<Option<String>> {
    match source {
        Source::File(path) => {
            if !path.exists() {
                if ignore_missing {
                    log::debug!("{}: missing, ignored", path.display());
                    return Ok(None);
                }
                return Err(Error::SourceNotFound { path });
            }
            Ok(Some(fs::read_to_string(&path)?))
        }
        Source::Text(content) => Ok(Some(content)),
        Source::Reader(mut reader) => {
            let mut content = String::new();
            reader.read_to_string(&mut content)?;
            Ok(Some(content))
        }
        other => Err(Error::InvalidSource {
            origin: other.origin(),
            reason: "expected a file, text or reader source".to_string(),
        }),
    }
}

/// Requires a parsed document to be a mapping; an empty document is empty.
pub(crate) fn expect_mapping(value: Value, origin: &str) -> Result<Fragment> {
    match value {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Fragment::new()),
        other => Err(Error::InvalidSource {
            origin: origin.to_string(),
            reason: format!("top level must be a mapping, got {}", other.kind()),
        }),
    }
}

/// Picks a loader by name or supplies one directly.
#[derive(Clone)]
pub enum LoaderChoice {
    /// A loader name such as `"ini"`, `"toml"` or `"yaml.j2"`.
    Named(String),
    /// A caller-provided loader.
    Custom(Arc<dyn Loader>),
}

impl fmt::Debug for LoaderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Custom(loader) => f.debug_tuple("Custom").field(&loader.name()).finish(),
        }
    }
}

impl From<&str> for LoaderChoice {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for LoaderChoice {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<Arc<dyn Loader>> for LoaderChoice {
    fn from(loader: Arc<dyn Loader>) -> Self {
        Self::Custom(loader)
    }
}

/// Loader overrides for a list of sources.
#[derive(Debug, Clone, Default)]
pub enum Loaders {
    /// Detect every loader from its source.
    #[default]
    Auto,
    /// Use the same loader for every source.
    All(LoaderChoice),
    /// One optional override per source, in order.
    PerSource(Vec<Option<LoaderChoice>>),
}

impl Loaders {
    /// Expands the overrides to one entry per source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LoaderCountMismatch`] if a per-source list does not
    /// have `count` entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use layerconf::loader::Loaders;
    ///
    /// assert_eq!(Loaders::from("toml").for_sources(2).unwrap().len(), 2);
    /// assert!(Loaders::PerSource(vec![None]).for_sources(2).is_err());
    /// ```
    pub fn for_sources(self, count: usize) -> Result<Vec<Option<LoaderChoice>>> {
        match self {
            Self::Auto => Ok(vec![None; count]),
            Self::All(choice) => Ok(vec![Some(choice); count]),
            Self::PerSource(choices) if choices.len() == count => Ok(choices),
            Self::PerSource(choices) => Err(Error::LoaderCountMismatch {
                loaders: choices.len(),
                sources: count,
            }),
        }
    }
}

impl From<&str> for Loaders {
    fn from(name: &str) -> Self {
        Self::All(LoaderChoice::from(name))
    }
}

impl From<LoaderChoice> for Loaders {
    fn from(choice: LoaderChoice) -> Self {
        Self::All(choice)
    }
}

/// Resolves the loader for one source.
///
/// # Errors
///
/// Returns [`Error::LoaderRequired`] for text and reader sources without a
/// choice, or [`Error::FormatNotSupported`] for unknown names and extensions.
pub fn resolve_loader(
    source: &Source,
    choice: Option<&LoaderChoice>,
    transforms: &TransformRegistry,
) -> Result<Arc<dyn Loader>> {
    let spec = match choice {
        Some(LoaderChoice::Custom(loader)) => return Ok(Arc::clone(loader)),
        Some(LoaderChoice::Named(name)) => LoaderSpec::parse(name)?,
        None => match source {
            Source::File(path) => LoaderSpec::detect(path)?,
            Source::Mapping(_) => LoaderSpec::new(Format::Dict),
            Source::Environment(_) => LoaderSpec::new(Format::OsEnv),
            Source::Text(_) | Source::Reader(_) => {
                return Err(Error::LoaderRequired {
                    origin: source.origin(),
                })
            }
        },
    };
    log::debug!("{}: using {spec} loader", source.origin());
    spec.loader(transforms)
}

/// Resolves every loader before anything is loaded.
pub(crate) fn resolve_all(
    sources: Vec<Source>,
    loaders: Loaders,
    transforms: &TransformRegistry,
) -> Result<Vec<(Source, Arc<dyn Loader>)>> {
    let choices = loaders.for_sources(sources.len())?;
    sources
        .into_iter()
        .zip(choices)
        .map(|(source, choice)| {
            let loader = resolve_loader(&source, choice.as_ref(), transforms)?;
            Ok((source, loader))
        })
        .collect()
}
