//! Loader names and file extension detection.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::{
    DictLoader, EnvLoader, IniLoader, JsonLoader, Loader, OsEnvLoader, TemplateLoader, TomlLoader,
    TransformRegistry, YamlLoader,
};
use crate::error::{Error, Result};

/// A built-in configuration format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// In-memory mappings and Python literal text.
    Dict,
    /// Ini-like files with sections.
    Ini,
    /// JSON documents.
    Json,
    /// YAML documents.
    Yaml,
    /// TOML documents.
    Toml,
    /// `.env` files.
    Env,
    /// OS environment variables.
    OsEnv,
}

impl Format {
    /// Maps a file extension to a format.
    ///
    /// # Examples
    ///
    /// ```
    /// use layerconf::loader::Format;
    ///
    /// assert_eq!(Format::from_extension("yml"), Some(Format::Yaml));
    /// assert_eq!(Format::from_extension("cfg"), Some(Format::Ini));
    /// assert_eq!(Format::from_extension("xml"), None);
    /// ```
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "dict" => Some(Self::Dict),
            "ini" | "cfg" | "conf" | "config" | "rc" => Some(Self::Ini),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "env" => Some(Self::Env),
            "osenv" => Some(Self::OsEnv),
            _ => None,
        }
    }

    /// Maps a loader name to a format.
    ///
    /// Names ending in `s` (`"tomls"`, `"jsons"`) select the same format
    /// reading from text instead of a file.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        Self::from_extension(&name).or_else(|| {
            name.strip_suffix('s')
                .filter(|base| !base.is_empty())
                .and_then(Self::from_extension)
        })
    }

    /// The canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dict => "dict",
            Self::Ini => "ini",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Env => "env",
            Self::OsEnv => "osenv",
        }
    }

    /// The built-in loader for this format.
    #[must_use]
    pub fn loader(self) -> Arc<dyn Loader> {
        match self {
            Self::Dict => Arc::new(DictLoader),
            Self::Ini => Arc::new(IniLoader),
            Self::Json => Arc::new(JsonLoader),
            Self::Yaml => Arc::new(YamlLoader),
            Self::Toml => Arc::new(TomlLoader),
            Self::Env => Arc::new(EnvLoader),
            Self::OsEnv => Arc::new(OsEnvLoader),
        }
    }

    /// Whether sources of this format are text that a transform can render.
    #[must_use]
    pub const fn is_textual(self) -> bool {
        !matches!(self, Self::Dict | Self::OsEnv)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A format plus an optional template tag, such as `ini.j2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderSpec {
    /// The underlying format.
    pub format: Format,
    /// The template tag (`"j2"` or `"liq"`), if the content is rendered first.
    pub template: Option<String>,
}

impl LoaderSpec {
    /// A plain format without templating.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self {
            format,
            template: None,
        }
    }

    /// Parses a loader name such as `"toml"`, `"yamls"` or `"ini.j2"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FormatNotSupported`] for unknown names.
    ///
    /// # Examples
    ///
    /// ```
    /// use layerconf::loader::{Format, LoaderSpec};
    ///
    /// let spec = LoaderSpec::parse("ini.jinja2").unwrap();
    /// assert_eq!(spec.format, Format::Ini);
    /// assert_eq!(spec.template.as_deref(), Some("j2"));
    /// ```
    pub fn parse(name: &str) -> Result<Self> {
        let unsupported = || Error::FormatNotSupported {
            format: name.to_string(),
        };
        let lower = name.to_ascii_lowercase();
        let mut parts = lower.splitn(2, '.');
        let base = parts.next().unwrap_or_default();
        let tag = parts.next();
        let format = Format::from_name(base).ok_or_else(unsupported)?;
        let template = match tag {
            Some(tag) => Some(template_tag(tag).ok_or_else(unsupported)?.to_string()),
            None => None,
        };
        Ok(Self { format, template })
    }

    /// Detects the loader from a file name.
    ///
    /// The last suffix names the format. A template suffix may come first or
    /// second (`app.ini.j2`, `app.j2.ini`). Names without a suffix that end
    /// in `rc` (`.pylintrc`) are ini-like.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FormatNotSupported`] if no format can be detected.
    ///
    /// # Examples
    ///
    /// ```
    /// use layerconf::loader::{Format, LoaderSpec};
    /// use std::path::Path;
    ///
    /// assert_eq!(LoaderSpec::detect(Path::new("app.yml")).unwrap().format, Format::Yaml);
    /// assert_eq!(LoaderSpec::detect(Path::new(".pylintrc")).unwrap().format, Format::Ini);
    /// let spec = LoaderSpec::detect(Path::new("app.j2.toml")).unwrap();
    /// assert_eq!(spec.format, Format::Toml);
    /// assert_eq!(spec.template.as_deref(), Some("j2"));
    /// ```
    pub fn detect(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let unsupported = || Error::FormatNotSupported {
            format: path.display().to_string(),
        };

        // a leading dot makes the whole name a suffix (`.env`, `.pylintrc`)
        let dotfile = name.starts_with('.');
        let mut parts = name.trim_start_matches('.').split('.');
        let stem = if dotfile {
            ""
        } else {
            parts.next().unwrap_or_default()
        };
        let suffixes: Vec<&str> = parts.collect();

        let (format_suffix, tag) = match suffixes.as_slice() {
            [.., prev, last] if template_tag(last).is_some() => (*prev, template_tag(last)),
            [.., prev, last] if template_tag(prev).is_some() => (*last, template_tag(prev)),
            [.., last] => (*last, None),
            [] => (stem, None),
        };

        let format = Format::from_extension(format_suffix)
            .or_else(|| format_suffix.ends_with("rc").then_some(Format::Ini))
            .ok_or_else(unsupported)?;
        Ok(Self {
            format,
            template: tag.map(str::to_string),
        })
    }

    /// Builds the loader, wrapping it in a [`TemplateLoader`] if tagged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FormatNotSupported`] if the template tag has no
    /// registered transform or the format cannot be templated.
    pub fn loader(&self, transforms: &TransformRegistry) -> Result<Arc<dyn Loader>> {
        let inner = self.format.loader();
        let Some(tag) = &self.template else {
            return Ok(inner);
        };
        let transform = transforms
            .get(tag)
            .filter(|_| self.format.is_textual())
            .ok_or_else(|| Error::FormatNotSupported {
                format: self.to_string(),
            })?;
        Ok(Arc::new(TemplateLoader::new(
            self.to_string(),
            inner,
            transform,
        )))
    }
}

impl fmt::Display for LoaderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.template {
            Some(tag) => write!(f, "{}.{tag}", self.format),
            None => write!(f, "{}", self.format),
        }
    }
}

fn template_tag(suffix: &str) -> Option<&'static str> {
    match suffix {
        "j2" | "jinja" | "jinja2" => Some("j2"),
        "liq" | "liquid" => Some("liq"),
        _ => None,
    }
}
