//! Error types for the layerconf library.
//!
//! This module provides the error hierarchy for loading, casting and profile
//! switching, using `thiserror` for ergonomic error handling.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with a layerconf error.
///
/// # Examples
///
/// ```
/// use layerconf::{Error, Result};
///
/// fn example_operation() -> Result<&'static str> {
///     Ok("default")
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the layerconf library.
#[derive(Debug, Error)]
pub enum Error {
    /// No loader exists for the requested format or file extension.
    #[error("format not supported: {format}")]
    FormatNotSupported {
        /// The format name or extension that was requested.
        format: String,
    },

    /// The requested profile does not exist in the pool.
    #[error("no such profile: {profile}")]
    NoSuchProfile {
        /// The profile that was requested.
        profile: String,
    },

    /// The requested base profile does not exist in the pool.
    #[error("no such base profile: {base} (set allow_missing_base to treat it as empty)")]
    NoSuchBaseProfile {
        /// The base profile that was requested.
        base: String,
    },

    /// A configuration source does not exist.
    #[error("configuration source not found: {}", path.display())]
    SourceNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// A caster was applied in strict mode to a value without its prefix.
    #[error("expected `{prefix}` prefix, got `{value}`")]
    PrefixMismatch {
        /// The prefix the caster expects.
        prefix: &'static str,
        /// The value that was given.
        value: String,
    },

    /// A caster matched its prefix but could not convert the payload.
    #[error("cannot cast `{value}` with `{prefix}`: {reason}")]
    Conversion {
        /// The prefix of the failing caster.
        prefix: &'static str,
        /// The value that was given.
        value: String,
        /// Why the conversion failed.
        reason: String,
    },

    /// An ini-like source has no `default` section in no-profile mode.
    #[error("{origin}: only the default section can be loaded without profiles")]
    NoDefaultSection {
        /// The source that was loaded.
        origin: String,
    },

    /// A text or reader source was given without an explicit loader.
    #[error("{origin}: a loader must be specified for this source")]
    LoaderRequired {
        /// The source that was loaded.
        origin: String,
    },

    /// A list of loader overrides does not match the list of sources.
    #[error("length of loaders ({loaders}) does not match length of sources ({sources})")]
    LoaderCountMismatch {
        /// Number of loaders given.
        loaders: usize,
        /// Number of sources given.
        sources: usize,
    },

    /// A source cannot be handled by the selected loader.
    #[error("{origin}: {reason}")]
    InvalidSource {
        /// The source that was loaded.
        origin: String,
        /// The reason the source is unusable.
        reason: String,
    },

    /// An ini-like source could not be parsed.
    #[error("{origin}: invalid ini: {message}")]
    Ini {
        /// The source that was parsed.
        origin: String,
        /// The parser message.
        message: String,
    },

    /// A JSON source or `@json:` payload could not be parsed.
    #[error("{origin}: invalid JSON: {source}")]
    Json {
        /// The source that was parsed.
        origin: String,
        /// The underlying parser error.
        #[source]
        source: serde_json::Error,
    },

    /// A YAML source could not be parsed.
    #[error("{origin}: invalid YAML: {source}")]
    Yaml {
        /// The source that was parsed.
        origin: String,
        /// The underlying parser error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A TOML source could not be parsed.
    #[error("{origin}: invalid TOML: {source}")]
    Toml {
        /// The source that was parsed.
        origin: String,
        /// The underlying parser error.
        #[source]
        source: toml::de::Error,
    },

    /// A `.env` source could not be parsed.
    #[error("{origin}: invalid dotenv: {source}")]
    Dotenv {
        /// The source that was parsed.
        origin: String,
        /// The underlying parser error.
        #[source]
        source: dotenvy::Error,
    },

    /// A Python literal could not be evaluated.
    #[error("invalid literal at offset {offset}: {message}")]
    Literal {
        /// Byte offset of the failure in the literal text.
        offset: usize,
        /// What went wrong.
        message: String,
    },

    /// A content transform failed to render a source.
    #[error("{origin}: template rendering failed: {message}")]
    Transform {
        /// The source that was rendered.
        origin: String,
        /// The renderer message.
        message: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if error indicates a missing source.
    ///
    /// # Examples
    ///
    /// ```
    /// use layerconf::Error;
    /// use std::path::PathBuf;
    ///
    /// let err = Error::SourceNotFound { path: PathBuf::from("/nonexistent.ini") };
    /// assert!(err.is_not_found());
    /// ```
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SourceNotFound { .. })
    }

    /// Check if error indicates a missing profile or base profile.
    ///
    /// # Examples
    ///
    /// ```
    /// use layerconf::Error;
    ///
    /// let err = Error::NoSuchProfile { profile: "staging".to_string() };
    /// assert!(err.is_no_such_profile());
    /// ```
    #[must_use]
    pub fn is_no_such_profile(&self) -> bool {
        matches!(
            self,
            Self::NoSuchProfile { .. } | Self::NoSuchBaseProfile { .. }
        )
    }
}
