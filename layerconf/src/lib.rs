#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # layerconf
//!
//! Layered configuration loading with named profiles.
//!
//! Sources in different formats (ini, JSON, YAML, TOML, `.env`, OS environment,
//! in-memory mappings) are normalized into one [`Fragment`] data model,
//! string values are converted by prefix-driven casters (`@int:8080`), and
//! fragments are merged recursively in order.
//!
//! ## Core Types
//!
//! - [`Config`]: flat loading, later sources win
//! - [`ProfileConfig`]: profile-aware loading and switching
//! - [`Loader`] and [`Source`]: format adapters and their inputs
//! - [`Value`] and [`Fragment`]: the normalized data model
//! - [`Error`] and [`Result`]: error handling types
//!
//! ## Examples
//!
//! ```
//! use layerconf::{LoadOptions, Loaders, ProfileConfig, Source};
//!
//! let ini = "[default]\nport = @int:8080\nhost = localhost\n\n[prod]\nhost = example.com\n";
//! let env = "PROD_PORT=@int:443\n";
//!
//! let mut config = ProfileConfig::load(
//!     [Source::text(ini), Source::text(env)],
//!     Loaders::PerSource(vec![Some("ini".into()), Some("env".into())]),
//!     LoadOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(config.get("port").and_then(|v| v.as_i64()), Some(8080));
//!
//! config.use_profile("prod", Some("default")).unwrap();
//! assert_eq!(config.get("host").and_then(|v| v.as_str()), Some("example.com"));
//! assert_eq!(config.get("PORT").and_then(|v| v.as_i64()), Some(443));
//! assert_eq!(config.get("port").and_then(|v| v.as_i64()), Some(8080));
//! ```

pub mod caster;
pub mod config;
pub mod error;
pub mod loader;
pub mod profile;
pub mod value;

#[cfg(test)]
pub(crate) mod test_util;

// Re-export key types at crate root for convenience
pub use caster::Caster;
pub use config::{Config, LoadOptions};
pub use error::{Error, Result};
pub use loader::{Loader, LoaderChoice, Loaders, Source};
pub use profile::{ProfileConfig, ProfileGuard, ProfileState, META_KEY, POOL_KEY};
pub use value::{Fragment, Value};
