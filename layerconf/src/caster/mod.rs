//! Prefix-tagged type casting of string values.
//!
//! Text-based formats (ini, dotenv, environment variables) only carry
//! strings. A value such as `"@int:5"` asks for a typed value instead. Each
//! [`Caster`] owns one literal prefix and a conversion function; a caster
//! list is tried in declared order, so prefixes disambiguate types rather
//! than value sniffing.
//!
//! # Examples
//!
//! ```
//! use layerconf::caster::{cast_value, DEFAULT_CASTERS, INT};
//! use layerconf::Value;
//!
//! assert_eq!(cast_value(Value::from("@int:1.9"), DEFAULT_CASTERS), Value::Integer(1));
//! assert_eq!(cast_value(Value::from("plain"), DEFAULT_CASTERS), Value::from("plain"));
//!
//! // Strict mode reports why a caster did not apply.
//! assert!(INT.cast("1", true).is_err());
//! ```

pub mod literal;

use std::fmt;

use crate::error::{Error, Result};
use crate::value::{Fragment, Value};

/// Conversion applied to the text following a caster's prefix.
pub type CastFn = fn(&str) -> std::result::Result<Value, String>;

/// A prefix-triggered string-to-value converter.
#[derive(Clone, Copy)]
pub struct Caster {
    name: &'static str,
    prefix: &'static str,
    convert: CastFn,
}

impl Caster {
    /// Creates a caster for `prefix` using `convert` on the remainder.
    ///
    /// # Examples
    ///
    /// ```
    /// use layerconf::caster::Caster;
    /// use layerconf::Value;
    ///
    /// let upper = Caster::new("upper", "@upper:", |s| Ok(Value::from(s.to_uppercase())));
    /// assert_eq!(upper.cast("@upper:abc", true).unwrap(), Value::from("ABC"));
    /// ```
    #[must_use]
    pub const fn new(name: &'static str, prefix: &'static str, convert: CastFn) -> Self {
        Self {
            name,
            prefix,
            convert,
        }
    }

    /// Returns the caster's name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the literal prefix this caster reacts to.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Casts a single string.
    ///
    /// With `fail_raises` set, a missing prefix or a failed conversion is an
    /// error. Without it, both cases return the original string unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PrefixMismatch`] or [`Error::Conversion`] in strict
    /// mode only.
    pub fn cast(&self, value: &str, fail_raises: bool) -> Result<Value> {
        match self.try_cast(value) {
            Ok(cast) => Ok(cast),
            Err(_) if !fail_raises => Ok(Value::from(value)),
            Err(err) => Err(err),
        }
    }

    fn try_cast(&self, value: &str) -> Result<Value> {
        let Some(payload) = value.strip_prefix(self.prefix) else {
            return Err(Error::PrefixMismatch {
                prefix: self.prefix,
                value: value.to_string(),
            });
        };
        (self.convert)(payload).map_err(|reason| Error::Conversion {
            prefix: self.prefix,
            value: value.to_string(),
            reason,
        })
    }
}

impl fmt::Debug for Caster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Caster")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// `@int:` parses a float and truncates it, so `@int:1.9` is `1`.
pub const INT: Caster = Caster::new("int", "@int:", cast_int);
/// `@float:` parses a float.
pub const FLOAT: Caster = Caster::new("float", "@float:", cast_float);
/// `@bool:` accepts `true`/`false` in any case.
pub const BOOL: Caster = Caster::new("bool", "@bool:", cast_bool);
/// `@none` with nothing after it.
pub const NONE: Caster = Caster::new("none", "@none", cast_none);
/// Bare `null`.
pub const NULL: Caster = Caster::new("null", "null", cast_none);
/// `@python:` evaluates a Python literal.
pub const PYTHON: Caster = Caster::new("python", "@python:", cast_python);
/// `@py:` is a short form of `@python:`.
pub const PY: Caster = Caster::new("py", "@py:", cast_python);
/// `@json:` parses a JSON document.
pub const JSON: Caster = Caster::new("json", "@json:", cast_json);
/// `@toml:` parses a TOML document.
pub const TOML: Caster = Caster::new("toml", "@toml:", cast_toml);

/// Casters for string-only formats: ini, dotenv and environment variables.
pub const DEFAULT_CASTERS: &[Caster] = &[INT, FLOAT, BOOL, NONE, PYTHON, PY, JSON, TOML];

/// Casters for TOML, which has no native null.
pub const TOML_CASTERS: &[Caster] = &[NONE, NULL];

/// Every built-in caster.
pub const ALL_CASTERS: &[Caster] = &[INT, FLOAT, BOOL, JSON, TOML, PYTHON, NONE, NULL];

fn parse_float(text: &str) -> std::result::Result<f64, String> {
    text.trim().parse::<f64>().map_err(|e| e.to_string())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn cast_int(text: &str) -> std::result::Result<Value, String> {
    let f = parse_float(text)?.trunc();
    if !f.is_finite() || f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return Err(format!("`{text}` does not fit in an integer"));
    }
    Ok(Value::Integer(f as i64))
}

fn cast_float(text: &str) -> std::result::Result<Value, String> {
    parse_float(text).map(Value::Float)
}

fn cast_bool(text: &str) -> std::result::Result<Value, String> {
    match text.to_lowercase().as_str() {
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        _ => Err(format!("expected `true` or `false`, got `{text}`")),
    }
}

fn cast_none(text: &str) -> std::result::Result<Value, String> {
    if text.is_empty() {
        Ok(Value::Null)
    } else {
        Err(format!("unexpected `{text}` after none marker"))
    }
}

fn cast_python(text: &str) -> std::result::Result<Value, String> {
    literal::eval(text).map_err(|e| e.to_string())
}

fn cast_json(text: &str) -> std::result::Result<Value, String> {
    serde_json::from_str::<serde_json::Value>(text)
        .map(Value::from)
        .map_err(|e| e.to_string())
}

fn cast_toml(text: &str) -> std::result::Result<Value, String> {
    toml::from_str::<toml::Table>(text)
        .map(|table| Value::from(toml::Value::Table(table)))
        .map_err(|e| e.to_string())
}

/// Casts one value with the first caster that matches and converts.
///
/// Non-string values are returned unchanged, as are strings no caster
/// accepts. Caster failures are skipped, never reported.
#[must_use]
pub fn cast_value(value: Value, casters: &[Caster]) -> Value {
    let Value::String(text) = value else {
        return value;
    };
    casters
        .iter()
        .find_map(|caster| caster.try_cast(&text).ok())
        .unwrap_or(Value::String(text))
}

/// Casts every value of a fragment, recursing into nested mappings.
///
/// Sequences are leaves: their items are not cast.
///
/// # Examples
///
/// ```
/// use layerconf::caster::{cast, DEFAULT_CASTERS};
/// use layerconf::Value;
///
/// let loaded = Value::from(serde_json::json!({"db": {"port": "@int:5432"}}))
///     .into_mapping()
///     .unwrap();
/// let cast = cast(loaded, DEFAULT_CASTERS);
/// assert_eq!(cast["db"].as_mapping().unwrap()["port"], Value::Integer(5432));
/// ```
#[must_use]
pub fn cast(fragment: Fragment, casters: &[Caster]) -> Fragment {
    if casters.is_empty() {
        return fragment;
    }
    fragment
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Mapping(nested) => Value::Mapping(cast(nested, casters)),
                other => cast_value(other, casters),
            };
            (key, value)
        })
        .collect()
}
