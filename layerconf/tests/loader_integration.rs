//! Integration tests for format loaders over real files.
//!
//! Tests that set environment variables are `#[serial]`; everything else
//! runs in parallel.

mod common;

use std::io::Cursor;
use std::sync::Arc;

use common::{capture_warnings, frag, write_fixture, EnvGuard};
use layerconf::loader::{JsonLoader, Loader};
use layerconf::{Config, Error, LoadOptions, LoaderChoice, Loaders, ProfileConfig, Source, Value};
use serde_json::json;
use serial_test::serial;
use tempfile::TempDir;

// ============================================================================
// Flat loading
// ============================================================================

#[test]
fn test_each_format_from_file() {
    let dir = TempDir::new().unwrap();
    let files = [
        ("app.ini", "[default]\nport = @int:1\n"),
        ("app.cfg", "[default]\nport = @int:1\n"),
        ("apprc", "[default]\nport = @int:1\n"),
        ("app.json", r#"{"port": 1}"#),
        ("app.yaml", "port: 1\n"),
        ("app.yml", "port: 1\n"),
        ("app.toml", "port = 1\n"),
        ("app.env", "port=@int:1\n"),
    ];
    for (name, content) in files {
        let path = write_fixture(dir.path(), name, content);
        let loaded = Config::load_one(Source::file(path), None, &LoadOptions::default())
            .unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(loaded["port"], Value::Integer(1), "{name}");
    }
}

#[test]
fn test_structured_formats_do_not_cast() {
    let dir = TempDir::new().unwrap();
    let files = [
        ("app.json", r#"{"port": "@int:1", "off": "@none"}"#),
        ("app.yaml", "port: \"@int:1\"\noff: \"@none\"\n"),
    ];
    for (name, content) in files {
        let path = write_fixture(dir.path(), name, content);
        let loaded = Config::load_one(Source::file(path), None, &LoadOptions::default()).unwrap();
        assert_eq!(loaded["port"].as_str(), Some("@int:1"), "{name}");
        assert_eq!(loaded["off"].as_str(), Some("@none"), "{name}");
    }
}

#[test]
fn test_sources_merge_in_order() {
    let dir = TempDir::new().unwrap();
    let base = write_fixture(
        dir.path(),
        "base.toml",
        "name = \"app\"\n[db]\nhost = \"localhost\"\nport = 5432\n",
    );
    let local = write_fixture(dir.path(), "local.yaml", "db:\n  host: db.internal\n");
    let merged = Config::load(
        [Source::file(base), Source::file(local)],
        Loaders::Auto,
        &LoadOptions::default(),
    )
    .unwrap();
    assert_eq!(
        Value::Mapping(merged),
        Value::from(json!({"name": "app", "db": {"host": "db.internal", "port": 5432}}))
    );
}

#[test]
fn test_explicit_loader_overrides_extension() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "settings.txt", "a = 1\n");
    let loaded = Config::load_one(
        Source::file(path),
        Some("toml".into()),
        &LoadOptions::default(),
    )
    .unwrap();
    assert_eq!(loaded["a"].as_i64(), Some(1));
}

#[test]
fn test_text_variants_and_readers() {
    let loaded = Config::load(
        [
            Source::text("a: 1\n"),
            Source::reader(Cursor::new(r#"{"b": 2}"#)),
        ],
        Loaders::PerSource(vec![Some("yamls".into()), Some("json".into())]),
        &LoadOptions::default(),
    )
    .unwrap();
    assert_eq!(Value::Mapping(loaded), Value::from(json!({"a": 1, "b": 2})));
}

#[test]
fn test_custom_loader_choice() {
    let loader: Arc<dyn Loader> = Arc::new(JsonLoader);
    let loaded = Config::load_one(
        Source::text(r#"{"x": 1.5}"#),
        Some(LoaderChoice::Custom(loader)),
        &LoadOptions::default(),
    )
    .unwrap();
    assert_eq!(loaded["x"].as_f64(), Some(1.5));
}

#[test]
fn test_missing_file() {
    let err = Config::load_one(
        Source::file("/nonexistent/layerconf/app.ini"),
        None,
        &LoadOptions::default(),
    )
    .unwrap_err();
    assert!(err.is_not_found());

    let loaded = Config::load_one(
        Source::file("/nonexistent/layerconf/app.ini"),
        None,
        &LoadOptions::new().ignore_missing(true),
    )
    .unwrap();
    assert!(loaded.is_empty());
}

#[test]
fn test_loader_count_mismatch() {
    let err = Config::load(
        [Source::text("a = 1")],
        Loaders::PerSource(vec![Some("toml".into()), Some("ini".into())]),
        &LoadOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::LoaderCountMismatch { .. }));
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "app.xml", "<a/>");
    let err = Config::load_one(Source::file(path), None, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, Error::FormatNotSupported { .. }));
}

#[test]
fn test_ini_warns_once_and_loads_default() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(
        dir.path(),
        "app.ini",
        "[default]\na = @int:1\nb = @int:2\n\n[test]\na = @int:3\n",
    );
    let (loaded, warnings) =
        capture_warnings(|| Config::load_one(Source::file(path), None, &LoadOptions::default()));
    assert_eq!(Value::Mapping(loaded.unwrap()), Value::from(json!({"a": 1, "b": 2})));
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("More than one section found"));
}

#[test]
fn test_ini_single_non_default_section_errors() {
    let err = Config::load_one(
        Source::text("[test]\na = 1\n"),
        Some("ini".into()),
        &LoadOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::NoDefaultSection { .. }));
    let err = Config::load_one(Source::text(""), Some("ini".into()), &LoadOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::NoDefaultSection { .. }));
}

// ============================================================================
// Templates
// ============================================================================

fn render_port(content: &str) -> Result<String, String> {
    Ok(content.replace("{{ port }}", "9000"))
}

#[test]
fn test_templated_file_is_rendered() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "app.toml.j2", "port = {{ port }}\n");
    let options = LoadOptions::new().with_transform("j2", render_port);
    let loaded = Config::load_one(Source::file(path), None, &options).unwrap();
    assert_eq!(loaded["port"].as_i64(), Some(9000));
}

#[test]
fn test_template_without_engine_is_unsupported() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "app.liquid.yaml", "port: 1\n");
    let options = LoadOptions::new().with_transform("j2", render_port);
    let err = Config::load_one(Source::file(path), None, &options).unwrap_err();
    assert!(matches!(err, Error::FormatNotSupported { format } if format == "yaml.liq"));
}

// ============================================================================
// Environment
// ============================================================================

#[test]
#[serial]
fn test_osenv_flat_strips_namespace() {
    let _a = EnvGuard::new("LAYERCONF_IT_PORT", "@int:8000");
    let _b = EnvGuard::new("LAYERCONF_IT_DEBUG", "@bool:true");
    let _other = EnvGuard::new("LAYERCONF_OTHER_PORT", "1");

    let loaded =
        Config::load_one(Source::env("LAYERCONF_IT"), None, &LoadOptions::default()).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded["PORT"].as_i64(), Some(8000));
    assert_eq!(loaded["DEBUG"].as_bool(), Some(true));
}

#[test]
#[serial]
fn test_osenv_file_name_is_namespace() {
    let _a = EnvGuard::new("LAYERCONF_FILE_KEY", "value");
    let dir = TempDir::new().unwrap();
    // never created: the name alone selects the namespace
    let path = dir.path().join("LAYERCONF_FILE.osenv");
    let loaded = Config::load_one(Source::file(path), None, &LoadOptions::default()).unwrap();
    assert_eq!(loaded["KEY"].as_str(), Some("value"));
}

#[test]
#[serial]
fn test_osenv_profiles() {
    let _a = EnvGuard::new("LAYERCONF_PROF_DEFAULT_A", "@int:1");
    let _b = EnvGuard::new("LAYERCONF_PROF_DEFAULT_B", "@int:2");
    let _c = EnvGuard::new("LAYERCONF_PROF_TEST_A", "@int:3");
    let _d = EnvGuard::new("LAYERCONF_PROF_LONELY", "x");

    let (config, warnings) = capture_warnings(|| {
        ProfileConfig::load_one(Source::env("LAYERCONF_PROF"), None, LoadOptions::default())
    });
    let mut config = config.unwrap();
    assert!(warnings
        .iter()
        .any(|w| w.contains("No profile name found in key: LONELY")));
    assert_eq!(config.profiles(), vec!["default", "test"]);

    config.use_profile("test", Some("default")).unwrap();
    assert_eq!(Value::Mapping(config.detach()), Value::from(json!({"A": 3, "B": 2})));
}

#[test]
fn test_dotenv_profiles_merge_with_ini() {
    let dir = TempDir::new().unwrap();
    let ini = write_fixture(dir.path(), "app.ini", "[default]\nHOST = h\n[prod]\nHOST = p\n");
    let env = write_fixture(dir.path(), ".env", "PROD_PORT=@int:443\ndefault_PORT=@int:80\n");
    let mut config =
        ProfileConfig::load([Source::file(ini), Source::file(env)], Loaders::Auto, LoadOptions::default())
            .unwrap();
    assert_eq!(
        Value::Mapping(config.detach()),
        Value::from(json!({"HOST": "h", "PORT": 80}))
    );
    config.use_profile("prod", Some("default")).unwrap();
    assert_eq!(
        Value::Mapping(config.detach()),
        Value::from(json!({"HOST": "p", "PORT": 443}))
    );
    assert_eq!(config.pool().get("prod"), Some(&frag(json!({"HOST": "p", "PORT": 443}))));
}
