//! Common test utilities for integration tests.
//!
//! Fixture writers, an environment variable guard and a capturing logger for
//! asserting on warnings.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::thread::{self, ThreadId};

use layerconf::{Fragment, Value};
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Writes `content` to `dir/filename` and returns the path.
#[allow(dead_code)]
pub fn write_fixture(dir: &Path, filename: &str, content: &str) -> PathBuf {
    let path = dir.join(filename);
    fs::write(&path, content).unwrap();
    path
}

/// Converts a JSON literal into a fragment.
#[allow(dead_code)]
pub fn frag(value: serde_json::Value) -> Fragment {
    Value::from(value).into_mapping().unwrap()
}

/// RAII guard for setting and restoring environment variables.
///
/// Tests using it must be `#[serial]`.
#[allow(dead_code)]
pub struct EnvGuard {
    key: String,
    old_value: Option<String>,
}

#[allow(dead_code)]
impl EnvGuard {
    /// Sets `key` to `value` until dropped.
    pub fn new(key: &str, value: &str) -> Self {
        let old_value = env::var(key).ok();
        env::set_var(key, value);
        Self {
            key: key.to_string(),
            old_value,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.old_value {
            Some(value) => env::set_var(&self.key, value),
            None => env::remove_var(&self.key),
        }
    }
}

struct CaptureLogger {
    records: Mutex<Vec<(ThreadId, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            self.records
                .lock()
                .unwrap()
                .push((thread::current().id(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<CaptureLogger> = OnceLock::new();

fn logger() -> &'static CaptureLogger {
    LOGGER.get_or_init(|| CaptureLogger {
        records: Mutex::new(Vec::new()),
    })
}

/// Runs `f` and returns its result with the warnings it logged on this thread.
#[allow(dead_code)]
pub fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        if log::set_logger(logger()).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });

    let id = thread::current().id();
    logger().records.lock().unwrap().retain(|(t, _)| *t != id);
    let result = f();
    let mut warnings = Vec::new();
    logger().records.lock().unwrap().retain(|(t, message)| {
        if *t == id {
            warnings.push(message.clone());
            false
        } else {
            true
        }
    });
    (result, warnings)
}
