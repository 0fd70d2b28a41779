//! Capturing logger for warning assertions in tests.

use std::sync::{Mutex, OnceLock};
use std::thread::{self, ThreadId};

use log::{Level, LevelFilter, Log, Metadata, Record};

struct CaptureLogger {
    records: Mutex<Vec<(ThreadId, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            let mut records = self.records.lock().unwrap();
            records.push((thread::current().id(), record.args().to_string()));
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

fn install() {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        if log::set_logger(logger()).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
}

/// Runs `f` and returns its result with the warnings it logged on this thread.
pub(crate) fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    install();
    let id = thread::current().id();
    logger().records.lock().unwrap().retain(|(t, _)| *t != id);
    let result = f();
    let mut records = logger().records.lock().unwrap();
    let mut warnings = Vec::new();
    records.retain(|(t, message)| {
        if *t == id {
            warnings.push(message.clone());
            false
        } else {
            true
        }
    });
    (result, warnings)
}
