//! Optional line-appended debug log
//!
//! Enabled once at process startup and never revised under concurrency.
//! Every line carries a UTC timestamp; writes that fail are dropped rather
//! than surfaced, the log is diagnostics only.

use chrono::Utc;
use once_cell::sync::OnceCell;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tracing::warn;

static LOG_FILE: OnceCell<Option<Mutex<File>>> = OnceCell::new();

/// Enable the debug log at the given path. Only the first call wins;
/// subsequent calls are ignored. Passing `None` pins the log to disabled.
pub fn init(path: Option<&Path>) {
    LOG_FILE.get_or_init(|| {
        let path = path?;
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(Mutex::new(file)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "debug log unavailable");
                None
            }
        }
    });
}

/// True once `init` ran with a writable path.
pub fn is_enabled() -> bool {
    matches!(LOG_FILE.get(), Some(Some(_)))
}

/// Append one line. A no-op unless the log was enabled at startup.
pub fn append(line: &str) {
    if let Some(Some(file)) = LOG_FILE.get() {
        if let Ok(mut file) = file.lock() {
            let _ = writeln!(file, "{} {}", Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"), line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_before_init_is_noop() {
        // The OnceCell is process-wide; this test only asserts the call is
        // safe either way.
        append("orphan line");
    }

    #[test]
    fn test_init_and_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exploration.log");
        init(Some(&path));
        append("session started");
        if is_enabled() {
            let contents = std::fs::read_to_string(&path).unwrap();
            assert!(contents.contains("session started"));
        }
    }
}
