use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Local;
use uuid::Uuid;

/// File-backed run logger shared by the mock server and the CLI. Every run
/// gets its own id so interleaved log files stay attributable.
#[derive(Debug, Clone)]
pub struct HarnessLogger {
    pub run_id: String,
    pub log_path: PathBuf,
    file: Arc<Mutex<File>>,
    emit_stdout: bool,
}

impl HarnessLogger {
    pub fn new() -> Result<Self> {
        Self::new_with_base_dir(std::env::current_dir()?.as_path(), true)
    }

    /// Logs under the system temp dir and keeps stdout quiet.
    pub fn new_for_tests() -> Self {
        let base = std::env::temp_dir().join("notes_harness_tests");
        Self::new_with_base_dir(&base, false).expect("test logger creation")
    }

    /// Logs under `base_dir/logs` without mirroring to stdout.
    pub fn with_base_dir(base_dir: &Path) -> Result<Self> {
        Self::new_with_base_dir(base_dir, false)
    }

    pub fn info(&self, message: &str) {
        self.log("INFO", message);
    }

    pub fn warn(&self, message: &str) {
        self.log("WARN", message);
    }

    pub fn error(&self, message: &str) {
        self.log("ERROR", message);
    }

    fn new_with_base_dir(base_dir: &Path, emit_stdout: bool) -> Result<Self> {
        let logs_dir = base_dir.join("logs");
        fs::create_dir_all(&logs_dir)
            .with_context(|| format!("failed to create logs dir: {}", logs_dir.display()))?;

        let date = Local::now().format("%Y%m%d").to_string();
        let log_path = logs_dir.join(format!("notes-harness-{date}.log"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("failed to open log file: {}", log_path.display()))?;

        let run_id = Uuid::new_v4().to_string();
        Ok(Self {
            run_id,
            log_path,
            file: Arc::new(Mutex::new(file)),
            emit_stdout,
        })
    }

    fn log(&self, level: &str, message: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("[{timestamp}] [{}] [{level}] {message}", self.run_id);
        if self.emit_stdout {
            println!("{line}");
        }
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{line}");
        }
    }
}
