//! JSONL file writer for usage reports.
//!
//! Each [`UsageReport`] is serialized as a single JSON line with a `type`
//! field and `timestamp`, appended to the file via a buffered writer.

use consensus_application::{UsageLedger, UsageReport};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Record type written for every completed job
const RECORD_TYPE: &str = "usage_report";

/// JSONL usage ledger that appends one JSON object per completed job.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every record.
pub struct JsonlUsageLedger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlUsageLedger {
    /// Open (or create) the ledger file for appending.
    ///
    /// Creates parent directories if they don't exist. Returns `None` if
    /// the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create usage ledger directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open usage ledger {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UsageLedger for JsonlUsageLedger {
    fn record(&self, report: UsageReport) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let mut record = match serde_json::to_value(&report) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => return,
            Err(e) => {
                warn!(job_id = %report.job_id, "Could not serialize usage report: {}", e);
                return;
            }
        };
        record.insert("type".to_string(), RECORD_TYPE.into());
        record.insert("timestamp".to_string(), timestamp.into());

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!(job_id = %report.job_id, "Could not write usage report: {}", e);
        }
    }
}

impl Drop for JsonlUsageLedger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
