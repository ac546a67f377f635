use crate::record::ResultRecord;
use log::{debug, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Best-effort sink for diagnostic dumps of requests and results.
///
/// Implementations must never fail the request they observe.
pub trait TraceSink: Send + Sync {
    fn record_input(&self, stamp: &str, samples: &[f64]);
    fn record_result(&self, stamp: &str, result: &ResultRecord);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTrace;

impl TraceSink for NoTrace {
    fn record_input(&self, _stamp: &str, _samples: &[f64]) {}
    fn record_result(&self, _stamp: &str, _result: &ResultRecord) {}
}

/// Writes `ecg<stamp>.json` and `data<stamp>.json` into a directory.
#[derive(Debug, Clone)]
pub struct FileTrace {
    dir: PathBuf,
}

impl FileTrace {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn input_path(&self, stamp: &str) -> PathBuf {
        self.dir.join(format!("ecg{}.json", stamp))
    }

    pub fn result_path(&self, stamp: &str) -> PathBuf {
        self.dir.join(format!("data{}.json", stamp))
    }

    fn dump<T: Serialize + ?Sized>(&self, path: &Path, value: &T) {
        let written = fs::create_dir_all(&self.dir)
            .map_err(|e| e.to_string())
            .and_then(|_| serde_json::to_vec(value).map_err(|e| e.to_string()))
            .and_then(|bytes| fs::write(path, bytes).map_err(|e| e.to_string()));
        match written {
            Ok(()) => debug!("trace written to {}", path.display()),
            Err(err) => warn!("failed to write trace {}: {}", path.display(), err),
        }
    }
}

impl TraceSink for FileTrace {
    fn record_input(&self, stamp: &str, samples: &[f64]) {
        self.dump(&self.input_path(stamp), samples);
    }

    fn record_result(&self, stamp: &str, result: &ResultRecord) {
        self.dump(&self.result_path(stamp), result);
    }
}

/// Wall-clock stamp (`seconds.micros`) shared by the dumps of one request.
pub fn trace_stamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}
