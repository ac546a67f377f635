use crate::error::{EcgError, Result};
use crate::io::text::{read_f64_series, read_tsv_recording};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// JSON request body carrying one waveform.
#[derive(Debug, Clone, Deserialize)]
pub struct EcgRequest {
    pub ecg: Vec<f64>,
}

impl EcgRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let request: Self = serde_json::from_slice(body)
            .map_err(|e| EcgError::MalformedInput(format!("invalid request body: {}", e)))?;
        if request.ecg.is_empty() {
            return Err(EcgError::MalformedInput("\"ecg\" has no samples".to_string()));
        }
        Ok(request)
    }
}

/// Where a waveform comes from. Every source feeds the same pipeline.
#[derive(Debug, Clone)]
pub enum EcgSource {
    /// Raw JSON body `{"ecg": [...]}`.
    Json(Vec<u8>),
    /// Tab-separated recording with a header row.
    TsvFile(PathBuf),
    /// One sample per line.
    TextFile(PathBuf),
}

impl EcgSource {
    pub fn load(&self) -> Result<Vec<f64>> {
        match self {
            EcgSource::Json(body) => Ok(EcgRequest::from_slice(body)?.ecg),
            EcgSource::TsvFile(path) => {
                ensure_exists(path)?;
                read_tsv_recording(path).map_err(|e| EcgError::MalformedInput(format!("{:#}", e)))
            }
            EcgSource::TextFile(path) => {
                ensure_exists(path)?;
                read_f64_series(path).map_err(|e| EcgError::MalformedInput(format!("{:#}", e)))
            }
        }
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(EcgError::InputNotFound(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_without_ecg_is_malformed() {
        let err = EcgSource::Json(br#"{"signal": [1, 2]}"#.to_vec()).load().unwrap_err();
        assert!(matches!(err, EcgError::MalformedInput(_)));
        assert!(err.to_string().contains("ecg"));
    }

    #[test]
    fn non_numeric_samples_are_malformed() {
        let err = EcgSource::Json(br#"{"ecg": [1, "x"]}"#.to_vec()).load().unwrap_err();
        assert!(matches!(err, EcgError::MalformedInput(_)));
        let err = EcgSource::Json(br#"{"ecg": []}"#.to_vec()).load().unwrap_err();
        assert!(matches!(err, EcgError::MalformedInput(_)));
    }

    #[test]
    fn integer_samples_are_accepted() {
        let samples = EcgSource::Json(br#"{"ecg": [2000, 2100.5]}"#.to_vec())
            .load()
            .unwrap();
        assert_eq!(samples, vec![2000.0, 2100.5]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = EcgSource::TsvFile(dir.path().join("ecg_data.txt"))
            .load()
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn tsv_file_loads_first_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ecg_data.txt");
        std::fs::write(&path, "ecg\n1.0\n2.0\n").unwrap();
        assert_eq!(EcgSource::TsvFile(path).load().unwrap(), vec![1.0, 2.0]);
    }
}
