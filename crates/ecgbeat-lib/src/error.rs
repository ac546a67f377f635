use thiserror::Error;

/// Failures surfaced by the beat analysis pipeline.
#[derive(Debug, Error)]
pub enum EcgError {
    /// The request carried no usable waveform.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// A file-sourced recording could not be located.
    #[error("{0} not found")]
    InputNotFound(String),
    /// Rate or window arithmetic has no defined result for this signal.
    #[error("computation failed: {0}")]
    Computation(String),
    /// The signal-analysis collaborator failed.
    #[error("signal analysis failed: {0}")]
    Analysis(String),
}

impl EcgError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EcgError::InputNotFound(_))
    }
}

pub type Result<T, E = EcgError> = std::result::Result<T, E>;
