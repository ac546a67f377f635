use crate::error::{EcgError, Result};
use serde::{Deserialize, Serialize};

/// Share of the beat period placed before the R peak.
pub const RATIO_PRE: f64 = 0.35;

/// Asymmetric span around each R peak, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatWindow {
    /// Time before the R peak (positive seconds).
    pub pre_offset: f64,
    /// Time after the R peak (positive seconds).
    pub post_offset: f64,
    /// Heart rate the window was derived from (bpm).
    pub heart_rate: f64,
}

impl BeatWindow {
    /// Window for an average heart rate: 35 % of the beat period before the R
    /// peak and 65 % after it.
    pub fn from_heart_rate(heart_rate: f64) -> Result<Self> {
        if !heart_rate.is_finite() || heart_rate <= 0.0 {
            return Err(EcgError::Computation(format!(
                "cannot derive a beat window from heart rate {}",
                heart_rate
            )));
        }
        let window_size = 60.0 / heart_rate;
        Ok(Self {
            pre_offset: RATIO_PRE * window_size,
            post_offset: (1.0 - RATIO_PRE) * window_size,
            heart_rate,
        })
    }

    /// Signed start of the window relative to the R peak.
    pub fn start(&self) -> f64 {
        -self.pre_offset
    }

    pub fn end(&self) -> f64 {
        self.post_offset
    }

    pub fn duration(&self) -> f64 {
        self.pre_offset + self.post_offset
    }

    /// `(start, end, heart_rate)` with a negative start.
    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.start(), self.end(), self.heart_rate)
    }

    /// Absolute sample span `[start, end)` of the beat anchored at `r_peak`.
    pub fn sample_span(&self, r_peak: usize, fs: f64) -> (i64, i64) {
        let onset = r_peak as f64;
        let start = (onset + self.start() * fs).floor() as i64;
        let end = (onset + self.end() * fs).floor() as i64;
        (start, end)
    }
}
