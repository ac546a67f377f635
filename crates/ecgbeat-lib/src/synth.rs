//! Synthetic single-lead ECG built from Gaussian P, Q, R, S and T waves.

use crate::normalize::{RAW_BASELINE, RAW_GAIN};
use crate::signal::SAMPLING_RATE;
use serde::{Deserialize, Serialize};

/// Shape of a synthetic recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticEcg {
    pub fs: f64,
    pub beats: usize,
    pub bpm: f64,
    /// Silence before the first R peak (seconds).
    pub lead_in_s: f64,
    /// Signal kept after the last R peak (seconds).
    pub tail_s: f64,
    /// Emit device units (`x * 1600 + 2000`) instead of millivolts.
    pub raw_units: bool,
}

impl SyntheticEcg {
    pub fn regular(beats: usize, bpm: f64) -> Self {
        Self {
            fs: SAMPLING_RATE,
            beats,
            bpm,
            lead_in_s: 0.6,
            tail_s: 0.7,
            raw_units: false,
        }
    }

    fn period_samples(&self) -> usize {
        ((60.0 / self.bpm.max(1.0)) * self.fs).round() as usize
    }

    fn lead_in_samples(&self) -> usize {
        (self.lead_in_s * self.fs).round() as usize
    }

    /// Sample positions of the generated R waves.
    pub fn r_peak_indices(&self) -> Vec<usize> {
        let first = self.lead_in_samples();
        let period = self.period_samples();
        (0..self.beats).map(|k| first + k * period).collect()
    }

    pub fn len(&self) -> usize {
        let last = self
            .r_peak_indices()
            .last()
            .copied()
            .unwrap_or_else(|| self.lead_in_samples());
        last + (self.tail_s * self.fs).round() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// (offset from R in seconds, width in seconds, amplitude in mV)
const WAVES: [(f64, f64, f64); 5] = [
    (-0.200, 0.025, 0.15),
    (-0.030, 0.008, -0.15),
    (0.000, 0.010, 1.20),
    (0.030, 0.008, -0.25),
    (0.280, 0.045, 0.35),
];

fn gaussian_pulse(t: f64, center: f64, width: f64, amplitude: f64) -> f64 {
    let x = (t - center) / width;
    amplitude * (-0.5 * x * x).exp()
}

/// Render the recording described by `shape`.
pub fn synthetic_ecg(shape: &SyntheticEcg) -> Vec<f64> {
    let peaks: Vec<f64> = shape
        .r_peak_indices()
        .into_iter()
        .map(|idx| idx as f64 / shape.fs)
        .collect();
    (0..shape.len())
        .map(|i| {
            let time = i as f64 / shape.fs;
            let mv: f64 = peaks
                .iter()
                .filter(|&&bt| (time - bt).abs() < 0.6)
                .map(|&bt| {
                    WAVES
                        .iter()
                        .map(|&(offset, width, amp)| gaussian_pulse(time, bt + offset, width, amp))
                        .sum::<f64>()
                })
                .sum();
            if shape.raw_units {
                mv * RAW_GAIN + RAW_BASELINE
            } else {
                mv
            }
        })
        .collect()
}
