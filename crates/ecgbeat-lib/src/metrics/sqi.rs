use crate::detectors::ecg::{detect_r_peaks_naive, detect_r_peaks_with_config, EcgPipelineConfig};
use crate::signal::{Events, TimeSeries};
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grade assigned to signals that carry no usable information.
pub const WORST_GRADE: f64 = 3.0;

/// Categorical reading of the fuzzy quality grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityClass {
    Excellent,
    BarelyAcceptable,
    Unacceptable,
}

impl QualityClass {
    pub fn from_grade(grade: f64) -> Self {
        if grade.is_nan() || grade >= 2.4 {
            QualityClass::Unacceptable
        } else if grade < 1.5 {
            QualityClass::Excellent
        } else {
            QualityClass::BarelyAcceptable
        }
    }
}

impl fmt::Display for QualityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QualityClass::Excellent => "Excellent",
            QualityClass::BarelyAcceptable => "Barely acceptable",
            QualityClass::Unacceptable => "Unacceptable",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SQIResult {
    /// Agreement between two R-peak detectors, 0..1.
    pub q_sqi: f64,
    /// QRS band power ratio, 5-15 Hz over 5-40 Hz.
    pub p_sqi: f64,
    /// Excess kurtosis.
    pub k_sqi: f64,
    /// One minus the baseline (0-1 Hz) share of 0-40 Hz power.
    pub bas_sqi: f64,
    /// Fuzzy grade in [1, 3]; lower is cleaner.
    pub grade: f64,
    pub class: QualityClass,
}

pub fn compute_kurtosis(ts: &TimeSeries) -> f64 {
    let data = &ts.data;
    if data.is_empty() {
        return 0.0;
    }
    let mean = data.iter().copied().sum::<f64>() / data.len() as f64;
    let m2 = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / data.len() as f64;
    if m2 == 0.0 {
        return 0.0;
    }
    let m4 = data.iter().map(|x| (x - mean).powi(4)).sum::<f64>() / data.len() as f64;
    m4 / (m2 * m2)
}

pub fn compute_excess_kurtosis(ts: &TimeSeries) -> f64 {
    let k = compute_kurtosis(ts);
    if k == 0.0 {
        0.0
    } else {
        k - 3.0
    }
}

/// Periodogram power in `[lo_hz, hi_hz)`.
pub fn band_power(ts: &TimeSeries, lo_hz: f64, hi_hz: f64) -> f64 {
    let n = ts.data.len();
    if n < 2 {
        return 0.0;
    }
    let mut planner = RealFftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let mut buffer = ts.data.clone();
    let mut spectrum = fft.make_output_vec();
    if fft.process(&mut buffer, &mut spectrum).is_err() {
        return 0.0;
    }
    let df = ts.fs / n as f64;
    spectrum
        .iter()
        .enumerate()
        .filter(|(k, _)| {
            let f = *k as f64 * df;
            f >= lo_hz && f < hi_hz
        })
        .map(|(_, c)| c.norm_sqr())
        .sum()
}

pub fn compute_p_sqi(ts: &TimeSeries) -> f64 {
    let total = band_power(ts, 5.0, 40.0);
    if total <= 0.0 {
        return 0.0;
    }
    band_power(ts, 5.0, 15.0) / total
}

pub fn compute_bas_sqi(ts: &TimeSeries) -> f64 {
    let total = band_power(ts, 0.0, 40.0);
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - band_power(ts, 0.0, 1.0) / total
}

/// Matched detections over the union of both detector outputs.
pub fn compute_q_sqi(ts: &TimeSeries, cfg: &EcgPipelineConfig) -> f64 {
    let adaptive = detect_r_peaks_with_config(ts, cfg);
    let naive = detect_r_peaks_naive(ts, cfg);
    let tolerance = ((0.05 * ts.fs).round() as usize).max(1);
    detector_agreement(&adaptive, &naive, tolerance)
}

fn detector_agreement(a: &Events, b: &Events, tol: usize) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let mut matched = 0usize;
    let mut j = 0usize;
    for &x in &a.indices {
        while j < b.indices.len() && b.indices[j] + tol < x {
            j += 1;
        }
        if j < b.indices.len() && b.indices[j].abs_diff(x) <= tol {
            matched += 1;
            j += 1;
        }
    }
    matched as f64 / (a.len() + b.len() - matched) as f64
}

pub fn evaluate_sqi(ts: &TimeSeries, cfg: &EcgPipelineConfig) -> SQIResult {
    let q_sqi = compute_q_sqi(ts, cfg);
    let p_sqi = compute_p_sqi(ts);
    let k_sqi = compute_excess_kurtosis(ts);
    let bas_sqi = compute_bas_sqi(ts);
    let grade = fuzzy_grade(q_sqi, p_sqi, k_sqi, bas_sqi);
    SQIResult {
        q_sqi,
        p_sqi,
        k_sqi,
        bas_sqi,
        grade,
        class: QualityClass::from_grade(grade),
    }
}

/// Fuse the four indices into a grade in [1, 3] using (excellent, barely
/// acceptable, unacceptable) memberships weighted 0.4/0.4/0.1/0.1.
pub fn fuzzy_grade(q_sqi: f64, p_sqi: f64, k_sqi: f64, bas_sqi: f64) -> f64 {
    let rows = [
        q_memberships(q_sqi * 100.0),
        p_memberships(p_sqi),
        k_memberships(k_sqi),
        bas_memberships(bas_sqi),
    ];
    let weights = [0.4, 0.4, 0.1, 0.1];
    let mut s = [0.0f64; 3];
    for (row, w) in rows.iter().zip(weights) {
        for c in 0..3 {
            s[c] += row[c] * w;
        }
    }
    let energy: f64 = s.iter().map(|v| v * v).sum();
    if energy <= 0.0 || !energy.is_finite() {
        return WORST_GRADE;
    }
    s.iter()
        .enumerate()
        .map(|(c, v)| v * v * (c + 1) as f64)
        .sum::<f64>()
        / energy
}

fn q_memberships(q: f64) -> [f64; 3] {
    let high = if q <= 80.0 {
        0.0
    } else if q >= 90.0 {
        q / 100.0
    } else {
        1.0 / (1.0 + 1.0 / (0.3 * (q - 80.0)).powi(2))
    };
    let mid = 1.0 / (1.0 + ((q - 75.0) / 7.5).powi(2));
    let low = if q <= 55.0 {
        1.0
    } else {
        1.0 / (1.0 + ((q - 55.0) / 5.0).powi(2))
    };
    [high, mid, low]
}

fn p_memberships(p: f64) -> [f64; 3] {
    let high = ramp(p, 0.25, 0.35);
    let mid = if !(0.18..0.32).contains(&p) {
        0.0
    } else if p < 0.22 {
        25.0 * (p - 0.18)
    } else if p < 0.28 {
        1.0
    } else {
        25.0 * (0.32 - p)
    };
    let low = 1.0 - ramp(p, 0.15, 0.25);
    [high, mid, low]
}

fn k_memberships(k: f64) -> [f64; 3] {
    if k > 5.0 {
        [1.0, 0.0, 0.0]
    } else {
        [0.0, 0.0, 1.0]
    }
}

fn bas_memberships(b: f64) -> [f64; 3] {
    let high = ramp(b, 0.90, 0.95);
    let mid = 1.0 / (1.0 + ((b - 0.95) / 0.025).powi(2));
    let low = 1.0 - ramp(b, 0.85, 0.90);
    [high, mid, low]
}

/// 0 below `lo`, 1 above `hi`, linear between.
fn ramp(x: f64, lo: f64, hi: f64) -> f64 {
    ((x - lo) / (hi - lo)).clamp(0.0, 1.0)
}
