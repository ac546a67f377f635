use crate::signal::{nan_to_zero, Events, TimeSeries};

/// Configurable parameters for ECG cleaning and R-peak detection.
#[derive(Debug, Clone, Copy)]
pub struct EcgPipelineConfig {
    /// Baseline-wander high-pass cutoff applied when cleaning (Hz).
    pub baseline_hz: f64,
    /// Mains frequency removed by the cleaning smoother (Hz).
    pub powerline_hz: f64,
    /// Lower cutoff for the single-pole high-pass filter (Hz).
    pub lowcut_hz: f64,
    /// Upper cutoff for the single-pole low-pass filter (Hz).
    pub highcut_hz: f64,
    /// Moving window integration length (seconds).
    pub integration_window_s: f64,
    /// Minimum physiological RR distance / refractory period (seconds).
    pub min_rr_s: f64,
    /// Scale between noise and signal envelopes for the adaptive threshold.
    pub threshold_scale: f64,
    /// How far back to search (seconds) for the precise R-peak after a detection.
    pub search_back_s: f64,
}

impl Default for EcgPipelineConfig {
    fn default() -> Self {
        Self {
            baseline_hz: 0.5,
            powerline_hz: 50.0,
            lowcut_hz: 5.0,
            highcut_hz: 15.0,
            integration_window_s: 0.150,
            min_rr_s: 0.280,
            threshold_scale: 0.3,
            search_back_s: 0.150,
        }
    }
}

/// Remove baseline wander and mains interference. NaN samples come back as 0.
pub fn clean_ecg(ts: &TimeSeries, cfg: &EcgPipelineConfig) -> TimeSeries {
    if ts.is_empty() {
        return TimeSeries {
            fs: ts.fs,
            data: Vec::new(),
        };
    }
    let fs = ts.fs.max(1.0);
    let input = nan_to_zero(ts.data.clone());
    let highpassed = single_pole_highpass(&input, fs, cfg.baseline_hz);
    let win = ((fs / cfg.powerline_hz.max(1.0)).round() as usize).max(1);
    TimeSeries {
        fs: ts.fs,
        data: nan_to_zero(centered_boxcar(&highpassed, win)),
    }
}

/// Detect R-peaks using the configurable pipeline.
pub fn detect_r_peaks_with_config(ts: &TimeSeries, cfg: &EcgPipelineConfig) -> Events {
    if ts.is_empty() {
        return Events::from_indices(Vec::new());
    }

    let (bandpassed, integrated) = pan_tompkins_envelope(ts, cfg);
    let peaks = pick_peaks(&bandpassed, &integrated, ts.fs, cfg);

    if peaks.len() < 2 {
        // Fall back to the naive peak picker if the adaptive method underperformed.
        return Events::from_indices(fallback_peak_picker(ts, cfg));
    }

    Events::from_indices(refine_to_local_max(&ts.data, &peaks, ts.fs))
}

/// Naive local-maximum detector used as a second opinion for signal quality.
pub fn detect_r_peaks_naive(ts: &TimeSeries, cfg: &EcgPipelineConfig) -> Events {
    Events::from_indices(fallback_peak_picker(ts, cfg))
}

fn pan_tompkins_envelope(ts: &TimeSeries, cfg: &EcgPipelineConfig) -> (Vec<f64>, Vec<f64>) {
    let data = &ts.data;
    let fs = ts.fs.max(1.0);
    let bandpassed = bandpass(data, fs, cfg.lowcut_hz, cfg.highcut_hz);
    let derivative = derivative(&bandpassed);
    let squared = square(&derivative);
    let win = ((cfg.integration_window_s * fs).round() as usize).max(1);
    let integrated = moving_average(&squared, win);
    (bandpassed, integrated)
}

fn bandpass(data: &[f64], fs: f64, low: f64, high: f64) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let hp = if low > 0.0 {
        single_pole_highpass(data, fs, low)
    } else {
        data.to_vec()
    };
    if high <= 0.0 || high >= fs * 0.5 {
        hp
    } else {
        single_pole_lowpass(&hp, fs, high)
    }
}

fn single_pole_highpass(data: &[f64], fs: f64, cutoff: f64) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let dt = 1.0 / fs;
    let rc = 1.0 / (2.0 * std::f64::consts::PI * cutoff.max(0.01));
    let alpha = rc / (rc + dt);
    let mut out = Vec::with_capacity(data.len());
    let mut prev_y = 0.0;
    let mut prev_x = data[0];
    for &x in data {
        let y = alpha * (prev_y + x - prev_x);
        out.push(y);
        prev_y = y;
        prev_x = x;
    }
    out
}

fn single_pole_lowpass(data: &[f64], fs: f64, cutoff: f64) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let dt = 1.0 / fs;
    let rc = 1.0 / (2.0 * std::f64::consts::PI * cutoff.max(0.01));
    let alpha = dt / (rc + dt);
    let mut out = Vec::with_capacity(data.len());
    let mut prev = data[0];
    for &x in data {
        prev = prev + alpha * (x - prev);
        out.push(prev);
    }
    out
}

fn derivative(data: &[f64]) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; data.len()];
    for i in 1..data.len() {
        out[i] = data[i] - data[i - 1];
    }
    out
}

fn square(data: &[f64]) -> Vec<f64> {
    data.iter().map(|x| x * x).collect()
}

fn moving_average(data: &[f64], win: usize) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    if win <= 1 {
        return data.to_vec();
    }
    let mut out = vec![0.0; data.len()];
    let mut acc = 0.0;
    for (i, &sample) in data.iter().enumerate() {
        acc += sample;
        if i >= win {
            acc -= data[i - win];
        }
        out[i] = acc / win as f64;
    }
    out
}

/// Zero-phase boxcar: each output averages the window centred on its sample,
/// shrinking the window at the edges.
fn centered_boxcar(data: &[f64], win: usize) -> Vec<f64> {
    if win <= 1 || data.len() < 2 {
        return data.to_vec();
    }
    let half = win / 2;
    let mut prefix = Vec::with_capacity(data.len() + 1);
    prefix.push(0.0);
    for &x in data {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + x);
    }
    (0..data.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + win - half).min(data.len());
            (prefix[hi] - prefix[lo]) / (hi - lo) as f64
        })
        .collect()
}

fn pick_peaks(
    bandpassed: &[f64],
    envelope: &[f64],
    fs: f64,
    cfg: &EcgPipelineConfig,
) -> Vec<usize> {
    if bandpassed.is_empty() || envelope.is_empty() {
        return Vec::new();
    }

    let refractory = (cfg.min_rr_s * fs).round().clamp(1.0, f64::MAX) as usize;
    let search = (cfg.search_back_s * fs).round().max(1.0) as usize;

    let init = envelope.len().min((fs as usize).max(1));
    let avg = if init > 0 {
        envelope[..init].iter().sum::<f64>() / init as f64
    } else {
        0.0
    };
    if avg <= f64::EPSILON {
        return Vec::new();
    }
    let mut signal_level = avg;
    let mut noise_level = avg * 0.5;
    let mut threshold = noise_level + cfg.threshold_scale * (signal_level - noise_level).max(0.0);
    let mut last_peak_sample = 0usize;
    let mut peaks = Vec::new();

    for i in 0..envelope.len() {
        let sample = envelope[i];
        let refractory_ok = peaks.is_empty() || i - last_peak_sample >= refractory;
        if sample >= threshold && refractory_ok {
            let start = i.saturating_sub(search);
            let end = i.min(bandpassed.len() - 1);
            let mut idx = start;
            let mut max_val = f64::MIN;
            for j in start..=end {
                if bandpassed[j] > max_val {
                    max_val = bandpassed[j];
                    idx = j;
                }
            }
            peaks.push(idx);
            last_peak_sample = i;
            // Track the envelope crest of this beat, not the crossing value.
            let crest_end = (i + search).min(envelope.len());
            let crest = envelope[i..crest_end].iter().copied().fold(sample, f64::max);
            signal_level = 0.125 * crest + 0.875 * signal_level;
        } else if sample < threshold {
            noise_level = 0.125 * sample + 0.875 * noise_level;
        }

        threshold = noise_level + cfg.threshold_scale * (signal_level - noise_level).max(0.0);
    }

    peaks.sort_unstable();
    peaks.dedup();
    peaks
}

/// Move each detection onto the largest sample within 50 ms, undoing the
/// group delay of the band-pass stage.
fn refine_to_local_max(data: &[f64], peaks: &[usize], fs: f64) -> Vec<usize> {
    let radius = ((0.05 * fs).round() as usize).max(1);
    let mut refined: Vec<usize> = peaks
        .iter()
        .map(|&p| {
            let lo = p.saturating_sub(radius);
            let hi = (p + radius).min(data.len() - 1);
            (lo..=hi).fold(lo, |best, j| if data[j] > data[best] { j } else { best })
        })
        .collect();
    refined.dedup();
    refined
}

fn fallback_peak_picker(ts: &TimeSeries, cfg: &EcgPipelineConfig) -> Vec<usize> {
    let min_gap = (cfg.min_rr_s * ts.fs).max(1.0) as usize;
    let data = &ts.data;
    if data.len() < 3 {
        return Vec::new();
    }

    let win = ((0.150 * ts.fs) as usize).max(1);
    let ma = moving_average(data, win);
    let detrended: Vec<f64> = data.iter().zip(ma.iter()).map(|(x, m)| x - m).collect();
    // Only deflections comparable to the largest one count as R candidates.
    let gate = 0.4 * detrended.iter().copied().fold(0.0, f64::max);

    let mut peaks = Vec::new();
    let mut last_idx = 0usize;
    for i in 1..data.len() - 1 {
        let y = detrended[i];
        if y > 0.0 && y >= gate && y > detrended[i - 1] && y > detrended[i + 1] {
            if peaks.is_empty() || (i - last_idx) >= min_gap {
                peaks.push(i);
                last_idx = i;
            }
        }
    }
    peaks
}
