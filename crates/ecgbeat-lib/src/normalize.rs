/// Peak amplitude above which samples are taken to be raw device units.
pub const RAW_UNITS_THRESHOLD: f64 = 100.0;
/// Baseline offset of the acquisition front end, in device units.
pub const RAW_BASELINE: f64 = 2000.0;
/// Device units per millivolt.
pub const RAW_GAIN: f64 = 1600.0;

/// Returns true when the waveform looks like raw device units.
pub fn is_raw_units(samples: &[f64]) -> bool {
    samples.iter().any(|&x| x > RAW_UNITS_THRESHOLD)
}

/// Rescale raw device units to millivolts; millivolt input passes through unchanged.
pub fn normalize(samples: Vec<f64>) -> Vec<f64> {
    if !is_raw_units(&samples) {
        return samples;
    }
    samples
        .into_iter()
        .map(|x| (x - RAW_BASELINE) / RAW_GAIN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millivolt_signal_is_untouched() {
        let samples = vec![-1.2, 0.0, 0.8, 100.0, 42.0];
        assert_eq!(normalize(samples.clone()), samples);
    }

    #[test]
    fn flat_signal_below_threshold_is_identity() {
        let samples = vec![50.0; 500];
        assert_eq!(normalize(samples.clone()), samples);
    }

    #[test]
    fn device_units_are_rescaled() {
        let samples = vec![2000.0, 2500.0, 400.0, 3600.0];
        let out = normalize(samples.clone());
        for (x, y) in samples.iter().zip(out.iter()) {
            assert!((y - (x - 2000.0) / 1600.0).abs() < 1e-12);
        }
        assert!((out[1] - 0.3125).abs() < 1e-12);
    }

    #[test]
    fn empty_signal_passes_through() {
        assert!(normalize(Vec::new()).is_empty());
    }
}
