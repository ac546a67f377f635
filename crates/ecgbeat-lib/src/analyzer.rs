use crate::detectors::delineate::{delineate, DelineationConfig};
use crate::detectors::ecg::{clean_ecg, detect_r_peaks_with_config, EcgPipelineConfig};
use crate::error::Result;
use crate::metrics::rate::instantaneous_rate;
use crate::metrics::sqi::evaluate_sqi;
use crate::segment::segment_beats;
use crate::signal::{Beat, Events, FiducialPeaks, ProcessedSignal, TimeSeries};
use crate::window::BeatWindow;

/// Signal-analysis operations the beat pipeline delegates to.
///
/// `segment` and `rate` have stock implementations; an analyzer only has to
/// supply cleaning, quality scoring and fiducial detection.
pub trait SignalAnalyzer: Send + Sync {
    /// Filtered copy of `signal`, same length.
    fn clean(&self, signal: &TimeSeries) -> Result<TimeSeries>;

    /// Scalar quality score of a cleaned signal.
    fn quality(&self, cleaned: &TimeSeries) -> Result<f64>;

    /// Clean the signal and annotate its fiducial points.
    fn process(&self, signal: &TimeSeries) -> Result<(ProcessedSignal, FiducialPeaks)>;

    /// One beat per R peak, spanning `window` around it.
    fn segment(
        &self,
        processed: &ProcessedSignal,
        r_peaks: &Events,
        window: &BeatWindow,
    ) -> Result<Vec<Beat>> {
        Ok(segment_beats(processed, r_peaks, window))
    }

    /// Instantaneous heart rate resampled to `desired_length` samples.
    fn rate(&self, r_peaks: &Events, fs: f64, desired_length: usize) -> Result<Vec<f64>> {
        instantaneous_rate(r_peaks, fs, desired_length)
    }
}

/// In-process analyzer built on the Pan–Tompkins detector, window-based
/// delineation and fuzzy signal-quality indices.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeAnalyzer {
    pub ecg: EcgPipelineConfig,
    pub delineation: DelineationConfig,
}

impl NativeAnalyzer {
    pub fn new(ecg: EcgPipelineConfig, delineation: DelineationConfig) -> Self {
        Self { ecg, delineation }
    }
}

impl SignalAnalyzer for NativeAnalyzer {
    fn clean(&self, signal: &TimeSeries) -> Result<TimeSeries> {
        Ok(clean_ecg(signal, &self.ecg))
    }

    fn quality(&self, cleaned: &TimeSeries) -> Result<f64> {
        Ok(evaluate_sqi(cleaned, &self.ecg).grade)
    }

    fn process(&self, signal: &TimeSeries) -> Result<(ProcessedSignal, FiducialPeaks)> {
        let cleaned = clean_ecg(signal, &self.ecg);
        let r_peaks = detect_r_peaks_with_config(&cleaned, &self.ecg);
        let peaks = delineate(&cleaned, &r_peaks, &self.delineation);
        let processed =
            ProcessedSignal::from_peaks(signal.fs, signal.data.clone(), cleaned.data, &peaks);
        Ok((processed, peaks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Fiducial;
    use crate::synth::{synthetic_ecg, SyntheticEcg};

    #[test]
    fn process_flags_every_r_peak() {
        let shape = SyntheticEcg::regular(6, 80.0);
        let ts = TimeSeries::new(synthetic_ecg(&shape));
        let analyzer = NativeAnalyzer::default();
        let (processed, peaks) = analyzer.process(&ts).unwrap();
        assert_eq!(processed.len(), ts.len());
        assert_eq!(processed.raw, ts.data);
        assert_eq!(peaks.r.len(), 6);
        for &r in &peaks.r.indices {
            assert!(processed.flags[r].contains(Fiducial::R));
        }
    }

    #[test]
    fn default_rate_and_segment_are_available() {
        let analyzer = NativeAnalyzer::default();
        let r = Events::from_indices(vec![100, 350, 600]);
        let rate = analyzer.rate(&r, 250.0, 700).unwrap();
        assert_eq!(rate.len(), 700);
        let (processed, _) = analyzer.process(&TimeSeries::new(vec![0.0; 700])).unwrap();
        let window = BeatWindow::from_heart_rate(60.0).unwrap();
        let beats = analyzer.segment(&processed, &r, &window).unwrap();
        assert_eq!(beats.len(), 3);
    }
}
