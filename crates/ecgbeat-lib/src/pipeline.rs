use crate::analyzer::SignalAnalyzer;
use crate::error::{EcgError, Result};
use crate::metrics::rate::mean_rate;
use crate::normalize::normalize;
use crate::record::{build_beat_records, ResultRecord};
use crate::signal::{nan_to_zero, Events, TimeSeries, SAMPLING_RATE};
use crate::trace::{trace_stamp, TraceSink};
use crate::window::BeatWindow;
use log::{debug, info};

/// Average heart rate (bpm) over a signal of `desired_length` samples.
pub fn estimate_heart_rate<A: SignalAnalyzer + ?Sized>(
    analyzer: &A,
    r_peaks: &Events,
    desired_length: usize,
) -> Result<f64> {
    let series = analyzer.rate(r_peaks, SAMPLING_RATE, desired_length)?;
    mean_rate(&series)
}

/// Run the full beat analysis on one waveform:
/// normalize, clean, score, process, rate, window, segment, build records.
pub fn analyze<A: SignalAnalyzer + ?Sized>(analyzer: &A, samples: Vec<f64>) -> Result<ResultRecord> {
    validate(&samples)?;
    let signal = TimeSeries::new(normalize(samples));

    let mut cleaned = analyzer.clean(&signal)?;
    cleaned.data = nan_to_zero(cleaned.data);
    let quality = analyzer.quality(&cleaned)?;
    info!("ECG quality: {:.3}", quality);

    let (processed, peaks) = analyzer.process(&signal)?;
    let heart_rate = estimate_heart_rate(analyzer, &peaks.r, cleaned.len())?;
    info!("Heart rate: {:.2} bpm from {} R peaks", heart_rate, peaks.r.len());

    let window = BeatWindow::from_heart_rate(heart_rate)?;
    debug!(
        "Beat window: {:.3}s before / {:.3}s after R",
        window.pre_offset, window.post_offset
    );

    let beats = analyzer.segment(&processed, &peaks.r, &window)?;
    let records = build_beat_records(&beats)?;
    info!("Segmented {} beats, returning {}", beats.len(), records.len());

    Ok(ResultRecord::assemble(quality, heart_rate, records))
}

/// [`analyze`] with the input and a successful result handed to `trace`.
pub fn analyze_traced<A: SignalAnalyzer + ?Sized>(
    analyzer: &A,
    samples: Vec<f64>,
    trace: &dyn TraceSink,
) -> Result<ResultRecord> {
    let stamp = trace_stamp();
    trace.record_input(&stamp, &samples);
    let result = analyze(analyzer, samples)?;
    trace.record_result(&stamp, &result);
    Ok(result)
}

fn validate(samples: &[f64]) -> Result<()> {
    if samples.is_empty() {
        return Err(EcgError::MalformedInput("ECG signal is empty".to_string()));
    }
    if let Some(pos) = samples.iter().position(|x| !x.is_finite()) {
        return Err(EcgError::MalformedInput(format!(
            "sample {} is not a finite number",
            pos
        )));
    }
    Ok(())
}
