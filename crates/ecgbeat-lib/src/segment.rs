use crate::signal::{Beat, BeatSample, Events, FiducialFlags, ProcessedSignal};
use crate::window::BeatWindow;

/// Cut one beat per R peak using the window offsets.
///
/// Samples that fall outside the signal keep their absolute index but carry
/// zero amplitude and no flags, so every beat spans the full window.
pub fn segment_beats(processed: &ProcessedSignal, r_peaks: &Events, window: &BeatWindow) -> Vec<Beat> {
    r_peaks
        .indices
        .iter()
        .enumerate()
        .map(|(k, &r)| {
            let (start, end) = window.sample_span(r, processed.fs);
            let samples = (start..end).map(|index| sample_at(processed, index)).collect();
            Beat {
                label: k + 1,
                r_peak: r,
                samples,
            }
        })
        .collect()
}

fn sample_at(processed: &ProcessedSignal, index: i64) -> BeatSample {
    let pos = usize::try_from(index).ok();
    let clean = pos.and_then(|i| processed.clean.get(i)).copied();
    let raw = pos.and_then(|i| processed.raw.get(i)).copied();
    let flags = pos.and_then(|i| processed.flags.get(i)).copied();
    BeatSample {
        index,
        clean: zero_if_missing(clean),
        raw: zero_if_missing(raw),
        flags: flags.unwrap_or_else(FiducialFlags::empty),
    }
}

fn zero_if_missing(value: Option<f64>) -> f64 {
    match value {
        Some(v) if !v.is_nan() => v,
        _ => 0.0,
    }
}
