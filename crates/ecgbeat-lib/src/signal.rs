use serde::{Deserialize, Serialize};

/// Sampling rate every stage of the pipeline assumes (Hz).
pub const SAMPLING_RATE: f64 = 250.0;

/// Basic typed time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn new(data: Vec<f64>) -> Self {
        Self {
            fs: SAMPLING_RATE,
            data,
        }
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }
    pub fn max(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::max)
    }
}

/// Point events on a timeline (e.g., R-peaks indices)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Events {
    pub indices: Vec<usize>,
}

impl Events {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }
    pub fn len(&self) -> usize {
        self.indices.len()
    }
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// The characteristic waveform landmarks annotated on each beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fiducial {
    P,
    Q,
    R,
    S,
    T,
}

impl Fiducial {
    pub const ALL: [Fiducial; 5] = [
        Fiducial::P,
        Fiducial::Q,
        Fiducial::R,
        Fiducial::S,
        Fiducial::T,
    ];

    /// Column name used in emitted beat records.
    pub fn column(self) -> &'static str {
        match self {
            Fiducial::P => "ECG_P_Peaks",
            Fiducial::Q => "ECG_Q_Peaks",
            Fiducial::R => "ECG_R_Peaks",
            Fiducial::S => "ECG_S_Peaks",
            Fiducial::T => "ECG_T_Peaks",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Per-sample set of fiducial flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiducialFlags(u8);

impl FiducialFlags {
    pub fn empty() -> Self {
        Self(0)
    }
    pub fn with(mut self, kind: Fiducial) -> Self {
        self.set(kind);
        self
    }
    pub fn set(&mut self, kind: Fiducial) {
        self.0 |= kind.bit();
    }
    pub fn contains(self, kind: Fiducial) -> bool {
        self.0 & kind.bit() != 0
    }
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Sample indices of every detected fiducial point, one ordered set per type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FiducialPeaks {
    pub p: Events,
    pub q: Events,
    pub r: Events,
    pub s: Events,
    pub t: Events,
}

impl FiducialPeaks {
    pub fn get(&self, kind: Fiducial) -> &Events {
        match kind {
            Fiducial::P => &self.p,
            Fiducial::Q => &self.q,
            Fiducial::R => &self.r,
            Fiducial::S => &self.s,
            Fiducial::T => &self.t,
        }
    }

    pub fn get_mut(&mut self, kind: Fiducial) -> &mut Events {
        match kind {
            Fiducial::P => &mut self.p,
            Fiducial::Q => &mut self.q,
            Fiducial::R => &mut self.r,
            Fiducial::S => &mut self.s,
            Fiducial::T => &mut self.t,
        }
    }
}

/// Cleaned signal with raw amplitudes and fiducial flags per sample.
#[derive(Debug, Clone)]
pub struct ProcessedSignal {
    pub fs: f64,
    pub raw: Vec<f64>,
    pub clean: Vec<f64>,
    pub flags: Vec<FiducialFlags>,
}

impl ProcessedSignal {
    /// Build the per-sample view from peak index sets. NaN amplitudes become 0.
    pub fn from_peaks(fs: f64, raw: Vec<f64>, clean: Vec<f64>, peaks: &FiducialPeaks) -> Self {
        let mut flags = vec![FiducialFlags::empty(); clean.len()];
        for kind in Fiducial::ALL {
            for &idx in &peaks.get(kind).indices {
                if let Some(flag) = flags.get_mut(idx) {
                    flag.set(kind);
                }
            }
        }
        Self {
            fs,
            raw: nan_to_zero(raw),
            clean: nan_to_zero(clean),
            flags,
        }
    }

    pub fn len(&self) -> usize {
        self.clean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clean.is_empty()
    }
}

/// One sample of a segmented beat. `index` is the absolute sample position and may
/// fall outside the source signal for beats at the edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatSample {
    pub index: i64,
    pub clean: f64,
    pub raw: f64,
    pub flags: FiducialFlags,
}

/// A segmented heartbeat around one R peak.
#[derive(Debug, Clone)]
pub struct Beat {
    /// 1-based ordinal in segmentation order.
    pub label: usize,
    pub r_peak: usize,
    pub samples: Vec<BeatSample>,
}

impl Beat {
    pub fn start_index(&self) -> Option<i64> {
        self.samples.first().map(|s| s.index)
    }
}

/// Replace NaN samples with 0.
pub fn nan_to_zero(mut data: Vec<f64>) -> Vec<f64> {
    for v in data.iter_mut() {
        if v.is_nan() {
            *v = 0.0;
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_track_each_fiducial() {
        let flags = FiducialFlags::empty().with(Fiducial::R).with(Fiducial::T);
        assert!(flags.contains(Fiducial::R));
        assert!(flags.contains(Fiducial::T));
        assert!(!flags.contains(Fiducial::P));
        assert!(!flags.is_empty());
    }

    #[test]
    fn processed_signal_marks_peaks_and_clears_nan() {
        let peaks = FiducialPeaks {
            r: Events::from_indices(vec![1, 10]),
            q: Events::from_indices(vec![0]),
            ..Default::default()
        };
        let processed = ProcessedSignal::from_peaks(
            SAMPLING_RATE,
            vec![1.0, f64::NAN, 3.0],
            vec![f64::NAN, 2.0, 3.0],
            &peaks,
        );
        assert_eq!(processed.clean, vec![0.0, 2.0, 3.0]);
        assert_eq!(processed.raw, vec![1.0, 0.0, 3.0]);
        assert!(processed.flags[0].contains(Fiducial::Q));
        assert!(processed.flags[1].contains(Fiducial::R));
        assert!(processed.flags[2].is_empty());
    }
}
