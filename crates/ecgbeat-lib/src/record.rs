use crate::error::{EcgError, Result};
use crate::signal::{Beat, Fiducial};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Most beats returned in one result.
pub const MAX_BEATS: usize = 40;

/// `[sample index, cleaned amplitude]` of an annotated fiducial point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakAnnotation(pub i64, pub f64);

/// Compact, JSON-ready view of one segmented beat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeatRecord {
    #[serde(rename = "Index")]
    pub index: Vec<i64>,
    #[serde(rename = "ECG_Clean")]
    pub ecg_clean: Vec<f64>,
    #[serde(rename = "ECG_Raw")]
    pub ecg_raw: Vec<f64>,
    #[serde(rename = "Start_Index")]
    pub start_index: i64,
    #[serde(rename = "ECG_P_Peaks", skip_serializing_if = "Option::is_none")]
    pub p_peak: Option<PeakAnnotation>,
    #[serde(rename = "ECG_Q_Peaks", skip_serializing_if = "Option::is_none")]
    pub q_peak: Option<PeakAnnotation>,
    #[serde(rename = "ECG_R_Peaks", skip_serializing_if = "Option::is_none")]
    pub r_peak: Option<PeakAnnotation>,
    #[serde(rename = "ECG_S_Peaks", skip_serializing_if = "Option::is_none")]
    pub s_peak: Option<PeakAnnotation>,
    #[serde(rename = "ECG_T_Peaks", skip_serializing_if = "Option::is_none")]
    pub t_peak: Option<PeakAnnotation>,
}

impl BeatRecord {
    /// Convert a segmented beat. Fiducial annotations are overwritten on every
    /// flagged sample, so a type flagged more than once keeps its last sample.
    pub fn from_beat(beat: &Beat) -> Result<Self> {
        let start_index = beat.start_index().ok_or_else(|| {
            EcgError::Computation(format!("beat {} has no samples", beat.label))
        })?;
        let mut record = Self {
            index: Vec::with_capacity(beat.samples.len()),
            ecg_clean: Vec::with_capacity(beat.samples.len()),
            ecg_raw: Vec::with_capacity(beat.samples.len()),
            start_index,
            p_peak: None,
            q_peak: None,
            r_peak: None,
            s_peak: None,
            t_peak: None,
        };
        for sample in &beat.samples {
            let clean = finite_or_zero(sample.clean);
            record.index.push(sample.index);
            record.ecg_clean.push(clean);
            record.ecg_raw.push(finite_or_zero(sample.raw));
            for kind in Fiducial::ALL {
                if sample.flags.contains(kind) {
                    *record.annotation_mut(kind) = Some(PeakAnnotation(sample.index, clean));
                }
            }
        }
        Ok(record)
    }

    pub fn annotation(&self, kind: Fiducial) -> Option<PeakAnnotation> {
        match kind {
            Fiducial::P => self.p_peak,
            Fiducial::Q => self.q_peak,
            Fiducial::R => self.r_peak,
            Fiducial::S => self.s_peak,
            Fiducial::T => self.t_peak,
        }
    }

    fn annotation_mut(&mut self, kind: Fiducial) -> &mut Option<PeakAnnotation> {
        match kind {
            Fiducial::P => &mut self.p_peak,
            Fiducial::Q => &mut self.q_peak,
            Fiducial::R => &mut self.r_peak,
            Fiducial::S => &mut self.s_peak,
            Fiducial::T => &mut self.t_peak,
        }
    }
}

/// Records for the first [`MAX_BEATS`] beats, keyed by beat label.
pub fn build_beat_records(beats: &[Beat]) -> Result<Vec<(usize, BeatRecord)>> {
    beats
        .iter()
        .take(MAX_BEATS)
        .map(|beat| Ok((beat.label, BeatRecord::from_beat(beat)?)))
        .collect()
}

/// Final response: quality, average heart rate and labelled beats in time order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub quality: f64,
    pub heart_rate: f64,
    pub beats: Vec<(usize, BeatRecord)>,
}

impl ResultRecord {
    pub fn assemble(quality: f64, heart_rate: f64, beats: Vec<(usize, BeatRecord)>) -> Self {
        Self {
            quality: finite_or_zero(quality),
            heart_rate,
            beats,
        }
    }

    /// Heart rate with exactly two decimals.
    pub fn heart_rate_text(&self) -> String {
        format!("{:.2}", self.heart_rate)
    }

    pub fn beat(&self, label: usize) -> Option<&BeatRecord> {
        self.beats
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, record)| record)
    }
}

impl Serialize for ResultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.beats.len() + 2))?;
        map.serialize_entry("Quality", &self.quality)?;
        map.serialize_entry("Heart_Rate", &self.heart_rate_text())?;
        for (label, record) in &self.beats {
            map.serialize_entry(&label.to_string(), record)?;
        }
        map.end()
    }
}

/// JSON has no NaN or infinity; both are emitted as 0.
fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{BeatSample, FiducialFlags};

    fn beat(label: usize, start: i64, flags: &[(usize, Fiducial)]) -> Beat {
        let mut samples: Vec<BeatSample> = (0..10)
            .map(|k| BeatSample {
                index: start + k as i64,
                clean: k as f64 * 0.1,
                raw: k as f64,
                flags: FiducialFlags::empty(),
            })
            .collect();
        for &(pos, kind) in flags {
            samples[pos].flags.set(kind);
        }
        Beat {
            label,
            r_peak: (start + 5) as usize,
            samples,
        }
    }

    #[test]
    fn record_copies_samples_and_start() {
        let record = BeatRecord::from_beat(&beat(1, 100, &[])).unwrap();
        assert_eq!(record.index, (100..110).collect::<Vec<_>>());
        assert_eq!(record.ecg_raw[3], 3.0);
        assert_eq!(record.start_index, 100);
        assert!(Fiducial::ALL.iter().all(|&k| record.annotation(k).is_none()));
    }

    #[test]
    fn last_flagged_sample_wins() {
        let b = beat(1, 100, &[(2, Fiducial::T), (7, Fiducial::T), (5, Fiducial::R)]);
        let record = BeatRecord::from_beat(&b).unwrap();
        assert_eq!(record.t_peak, Some(PeakAnnotation(107, 0.7000000000000001)));
        assert_eq!(record.r_peak, Some(PeakAnnotation(105, 0.5)));
        assert_eq!(record.p_peak, None);
    }

    #[test]
    fn nan_amplitudes_are_emitted_as_zero() {
        let mut b = beat(1, 0, &[(4, Fiducial::Q)]);
        b.samples[4].clean = f64::NAN;
        b.samples[6].raw = f64::NAN;
        let record = BeatRecord::from_beat(&b).unwrap();
        assert_eq!(record.ecg_clean[4], 0.0);
        assert_eq!(record.ecg_raw[6], 0.0);
        assert_eq!(record.q_peak, Some(PeakAnnotation(4, 0.0)));
    }

    #[test]
    fn empty_beat_is_rejected() {
        let b = Beat {
            label: 3,
            r_peak: 0,
            samples: Vec::new(),
        };
        assert!(matches!(
            BeatRecord::from_beat(&b),
            Err(EcgError::Computation(_))
        ));
    }

    #[test]
    fn records_are_capped_at_forty() {
        let beats: Vec<Beat> = (1..=55).map(|k| beat(k, k as i64 * 20, &[])).collect();
        let records = build_beat_records(&beats).unwrap();
        assert_eq!(records.len(), MAX_BEATS);
        let labels: Vec<usize> = records.iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, (1..=40).collect::<Vec<_>>());
        let short = build_beat_records(&beats[..7]).unwrap();
        assert_eq!(short.len(), 7);
    }

    #[test]
    fn serializes_flat_object_in_label_order() {
        let beats = (1..=12).map(|k| beat(k, k as i64 * 20, &[(5, Fiducial::R)])).collect::<Vec<_>>();
        let record = ResultRecord::assemble(1.2, 61.0, build_beat_records(&beats).unwrap());
        let text = serde_json::to_string(&record).unwrap();
        assert!(text.starts_with(r#"{"Quality":1.2,"Heart_Rate":"61.00","1":{"Index":[20,"#));
        let pos_2 = text.find(r#""2":"#).unwrap();
        let pos_10 = text.find(r#""10":"#).unwrap();
        assert!(pos_2 < pos_10);

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let first = &value["1"];
        assert_eq!(first["Start_Index"], 20);
        assert_eq!(first["ECG_R_Peaks"][0], 25);
        assert!(first.get("ECG_P_Peaks").is_none());
    }

    #[test]
    fn heart_rate_text_has_two_decimals() {
        for (hr, text) in [(60.0, "60.00"), (72.456, "72.46"), (59.999, "60.00"), (101.5, "101.50")] {
            let record = ResultRecord::assemble(1.0, hr, Vec::new());
            assert_eq!(record.heart_rate_text(), text);
        }
    }
}
