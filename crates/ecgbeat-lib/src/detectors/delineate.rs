use crate::signal::{Events, FiducialPeaks, TimeSeries};

/// Search windows (seconds) used to place the P, Q, S and T waves around each R peak.
#[derive(Debug, Clone, Copy)]
pub struct DelineationConfig {
    pub q_search_s: f64,
    pub s_search_s: f64,
    pub p_search_s: f64,
    pub qrs_gap_s: f64,
    pub t_offset_s: f64,
    pub t_max_s: f64,
    /// Fraction of the following RR interval the T search may cover.
    pub t_rr_fraction: f64,
}

impl Default for DelineationConfig {
    fn default() -> Self {
        Self {
            q_search_s: 0.060,
            s_search_s: 0.080,
            p_search_s: 0.250,
            qrs_gap_s: 0.020,
            t_offset_s: 0.080,
            t_max_s: 0.450,
            t_rr_fraction: 0.6,
        }
    }
}

/// Locate P, Q, S and T around each R peak of a cleaned signal.
///
/// A wave is left out for a beat when its search window is empty, so every
/// set holds at most one index per beat.
pub fn delineate(ts: &TimeSeries, r_peaks: &Events, cfg: &DelineationConfig) -> FiducialPeaks {
    let data = &ts.data;
    let secs = |s: f64| (s * ts.fs).round() as usize;
    let mut out = FiducialPeaks {
        r: r_peaks.clone(),
        ..Default::default()
    };
    if data.is_empty() {
        return out;
    }

    let peaks = &r_peaks.indices;
    for (k, &r) in peaks.iter().enumerate() {
        if r >= data.len() {
            continue;
        }
        let prev_mid = if k > 0 { (peaks[k - 1] + r) / 2 } else { 0 };
        let next_mid = peaks
            .get(k + 1)
            .map(|&next| (r + next) / 2)
            .unwrap_or(data.len());
        let rr_next = peaks
            .get(k + 1)
            .map(|&next| next - r)
            .or_else(|| k.checked_sub(1).map(|p| r - peaks[p]));

        let q = argmin(data, r.saturating_sub(secs(cfg.q_search_s)).max(prev_mid), r);
        let s = argmin(data, r + 1, (r + 1 + secs(cfg.s_search_s)).min(next_mid));

        if let Some(q) = q {
            out.q.indices.push(q);
            let p_end = q.saturating_sub(secs(cfg.qrs_gap_s));
            let p_start = q.saturating_sub(secs(cfg.p_search_s)).max(prev_mid);
            if let Some(p) = argmax(data, p_start, p_end) {
                out.p.indices.push(p);
            }
        }

        if let Some(s) = s {
            out.s.indices.push(s);
            let reach = match rr_next {
                Some(rr) => secs(cfg.t_max_s).min((rr as f64 * cfg.t_rr_fraction) as usize),
                None => secs(cfg.t_max_s),
            };
            let t_start = s + secs(cfg.t_offset_s);
            let t_end = (r + reach).min(next_mid);
            if let Some(t) = argmax(data, t_start, t_end) {
                out.t.indices.push(t);
            }
        }
    }
    out
}

fn argmin(data: &[f64], start: usize, end: usize) -> Option<usize> {
    let end = end.min(data.len());
    (start < end).then(|| {
        (start..end).fold(start, |best, j| if data[j] < data[best] { j } else { best })
    })
}

fn argmax(data: &[f64], start: usize, end: usize) -> Option<usize> {
    let end = end.min(data.len());
    (start < end).then(|| {
        (start..end).fold(start, |best, j| if data[j] > data[best] { j } else { best })
    })
}
