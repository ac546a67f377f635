use crate::error::{EcgError, Result};
use crate::signal::Events;

/// Fewest R peaks that define at least one RR interval.
pub const MIN_PEAKS_FOR_RATE: usize = 2;

/// RR intervals in seconds; the first peak is assigned the mean interval so the
/// result has one entry per peak.
pub fn peak_periods(events: &Events, fs: f64) -> Result<Vec<f64>> {
    if events.len() < MIN_PEAKS_FOR_RATE {
        return Err(EcgError::Computation(format!(
            "heart rate is undefined with {} R peak(s); at least {} are required",
            events.len(),
            MIN_PEAKS_FOR_RATE
        )));
    }
    if fs.is_nan() || fs <= 0.0 {
        return Err(EcgError::Computation(format!("invalid sampling rate {}", fs)));
    }
    let mut rr = Vec::with_capacity(events.len());
    for w in events.indices.windows(2) {
        if w[1] <= w[0] {
            return Err(EcgError::Computation(format!(
                "R peaks must be strictly increasing ({} then {})",
                w[0], w[1]
            )));
        }
        rr.push((w[1] - w[0]) as f64 / fs);
    }
    let mean = rr.iter().sum::<f64>() / rr.len() as f64;
    rr.insert(0, mean);
    Ok(rr)
}

/// Instantaneous heart rate (bpm) at every sample of a signal `desired_length` long.
///
/// Rates sit on the R peaks and are joined with monotone cubic interpolation;
/// samples before the first or after the last peak hold the nearest value.
pub fn instantaneous_rate(events: &Events, fs: f64, desired_length: usize) -> Result<Vec<f64>> {
    let periods = peak_periods(events, fs)?;
    let rates: Vec<f64> = periods.iter().map(|p| 60.0 / p).collect();
    let xs: Vec<f64> = events.indices.iter().map(|&i| i as f64).collect();
    Ok(pchip(&xs, &rates, desired_length))
}

/// Arithmetic mean of a rate series; fails on an empty or non-finite result.
pub fn mean_rate(series: &[f64]) -> Result<f64> {
    if series.is_empty() {
        return Err(EcgError::Computation(
            "heart rate series is empty".to_string(),
        ));
    }
    let mean = series.iter().sum::<f64>() / series.len() as f64;
    if !mean.is_finite() || mean <= 0.0 {
        return Err(EcgError::Computation(format!(
            "heart rate is undefined (mean rate {})",
            mean
        )));
    }
    Ok(mean)
}

/// Piecewise cubic Hermite interpolation with Fritsch–Carlson slopes,
/// evaluated at samples `0..len`.
fn pchip(xs: &[f64], ys: &[f64], len: usize) -> Vec<f64> {
    let n = xs.len();
    let slopes = pchip_slopes(xs, ys);
    let mut out = Vec::with_capacity(len);
    let mut seg = 0usize;
    for i in 0..len {
        let x = i as f64;
        if x <= xs[0] {
            out.push(ys[0]);
            continue;
        }
        if x >= xs[n - 1] {
            out.push(ys[n - 1]);
            continue;
        }
        while xs[seg + 1] < x {
            seg += 1;
        }
        let h = xs[seg + 1] - xs[seg];
        let t = (x - xs[seg]) / h;
        let t2 = t * t;
        let t3 = t2 * t;
        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;
        out.push(
            h00 * ys[seg] + h10 * h * slopes[seg] + h01 * ys[seg + 1] + h11 * h * slopes[seg + 1],
        );
    }
    out
}

fn pchip_slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f64> = (0..n - 1).map(|k| (ys[k + 1] - ys[k]) / h[k]).collect();
    if n == 2 {
        return vec![delta[0], delta[0]];
    }

    let mut d = vec![0.0; n];
    for k in 1..n - 1 {
        if delta[k - 1] * delta[k] <= 0.0 {
            continue;
        }
        let w1 = 2.0 * h[k] + h[k - 1];
        let w2 = h[k] + 2.0 * h[k - 1];
        d[k] = (w1 + w2) / (w1 / delta[k - 1] + w2 / delta[k]);
    }
    d[0] = end_slope(h[0], h[1], delta[0], delta[1]);
    d[n - 1] = end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    d
}

fn end_slope(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if d.signum() != m0.signum() || m0 == 0.0 {
        0.0
    } else if m0.signum() != m1.signum() && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}
