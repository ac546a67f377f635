use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use std::path::Path;

/// Parse newline-delimited floating point series, ignoring blank/comment lines.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val: f64 = trimmed
            .parse()
            .with_context(|| format!("line {} is not f64: {}", idx + 1, trimmed))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

/// Read a newline-delimited floating point series from disk.
pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text)
}

/// Parse newline-delimited sample indices.
pub fn parse_event_indices(text: &str) -> Result<Vec<usize>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val: usize = trimmed
            .parse()
            .with_context(|| format!("line {} is not an integer index: {}", idx + 1, trimmed))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no annotation indices found");
    }
    Ok(out)
}

/// Read event indices from a file.
pub fn read_event_indices(path: &Path) -> Result<Vec<usize>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_event_indices(&text)
}

/// Parse a tab-separated recording with a header row; the first column is the signal.
pub fn parse_tsv_recording(text: &str) -> Result<Vec<f64>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());
    let mut out = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading row {}", row + 2))?;
        let Some(cell) = record.get(0).filter(|c| !c.is_empty()) else {
            continue;
        };
        let val: f64 = cell
            .parse()
            .with_context(|| format!("row {} is not f64: {}", row + 2, cell))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

/// Read a tab-separated recording from disk.
pub fn read_tsv_recording(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_tsv_recording(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_skips_comments_and_blanks() {
        let values = parse_f64_series("# header\n1.5\n\n-2\n").unwrap();
        assert_eq!(values, vec![1.5, -2.0]);
    }

    #[test]
    fn series_reports_bad_line() {
        let err = parse_f64_series("1.0\nabc\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn tsv_uses_first_column_after_header() {
        let text = "ECG\tmarker\n2010\t0\n2050\t1\n1990\t0\n";
        assert_eq!(parse_tsv_recording(text).unwrap(), vec![2010.0, 2050.0, 1990.0]);
    }

    #[test]
    fn tsv_without_rows_fails() {
        assert!(parse_tsv_recording("ECG\n").is_err());
    }

    #[test]
    fn indices_parse() {
        assert_eq!(parse_event_indices("10\n20\n").unwrap(), vec![10, 20]);
        assert!(parse_event_indices("1.5\n").is_err());
    }
}
