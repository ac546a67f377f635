use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::{error::Error, fs, path::PathBuf};
use tempfile::tempdir;

#[test]
fn process_sample_recording() -> Result<(), Box<dyn Error>> {
    let recording = sample_path("test_data/ecg_data.txt");

    let mut cmd = cargo_bin_cmd!("ecgbeat");
    cmd.args(["process", "--tsv", "--input", &recording]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let result: Value = serde_json::from_slice(&output)?;

    let heart_rate: f64 = result["Heart_Rate"].as_str().ok_or("rate string")?.parse()?;
    assert_close(heart_rate, 72.12, 0.5);
    let quality = result["Quality"].as_f64().ok_or("quality")?;
    assert!((1.0..=3.0).contains(&quality));
    for label in 1..=8 {
        let beat = &result[label.to_string()];
        assert!(beat["ECG_R_Peaks"].is_array(), "beat {} lacks R", label);
    }
    assert!(result.get("9").is_none());
    Ok(())
}

#[test]
fn process_reads_stdin_from_simulate() -> Result<(), Box<dyn Error>> {
    let simulated = cargo_bin_cmd!("ecgbeat")
        .args(["simulate", "--beats", "5", "--bpm", "60"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let output = cargo_bin_cmd!("ecgbeat")
        .arg("process")
        .write_stdin(simulated)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let result: Value = serde_json::from_slice(&output)?;
    let heart_rate: f64 = result["Heart_Rate"].as_str().ok_or("rate string")?.parse()?;
    assert_close(heart_rate, 60.0, 0.5);
    let keys: Vec<&String> = result.as_object().ok_or("object")?.keys().collect();
    assert_eq!(keys.len(), 7);
    Ok(())
}

#[test]
fn process_flat_signal_fails() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("flat.txt");
    fs::write(&input, "50\n".repeat(500)).unwrap();
    cargo_bin_cmd!("ecgbeat")
        .args(["process", "--input", input.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn process_writes_trace_dumps() {
    let temp = tempdir().unwrap();
    let dumps = temp.path().join("dumps");
    let recording = sample_path("test_data/ecg_data.txt");
    cargo_bin_cmd!("ecgbeat")
        .args([
            "--trace-dir",
            dumps.to_str().unwrap(),
            "process",
            "--tsv",
            "--input",
            &recording,
        ])
        .assert()
        .success();
    let mut names: Vec<String> = fs::read_dir(&dumps)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(names.len(), 2);
    assert!(names[0].starts_with("data") && names[0].ends_with(".json"));
    assert!(names[1].starts_with("ecg") && names[1].ends_with(".json"));
    assert_eq!(names[0].trim_start_matches("data"), names[1].trim_start_matches("ecg"));
}

#[test]
fn window_for_sixty_bpm() -> Result<(), Box<dyn Error>> {
    let output = cargo_bin_cmd!("ecgbeat")
        .args(["window", "--heart-rate", "60"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let window: Value = serde_json::from_slice(&output)?;
    assert_close(window["pre_offset"].as_f64().ok_or("pre")?, 0.35, 1e-9);
    assert_close(window["post_offset"].as_f64().ok_or("post")?, 0.65, 1e-9);

    cargo_bin_cmd!("ecgbeat")
        .args(["window", "--heart-rate", "0"])
        .assert()
        .failure();
    Ok(())
}

#[test]
fn heart_rate_from_peak_file() -> Result<(), Box<dyn Error>> {
    let temp = tempdir()?;
    let peaks = temp.path().join("peaks.txt");
    fs::write(&peaks, "100\n300\n500\n700\n")?;
    let output = cargo_bin_cmd!("ecgbeat")
        .args(["heart-rate", "--peaks", peaks.to_str().ok_or("utf8 path")?])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let rate: Value = serde_json::from_slice(&output)?;
    assert_eq!(rate["Heart_Rate"], "75.00");
    assert_eq!(rate["peaks"], 4);

    fs::write(&peaks, "100\n")?;
    cargo_bin_cmd!("ecgbeat")
        .args(["heart-rate", "--peaks", peaks.to_str().ok_or("utf8 path")?])
        .assert()
        .failure();
    Ok(())
}

#[test]
fn quality_grades_clean_and_flat_signals() -> Result<(), Box<dyn Error>> {
    let recording = sample_path("test_data/ecg_data.txt");
    let output = cargo_bin_cmd!("ecgbeat")
        .args(["quality", "--tsv", "--input", &recording])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let sqi: Value = serde_json::from_slice(&output)?;
    assert_eq!(sqi["class"], "Excellent");

    let temp = tempdir()?;
    let flat = temp.path().join("flat.txt");
    fs::write(&flat, "0\n".repeat(1000))?;
    let output = cargo_bin_cmd!("ecgbeat")
        .args(["quality", "--input", flat.to_str().ok_or("utf8 path")?])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let sqi: Value = serde_json::from_slice(&output)?;
    assert_eq!(sqi["class"], "Unacceptable");
    Ok(())
}

#[test]
fn simulate_raw_units_sit_on_device_baseline() -> Result<(), Box<dyn Error>> {
    let output = cargo_bin_cmd!("ecgbeat")
        .args(["simulate", "--beats", "3", "--bpm", "75", "--raw-units"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output)?;
    let samples: Vec<f64> = text.lines().map(str::parse).collect::<Result<_, _>>()?;
    assert_close(samples[0], 2000.0, 1e-6);
    let max = samples.iter().cloned().fold(f64::MIN, f64::max);
    assert!(max > 3800.0, "max {}", max);
    Ok(())
}

fn assert_close(a: f64, b: f64, tol: f64) {
    let diff = (a - b).abs();
    assert!(
        diff <= tol,
        "diff {} exceeded tol {} ({} vs {})",
        diff,
        tol,
        a,
        b
    );
}

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .expect("crates dir")
        .parent()
        .expect("workspace root")
        .to_path_buf()
}

fn sample_path(relative: &str) -> String {
    workspace_root()
        .join(relative)
        .to_string_lossy()
        .to_string()
}
