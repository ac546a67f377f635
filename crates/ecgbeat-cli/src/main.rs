use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ecgbeat_lib::{
    io::text as text_io,
    metrics::sqi::evaluate_sqi,
    normalize::normalize,
    pipeline::{analyze_traced, estimate_heart_rate},
    signal::{nan_to_zero, Events, TimeSeries},
    synth::{synthetic_ecg, SyntheticEcg},
    trace::{FileTrace, NoTrace, TraceSink},
    window::BeatWindow,
    NativeAnalyzer, SignalAnalyzer,
};
use env_logger::Env;
use serde_json::json;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "ecgbeat",
    version,
    about = "ecgbeat: single-lead ECG beat segmentation tools"
)]
struct Cli {
    /// Write ecg<stamp>.json / data<stamp>.json dumps into this directory
    #[arg(long, global = true, env = "ECGBEAT_TRACE_DIR")]
    trace_dir: Option<PathBuf>,
    #[arg(long, global = true, default_value = "info", env = "ECGBEAT_LOG_LEVEL")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment beats from samples read from stdin or --input and print the result JSON
    Process {
        #[arg(long)]
        input: Option<PathBuf>,
        /// Input is a tab-separated recording with a header row
        #[arg(long)]
        tsv: bool,
    },
    /// Average heart rate from newline-delimited R-peak indices
    HeartRate {
        #[arg(long)]
        peaks: PathBuf,
        /// Signal length in samples (defaults to one past the last peak)
        #[arg(long)]
        length: Option<usize>,
    },
    /// Beat window (seconds before/after R) for a heart rate
    Window {
        #[arg(long)]
        heart_rate: f64,
    },
    /// Signal quality indices and fuzzy grade
    Quality {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        tsv: bool,
    },
    /// Print a synthetic 250 Hz PQRST signal, one sample per line
    Simulate {
        #[arg(long, default_value_t = 10)]
        beats: usize,
        #[arg(long, default_value_t = 60.0)]
        bpm: f64,
        /// Encode in raw device units instead of millivolts
        #[arg(long)]
        raw_units: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_level.as_str())).init();
    let trace: Box<dyn TraceSink> = match &cli.trace_dir {
        Some(dir) => Box::new(FileTrace::new(dir)),
        None => Box::new(NoTrace),
    };
    match cli.command {
        Commands::Process { input, tsv } => cmd_process(input.as_deref(), tsv, trace.as_ref())?,
        Commands::HeartRate { peaks, length } => cmd_heart_rate(&peaks, length)?,
        Commands::Window { heart_rate } => cmd_window(heart_rate)?,
        Commands::Quality { input, tsv } => cmd_quality(input.as_deref(), tsv)?,
        Commands::Simulate {
            beats,
            bpm,
            raw_units,
        } => cmd_simulate(beats, bpm, raw_units)?,
    }
    Ok(())
}

fn read_samples(input: Option<&Path>, tsv: bool) -> Result<Vec<f64>> {
    let text = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    if tsv {
        text_io::parse_tsv_recording(&text)
    } else {
        text_io::parse_f64_series(&text)
    }
}

fn cmd_process(input: Option<&Path>, tsv: bool, trace: &dyn TraceSink) -> Result<()> {
    let samples = read_samples(input, tsv)?;
    let result = analyze_traced(&NativeAnalyzer::default(), samples, trace)?;
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}

fn cmd_heart_rate(peaks: &Path, length: Option<usize>) -> Result<()> {
    let indices = text_io::read_event_indices(peaks)?;
    let desired_length = length.unwrap_or_else(|| indices.iter().max().map_or(0, |m| m + 1));
    let events = Events::from_indices(indices);
    let heart_rate = estimate_heart_rate(&NativeAnalyzer::default(), &events, desired_length)?;
    let js = json!({
        "heart_rate": heart_rate,
        "Heart_Rate": format!("{:.2}", heart_rate),
        "peaks": events.len(),
    });
    println!("{}", js);
    Ok(())
}

fn cmd_window(heart_rate: f64) -> Result<()> {
    let window = BeatWindow::from_heart_rate(heart_rate)?;
    println!("{}", serde_json::to_string(&window)?);
    Ok(())
}

fn cmd_quality(input: Option<&Path>, tsv: bool) -> Result<()> {
    let samples = read_samples(input, tsv)?;
    let analyzer = NativeAnalyzer::default();
    let mut cleaned = analyzer.clean(&TimeSeries::new(normalize(samples)))?;
    cleaned.data = nan_to_zero(cleaned.data);
    let sqi = evaluate_sqi(&cleaned, &analyzer.ecg);
    println!("{}", serde_json::to_string(&sqi)?);
    Ok(())
}

fn cmd_simulate(beats: usize, bpm: f64, raw_units: bool) -> Result<()> {
    if !(bpm.is_finite() && bpm > 0.0) {
        anyhow::bail!("--bpm must be positive, got {}", bpm);
    }
    let shape = SyntheticEcg {
        raw_units,
        ..SyntheticEcg::regular(beats, bpm)
    };
    let mut out = String::with_capacity(shape.len() * 12);
    for v in synthetic_ecg(&shape) {
        out.push_str(&format!("{}\n", v));
    }
    print!("{}", out);
    Ok(())
}
