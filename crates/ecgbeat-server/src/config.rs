use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Parser, Debug, Default)]
#[command(
    name = "ecgbeat-server",
    version,
    about = "HTTP service segmenting single-lead ECG recordings into beats"
)]
pub struct ServerArgs {
    /// Optional TOML file with the same keys as the flags below
    #[arg(long, env = "ECGBEAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Interface to bind
    #[arg(long, env = "ECGBEAT_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "ECGBEAT_PORT")]
    pub port: Option<u16>,

    /// Tab-separated recording served by POST /ecg_sample
    #[arg(long, env = "ECGBEAT_SAMPLE_FILE")]
    pub sample_file: Option<PathBuf>,

    /// Directory for ecg<stamp>.json / data<stamp>.json dumps (disabled when unset)
    #[arg(long, env = "ECGBEAT_TRACE_DIR")]
    pub trace_dir: Option<PathBuf>,

    /// Logging verbosity (e.g., debug, info, warn)
    #[arg(long, env = "ECGBEAT_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub sample_file: PathBuf,
    pub trace_dir: Option<PathBuf>,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            sample_file: PathBuf::from("ecg_data.txt"),
            trace_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    /// File values first, then command-line/environment overrides.
    pub fn resolve(args: ServerArgs) -> Result<Self> {
        let mut cfg = match &args.config {
            Some(path) => Self::read(path)?,
            None => Self::default(),
        };
        if let Some(host) = args.host {
            cfg.host = host;
        }
        if let Some(port) = args.port {
            cfg.port = port;
        }
        if let Some(sample_file) = args.sample_file {
            cfg.sample_file = sample_file;
        }
        if args.trace_dir.is_some() {
            cfg.trace_dir = args.trace_dir;
        }
        if let Some(level) = args.log_level {
            cfg.log_level = level;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_service_contract() {
        let cfg = ServerConfig::resolve(ServerArgs::default()).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.sample_file, PathBuf::from("ecg_data.txt"));
        assert!(cfg.trace_dir.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = ServerConfig::from_toml_str("port = 8080\ntrace_dir = \"/tmp/ecg\"\n").unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.trace_dir, Some(PathBuf::from("/tmp/ecg")));
    }

    #[test]
    fn flags_override_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        fs::write(&path, "host = \"127.0.0.1\"\nport = 8080\nlog_level = \"debug\"\n").unwrap();
        let args = ServerArgs {
            config: Some(path),
            port: Some(9000),
            ..Default::default()
        };
        let cfg = ServerConfig::resolve(args).unwrap();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let args = ServerArgs {
            config: Some(PathBuf::from("/nonexistent/ecgbeat.toml")),
            ..Default::default()
        };
        assert!(ServerConfig::resolve(args).is_err());
    }

    #[test]
    fn cli_parses_flags() {
        let args =
            ServerArgs::try_parse_from(["ecgbeat-server", "--port", "6000", "--sample-file", "x.tsv"])
                .unwrap();
        assert_eq!(args.port, Some(6000));
        assert_eq!(args.sample_file, Some(PathBuf::from("x.tsv")));
    }
}
