//! Config file loading and flag merging.
//!
//! Priority: flag > config file > default. The file is TOML at
//! `~/.shrike.toml` (or `--config <path>`); a missing file is not an
//! error.

use crate::args::Cli;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Effective settings for a run, after all merging.
#[derive(Debug, Clone)]
pub struct Settings {
    pub rate: u32,
    pub timeout: Duration,
    pub concurrency: u32,
    pub retries: u32,
    pub top: usize,
    pub no_syn: bool,
    pub banner: bool,
    pub http: bool,
    pub rdns: bool,
    pub output: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rate: 500,
            timeout: Duration::from_millis(800),
            concurrency: 1000,
            retries: 1,
            top: 1000,
            no_syn: false,
            banner: false,
            http: false,
            rdns: false,
            output: "human".to_string(),
        }
    }
}

/// On-disk shape; every key optional.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    rate: Option<u32>,
    timeout_ms: Option<u64>,
    concurrency: Option<u32>,
    retries: Option<u32>,
    top: Option<usize>,
    no_syn: Option<bool>,
    banner: Option<bool>,
    http: Option<bool>,
    rdns: Option<bool>,
    output: Option<String>,
}

/// Build the effective settings for this invocation.
pub fn load(cli: &Cli) -> Result<Settings> {
    let file = load_file(cli.config.as_deref())?;
    Ok(merge(file, cli))
}

fn load_file(path: Option<&Path>) -> Result<FileConfig> {
    let path: PathBuf = match path {
        Some(p) => p.to_path_buf(),
        None => match std::env::var_os("HOME") {
            Some(home) => Path::new(&home).join(".shrike.toml"),
            None => return Ok(FileConfig::default()),
        },
    };

    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(FileConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("cannot read config: {}", path.display()));
        }
    };

    toml::from_str(&text).with_context(|| format!("cannot parse config: {}", path.display()))
}

fn merge(file: FileConfig, cli: &Cli) -> Settings {
    let defaults = Settings::default();
    Settings {
        rate: cli.rate.or(file.rate).unwrap_or(defaults.rate),
        timeout: cli
            .timeout
            .or(file.timeout_ms)
            .map(Duration::from_millis)
            .unwrap_or(defaults.timeout),
        concurrency: cli
            .concurrency
            .or(file.concurrency)
            .unwrap_or(defaults.concurrency),
        retries: cli.retries.or(file.retries).unwrap_or(defaults.retries),
        top: cli.top.or(file.top).unwrap_or(defaults.top),
        no_syn: cli.no_syn || file.no_syn.unwrap_or(defaults.no_syn),
        banner: cli.banner || file.banner.unwrap_or(defaults.banner),
        http: cli.http || file.http.unwrap_or(defaults.http),
        rdns: cli.rdns || file.rdns.unwrap_or(defaults.rdns),
        output: cli
            .output
            .clone()
            .or(file.output)
            .unwrap_or(defaults.output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["shrike"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn defaults_without_file_or_flags() {
        let settings = merge(FileConfig::default(), &cli(&[]));
        assert_eq!(settings.rate, 500);
        assert_eq!(settings.timeout, Duration::from_millis(800));
        assert_eq!(settings.concurrency, 1000);
        assert_eq!(settings.output, "human");
        assert!(!settings.no_syn);
    }

    #[test]
    fn file_overrides_defaults() {
        let file: FileConfig =
            toml::from_str("rate = 100\ntimeout_ms = 2000\nbanner = true\noutput = \"json\"")
                .unwrap();
        let settings = merge(file, &cli(&[]));
        assert_eq!(settings.rate, 100);
        assert_eq!(settings.timeout, Duration::from_millis(2000));
        assert!(settings.banner);
        assert_eq!(settings.output, "json");
    }

    #[test]
    fn flags_override_the_file() {
        let file: FileConfig = toml::from_str("rate = 100\noutput = \"json\"").unwrap();
        let settings = merge(file, &cli(&["--rate", "9000", "-o", "csv"]));
        assert_eq!(settings.rate, 9000);
        assert_eq!(settings.output, "csv");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let file: Result<FileConfig, _> = toml::from_str("rate = 5\nfuture_knob = true");
        assert!(file.is_ok());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let config = load_file(Some(Path::new("/nonexistent/shrike.toml"))).unwrap();
        assert!(config.rate.is_none());
    }
}
