//! Layered settings for the `fractal-ledger` binary.
//!
//! Sources, lowest priority first: built-in defaults, an optional TOML/JSON/YAML
//! file (`fractal-ledger.toml` in the working directory unless a path is
//! given), then `FRACTAL_*` environment variables.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use tracing::Level;

pub const DEFAULT_CONFIG_FILE: &str = "fractal-ledger";
pub const ENV_PREFIX: &str = "FRACTAL";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub log_level: String,
    /// Fixed genesis timestamp for reproducible genesis hashes.
    pub genesis_timestamp: Option<f64>,
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("log_level", "info")?
            .set_default("pretty", true)?;

        let builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let settings: Self = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;

        if let Some(ts) = settings.genesis_timestamp.filter(|ts| !ts.is_finite()) {
            return Err(ConfigError::Message(format!(
                "genesis_timestamp must be finite, got {ts}"
            )));
        }
        Ok(settings)
    }

    /// Falls back to `INFO` for unrecognized levels.
    pub fn tracing_level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn explicit_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("fractal-ledger-settings-{}.toml", std::process::id()));
        fs::write(&path, "log_level = \"debug\"\ngenesis_timestamp = 1678886400.0\npretty = false\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(settings.tracing_level(), Level::DEBUG);
        assert_eq!(settings.genesis_timestamp, Some(1678886400.0));
        assert!(!settings.pretty);
    }

    #[test]
    fn non_finite_genesis_timestamp_is_rejected() {
        for (name, literal) in [("nan", "nan"), ("inf", "inf"), ("neg-inf", "-inf")] {
            let path = std::env::temp_dir().join(format!(
                "fractal-ledger-settings-{name}-{}.toml",
                std::process::id()
            ));
            fs::write(&path, format!("genesis_timestamp = {literal}\n")).unwrap();

            let result = Settings::load(Some(&path));
            fs::remove_file(&path).unwrap();

            let err = result.unwrap_err();
            assert!(err.to_string().contains("genesis_timestamp must be finite"), "{err}");
        }
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("fractal-ledger-settings-does-not-exist.toml");
        assert!(Settings::load(Some(&path)).is_err());
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let settings = Settings {
            log_level: "chatty".to_string(),
            genesis_timestamp: None,
            pretty: true,
        };
        assert_eq!(settings.tracing_level(), Level::INFO);
    }
}
