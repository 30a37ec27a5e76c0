use std::env;
use std::path::PathBuf;

use crate::error::ConflictError;

pub const DEFAULT_DATA_PATH: &str = "models/df_full_with_clusters.csv";
pub const DEFAULT_FIGURES_DIR: &str = "figures";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Dataset
    pub data_path: PathBuf,
    pub figures_dir: PathBuf,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables. Every key has a default;
    /// only a malformed `WEB_PORT` is an error.
    pub fn from_env() -> Result<Self, ConflictError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConflictError> {
        let web_port = match lookup("WEB_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConflictError::Config(format!("WEB_PORT must be a number, got {raw:?}")))?,
            None => 3000,
        };

        Ok(Self {
            data_path: lookup("DATA_PATH")
                .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string())
                .into(),
            figures_dir: lookup("FIGURES_DIR")
                .unwrap_or_else(|| DEFAULT_FIGURES_DIR.to_string())
                .into(),
            web_host: lookup("WEB_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            web_port,
        })
    }
}
