//! Keyword and city configuration.
//!
//! The configuration is a JSON document (YAML when the file name ends in
//! `.yaml` or `.yml`) with two required lists:
//!
//! ```json
//! { "keywords": ["homicídio", "tráfico"], "cities": ["João Pessoa", "Campina Grande"] }
//! ```
//!
//! Empty lists are valid; absent fields are not.

use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

/// Keywords to query and places to look for. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KeywordConfig {
    pub keywords: Vec<String>,
    pub cities: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file {} not found", path.display())]
    Missing { path: PathBuf },
    #[error("cannot read configuration file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration in {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

enum Format {
    Json,
    Yaml,
}

fn format_of(path: &Path) -> Format {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            Format::Yaml
        }
        _ => Format::Json,
    }
}

impl KeywordConfig {
    /// Load and validate the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Missing`] if the file does not exist,
    /// [`ConfigError::Unreadable`] for other I/O failures and
    /// [`ConfigError::Invalid`] if it cannot be parsed or lacks a field.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::Missing {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let config = Self::parse(&raw, path)?;
        info!(
            keywords = config.keywords.len(),
            cities = config.cities.len(),
            "Loaded keyword configuration"
        );
        Ok(config)
    }

    /// Parse configuration text; `path` selects the format and labels errors.
    pub fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let parsed: Result<Self, String> = match format_of(path) {
            Format::Json => serde_json::from_str(raw).map_err(|e| e.to_string()),
            Format::Yaml => serde_yaml::from_str(raw).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| ConfigError::Invalid {
            path: path.to_path_buf(),
            message,
        })
    }
}
