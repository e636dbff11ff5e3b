use std::env;
use std::fmt;
use std::path::PathBuf;

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub pdf_output_dir: PathBuf,
    pub chrome_enabled: bool,
    pub chrome_executable: Option<PathBuf>,
    pub db_max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} must be set"),
            ConfigError::Invalid { key, value } => write!(f, "{key} has an invalid value: '{value}'"),
        }
    }
}

impl std::error::Error for ConfigError {}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value: value.to_string() }),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                value: v.clone(),
            })?,
            None => 8,
        };

        let chrome_enabled = match lookup("CHROME_ENABLED") {
            Some(v) => parse_bool("CHROME_ENABLED", &v)?,
            None => false,
        };

        Ok(AppConfig {
            database_url,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            pdf_output_dir: lookup("PDF_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/pdf")),
            chrome_enabled,
            chrome_executable: lookup("CHROME_EXECUTABLE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            db_max_connections,
        })
    }
}
