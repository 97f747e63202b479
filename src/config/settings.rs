//! TOML-based configuration for Babbage.
//!
//! Supports a config file (babbage.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [catalog]
//! directory = "${BABBAGE_HOME}/models"
//! cache = true
//!
//! [database]
//! path = "./data/spending.db"
//! dialect = "sqlite"
//! init_script = "./data/load.sql"
//!
//! [query]
//! page_max = 10000
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sql::Dialect;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Where cube models are found.
    pub catalog: CatalogSettings,

    /// The store queries run against.
    pub database: DatabaseSettings,

    /// Limits applied to every query.
    pub query: QuerySettings,
}

/// Cube catalog configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Directory of `<cube>.json` model files (supports ${ENV_VAR} expansion).
    pub directory: String,

    /// Keep constructed cubes (and their reflected tables) between calls.
    pub cache: bool,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            directory: "models".to_string(),
            cache: true,
        }
    }
}

impl CatalogSettings {
    pub fn resolved_directory(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.directory).map(PathBuf::from)
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite database file; `:memory:` opens a private in-memory store.
    pub path: String,

    /// SQL dialect generated for this database.
    pub dialect: String,

    /// SQL script executed once after opening (fixtures, views).
    pub init_script: Option<String>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
            dialect: "sqlite".to_string(),
            init_script: None,
        }
    }
}

impl DatabaseSettings {
    /// Get the dialect type.
    pub fn dialect_type(&self) -> Result<Dialect, SettingsError> {
        self.dialect
            .parse()
            .map_err(|_| SettingsError::UnsupportedDialect(self.dialect.clone()))
    }

    /// Get the database path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<String, SettingsError> {
        expand_env_vars(&self.path)
    }

    pub fn resolved_init_script(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.init_script
            .as_deref()
            .map(|s| expand_env_vars(s).map(PathBuf::from))
            .transpose()
    }
}

/// Query limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Upper bound (and default) for `page_size`.
    pub page_max: u64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self { page_max: 10_000 }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `BABBAGE_CONFIG`
    /// 2. `./babbage.toml`
    /// 3. `~/.config/babbage/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("BABBAGE_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("babbage.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("babbage").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.query.page_max == 0 {
            return Err(SettingsError::InvalidConfig(
                "query.page_max must be at least 1".into(),
            ));
        }
        self.database.dialect_type()?;
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            let name = std::iter::from_fn(|| chars.next_if(|ch| *ch != '}')).collect();
            chars.next(); // closing '}'
            name
        } else {
            std::iter::from_fn(|| chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_')).collect()
        };

        if var_name.is_empty() {
            // Just a lone $, keep it
            result.push('$');
            continue;
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
