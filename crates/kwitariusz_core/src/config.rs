//! Application paths and persisted email settings.
//!
//! # Responsibility
//! - Resolve the data directory (override, env var, or platform default).
//! - Derive database, log and settings locations from it.
//! - Load/save the email sender config as JSON.
//!
//! # Invariants
//! - A missing email config file reads as `EmailConfig::default()`.

use crate::service::email_service::EmailConfig;
use directories::ProjectDirs;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const ENV_DATA_DIR: &str = "KWITARIUSZ_DATA_DIR";
pub const DB_FILE_NAME: &str = "kwitariusz.db";
pub const EMAIL_CONFIG_FILE_NAME: &str = "email-config.json";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    NoDataDir,
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDataDir => write!(
                f,
                "could not determine a data directory; set {ENV_DATA_DIR}"
            ),
            Self::Io { path, source } => write!(f, "`{}`: {source}", path.display()),
            Self::Json { path, source } => {
                write!(f, "`{}` is not valid JSON: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NoDataDir => None,
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

/// Filesystem layout of one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Resolves the data directory: explicit override, then `KWITARIUSZ_DATA_DIR`,
    /// then the platform data directory.
    pub fn resolve(override_dir: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(dir) = override_dir {
            return Ok(Self::new(dir));
        }
        if let Ok(raw) = std::env::var(ENV_DATA_DIR) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Ok(Self::new(trimmed));
            }
        }
        let dirs =
            ProjectDirs::from("pl", "kwitariusz", "Kwitariusz").ok_or(ConfigError::NoDataDir)?;
        Ok(Self::new(dirs.data_dir()))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }

    pub fn email_config_path(&self) -> PathBuf {
        self.data_dir.join(EMAIL_CONFIG_FILE_NAME)
    }

    /// Creates the data directory if needed.
    pub fn ensure_data_dir(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_dir).map_err(|source| ConfigError::Io {
            path: self.data_dir.clone(),
            source,
        })
    }
}

/// Reads the email config; a missing file yields the default config.
pub fn load_email_config(path: &Path) -> Result<EmailConfig, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(EmailConfig::default())
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_email_config(path: &Path, config: &EmailConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
