use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub sorter: SorterConfig,
    pub notify: NotifyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SorterConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub upload_dir: PathBuf,
    /// Per-document extraction budget in seconds; 0 disables the limit.
    pub extraction_timeout_secs: u64,
    pub tessdata_dir: String,
    pub ocr_language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyMode {
    Log,
    Outbox,
    None,
}

impl std::str::FromStr for NotifyMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "log" => Ok(NotifyMode::Log),
            "outbox" => Ok(NotifyMode::Outbox),
            "none" | "off" => Ok(NotifyMode::None),
            other => Err(anyhow::anyhow!("Unknown NOTIFY_MODE: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    pub mode: NotifyMode,
    pub admin_email: Option<String>,
    pub outbox_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup (the process
    /// environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let default_upload_dir = env::temp_dir().join("doc-sorter");

        Ok(Self {
            server: ServerConfig {
                port: var("PORT", "5000")
                    .parse()
                    .context("PORT must be a valid port number")?,
                host: var("HOST", "0.0.0.0"),
                cors_allowed_origins: var("ALLOWED_ORIGINS", "*")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            sorter: SorterConfig {
                input_dir: PathBuf::from(var("INPUT_DIR", "uploads")),
                output_dir: PathBuf::from(var("OUTPUT_DIR", "processed")),
                upload_dir: optional("UPLOAD_TMP_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(default_upload_dir),
                extraction_timeout_secs: var("EXTRACTION_TIMEOUT_SECS", "120")
                    .parse()
                    .context("EXTRACTION_TIMEOUT_SECS must be a whole number of seconds")?,
                tessdata_dir: var("TESSDATA_PREFIX", "/usr/share/tesseract-ocr/5/tessdata"),
                ocr_language: var("OCR_LANGUAGE", "eng"),
            },
            notify: NotifyConfig {
                mode: var("NOTIFY_MODE", "log").parse()?,
                admin_email: optional("ADMIN_EMAIL"),
                outbox_dir: PathBuf::from(var("NOTIFY_OUTBOX_DIR", "outbox")),
            },
            logging: LoggingConfig {
                log_dir: optional("LOG_DIR").map(PathBuf::from),
            },
        })
    }
}
