use std::path::PathBuf;

use anyhow::{bail, Context, Result};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Which `ResumeStore` backs the service.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    Memory,
    Postgres { database_url: String },
}

/// Where uploaded documents are kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileStorageMode {
    /// Written under `upload_dir`, the record keeps the path.
    Filesystem,
    /// Stored as bytes on the record itself.
    Database,
}

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub file_storage: FileStorageMode,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so it can be exercised
    /// without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = match lookup("STORAGE_BACKEND")
            .unwrap_or_else(|| "memory".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => StorageBackend::Memory,
            "postgres" => StorageBackend::Postgres {
                database_url: lookup("DATABASE_URL").context(
                    "Required environment variable 'DATABASE_URL' is not set (STORAGE_BACKEND=postgres)",
                )?,
            },
            other => bail!("STORAGE_BACKEND must be 'memory' or 'postgres', got '{other}'"),
        };

        let file_storage = match lookup("FILE_STORAGE")
            .unwrap_or_else(|| "filesystem".to_string())
            .to_lowercase()
            .as_str()
        {
            "filesystem" => FileStorageMode::Filesystem,
            "database" => FileStorageMode::Database,
            other => bail!("FILE_STORAGE must be 'filesystem' or 'database', got '{other}'"),
        };

        Ok(Config {
            storage,
            file_storage,
            upload_dir: PathBuf::from(lookup("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string())),
            max_upload_bytes: match lookup("MAX_UPLOAD_BYTES") {
                Some(v) => v
                    .parse::<usize>()
                    .context("MAX_UPLOAD_BYTES must be a positive integer")?,
                None => DEFAULT_MAX_UPLOAD_BYTES,
            },
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}
