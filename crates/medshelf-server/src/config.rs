//! Environment-driven server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

/// Which storage backend serves this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Sled,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "sled" => Ok(StoreBackend::Sled),
            _ => Err(anyhow!("Unknown store backend: {}", s)),
        }
    }
}

/// Server configuration, read from the environment with defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub backend: StoreBackend,
    pub sqlite_path: PathBuf,
    pub sled_path: PathBuf,
    pub upload_dir: PathBuf,
    pub jwt_secret: String,
}

impl ServerConfig {
    /// Load configuration from `MEDSHELF_*` environment variables, falling
    /// back to development defaults.
    pub fn from_env() -> Result<Self> {
        let port = env_or("MEDSHELF_PORT", "3000")
            .parse()
            .context("MEDSHELF_PORT must be a port number")?;
        let backend = env_or("MEDSHELF_STORE", "sqlite")
            .parse()
            .context("MEDSHELF_STORE must be 'sqlite' or 'sled'")?;

        Ok(Self {
            host: env_or("MEDSHELF_HOST", "127.0.0.1"),
            port,
            backend,
            sqlite_path: env_or("MEDSHELF_SQLITE_PATH", "data/medshelf.db").into(),
            sled_path: env_or("MEDSHELF_SLED_PATH", "data/medshelf.sled").into(),
            upload_dir: env_or("MEDSHELF_UPLOAD_DIR", "uploads").into(),
            jwt_secret: env_or("MEDSHELF_JWT_SECRET", "medshelf-dev-secret"),
        })
    }

    /// Socket address to bind.
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
