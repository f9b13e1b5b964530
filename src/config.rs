//! Configuration types for portal-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration, persisted as JSON next to the client.
///
/// The portal token and cookies are opaque strings handed to the backend
/// boundary; the core never interprets them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Portal API token
    #[serde(default)]
    pub token: String,

    /// Directory downloads are saved to (default: "downloads")
    #[serde(default = "default_save_path")]
    pub save_path: PathBuf,

    /// Comma-separated extensions to serve as plain text when previewing
    #[serde(default)]
    pub serve_as_plaintext: String,

    /// Authentication cookie for the campus SSO
    #[serde(default)]
    pub ja_auth_cookie: String,

    /// Cookies for the lecture video service
    #[serde(default)]
    pub video_cookies: String,

    /// Local proxy port used by the preview server (default: 3030)
    #[serde(default = "default_proxy_port")]
    pub proxy_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            save_path: default_save_path(),
            serve_as_plaintext: String::new(),
            ja_auth_cookie: String::new(),
            video_cookies: String::new(),
            proxy_port: default_proxy_port(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file.
    ///
    /// A missing file is not an error: defaults are returned so a fresh
    /// install starts blank. Malformed JSON is reported as a config error.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        serde_json::from_slice(&content).map_err(|e| Error::Config {
            message: format!("invalid config file {}: {}", path.display(), e),
            key: None,
        })
    }

    /// Persist configuration to a JSON file.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path.as_ref(), content).await?;
        Ok(())
    }
}

// Default value functions

fn default_save_path() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_proxy_port() -> u16 {
    3030
}
