//! Configuration management for the Spotify collector.
//!
//! Client credentials come from a JSON file (by default
//! `<local data dir>/spotcollect/info.json`). Endpoint URLs, the requested
//! scope and the callback listener address can additionally be overridden
//! through environment variables, which may be placed in a `.env` file next
//! to the config file.
//!
//! Resolution order, highest priority first:
//! 1. Environment variables (including values loaded from `.env`)
//! 2. The JSON config file
//! 3. Application defaults

use std::{
    env,
    path::{Path, PathBuf},
};

use reqwest::Url;
use serde::Deserialize;

use crate::{Error, Res, types::Credentials};

pub const DEFAULT_SCOPE: &str = "user-library-read user-top-read playlist-read-private";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com";

const APP_DIR: &str = "spotcollect";

/// Returns `<local data dir>/spotcollect`, falling back to the working
/// directory on platforms without one.
///
/// - Linux: `~/.local/share/spotcollect`
/// - macOS: `~/Library/Application Support/spotcollect`
/// - Windows: `%LOCALAPPDATA%/spotcollect`
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Loads environment variables from `<data dir>/.env` if that file exists.
///
/// A missing file is not an error; a present but unreadable one is.
pub fn load_env() -> Res<()> {
    let path = data_dir().join(".env");
    if !path.is_file() {
        return Ok(());
    }

    dotenv::from_path(&path)
        .map(|_| ())
        .map_err(|e| Error::Config(format!("cannot load {}: {}", path.display(), e)))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

/// Everything the client needs to talk to the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default)]
    pub endpoints: Endpoints,
    /// Listener bind address; derived from `redirect_uri` when unset.
    #[serde(default)]
    pub server_address: Option<String>,
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

impl Config {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            scope: default_scope(),
            endpoints: Endpoints::default(),
            server_address: None,
        }
    }

    pub fn default_path() -> PathBuf {
        data_dir().join("info.json")
    }

    /// Reads the config file and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file is missing, is not valid JSON,
    /// lacks one of `client_id`, `client_secret` or `redirect_uri`, or if the
    /// redirect URI is not an absolute URL.
    pub async fn load(path: &Path) -> Res<Self> {
        let content = async_fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!("cannot read config file {}: {}", path.display(), e))
        })?;

        let mut config = Self::from_json(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.apply_env_overrides();

        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_json(content: &str) -> Res<Self> {
        let config: Self =
            serde_json::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.redirect_url()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SPOTIFY_API_AUTH_URL") {
            self.endpoints.auth_url = v;
        }
        if let Ok(v) = env::var("SPOTIFY_API_TOKEN_URL") {
            self.endpoints.token_url = v;
        }
        if let Ok(v) = env::var("SPOTIFY_API_URL") {
            self.endpoints.api_url = v;
        }
        if let Ok(v) = env::var("SPOTIFY_API_AUTH_SCOPE") {
            self.scope = v;
        }
        if let Ok(v) = env::var("SERVER_ADDRESS") {
            self.server_address = Some(v);
        }
    }

    fn redirect_url(&self) -> Res<Url> {
        Url::parse(&self.credentials.redirect_uri).map_err(|e| {
            Error::Config(format!(
                "invalid redirect_uri {:?}: {}",
                self.credentials.redirect_uri, e
            ))
        })
    }

    /// Address the callback listener binds to, e.g. `127.0.0.1:8080`.
    pub fn server_addr(&self) -> Res<String> {
        if let Some(addr) = &self.server_address {
            return Ok(addr.clone());
        }

        let url = self.redirect_url()?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::Config("redirect_uri has no host".to_string()))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| Error::Config("redirect_uri has no port".to_string()))?;
        Ok(format!("{host}:{port}"))
    }

    /// Route the provider redirects to, `/callback` if the URI has no path.
    pub fn callback_path(&self) -> Res<String> {
        let url = self.redirect_url()?;
        Ok(match url.path() {
            "" | "/" => "/callback".to_string(),
            p => p.to_string(),
        })
    }
}
