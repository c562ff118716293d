use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::{Error, Res, config, types::TokenSet};

/// On-disk shape accepted by [`TokenStore::load`].
///
/// Older files carry a relative `expires_in` instead of `expires_at`.
/// Timestamps may be written as floats.
#[derive(Debug, Deserialize)]
struct TokenFile {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<f64>,
    expires_in: Option<f64>,
}

/// Flat JSON persistence for the [`TokenSet`].
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        config::data_dir().join("tokens.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the token set, normalizing a legacy `expires_in` to an absolute
    /// expiry relative to now.
    pub async fn load(&self) -> Res<TokenSet> {
        self.load_at(Utc::now()).await
    }

    pub async fn load_at(&self, now: DateTime<Utc>) -> Res<TokenSet> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::TokensNotFound(self.path.clone()));
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let file: TokenFile = serde_json::from_str(&content)
            .map_err(|e| Error::MalformedTokenFile(e.to_string()))?;

        let access_token = file
            .access_token
            .ok_or_else(|| missing_field("access_token"))?;
        let refresh_token = file
            .refresh_token
            .ok_or_else(|| missing_field("refresh_token"))?;

        let expires_at = match (file.expires_at, file.expires_in) {
            (Some(at), _) => from_epoch_seconds(at)?,
            (None, Some(secs)) => {
                tracing::debug!(
                    path = %self.path.display(),
                    "normalizing legacy expires_in to an absolute expiry"
                );
                seconds_to_millis(secs)
                    .and_then(Duration::try_milliseconds)
                    .and_then(|delta| now.checked_add_signed(delta))
                    .ok_or_else(|| {
                        Error::MalformedTokenFile(format!("expires_in out of range: {secs}"))
                    })?
            }
            (None, None) => return Err(missing_field("'expires_at' or 'expires_in'")),
        };

        Ok(TokenSet {
            access_token,
            refresh_token,
            expires_at,
        })
    }

    /// Writes the full token set.
    ///
    /// Content goes to a sibling temp file first and is then renamed over the
    /// target, so a failed write leaves the previous file intact.
    pub async fn save(&self, tokens: &TokenSet) -> Res<()> {
        let json = serde_json::to_string_pretty(tokens)?;
        self.write(json.as_bytes())
            .await
            .map_err(|source| Error::TokenPersistenceFailed {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(path = %self.path.display(), "tokens saved");
        Ok(())
    }

    async fn write(&self, content: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent).await?;
        }

        let tmp = self.tmp_path();
        async_fs::write(&tmp, content).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            async_fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600)).await?;
        }

        if let Err(e) = async_fs::rename(&tmp, &self.path).await {
            let _ = async_fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "tokens.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn missing_field(field: &str) -> Error {
    Error::MalformedTokenFile(format!("missing field: {field}"))
}

fn from_epoch_seconds(secs: f64) -> Res<DateTime<Utc>> {
    seconds_to_millis(secs)
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| Error::MalformedTokenFile(format!("expires_at out of range: {secs}")))
}

fn seconds_to_millis(secs: f64) -> Option<i64> {
    let millis = (secs * 1000.0).trunc();
    (millis.is_finite() && millis >= i64::MIN as f64 && millis < i64::MAX as f64)
        .then_some(millis as i64)
}
