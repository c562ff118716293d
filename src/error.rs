use std::path::PathBuf;

use serde_json::Value;

/// Every failure the client surfaces to its caller.
///
/// None of these are retried internally. The only retry in the crate is the
/// single refresh-and-retry on a 401 inside [`crate::spotify::SpotifyClient`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Authorization callback did not include a code: {0}")]
    MissingAuthorizationCode(String),

    #[error("No authorization callback received within {0} seconds")]
    AuthorizationTimedOut(u64),

    #[error("Authorization callback state does not match the request")]
    AuthorizationStateMismatch,

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(Value),

    #[error("Tokens not found at {}. Please run `spotcollect auth` first", .0.display())]
    TokensNotFound(PathBuf),

    #[error("Malformed token file: {0}")]
    MalformedTokenFile(String),

    #[error("Unable to save tokens to {}: {source}", path.display())]
    TokenPersistenceFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Spotify API request failed [{status}]: {body}")]
    ApiRequestFailed { status: u16, body: String },

    #[error("Response from {0} is not paginated (no `items` field)")]
    NotPaginated(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status of a failed API request, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ApiRequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
