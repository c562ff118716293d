use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::Tabled;

use crate::{Error, Res};

/// Client credentials registered with the provider. Loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Access/refresh token pair with an absolute expiry.
///
/// `expires_at` is always absolute. Relative `expires_in` values from the
/// provider are converted at the moment they are received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    /// Builds the initial token set from an authorization-code exchange.
    ///
    /// The first exchange must yield a refresh token; without one the
    /// session could never be renewed.
    pub fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Res<Self> {
        let Some(refresh_token) = response.refresh_token else {
            return Err(Error::TokenExchangeFailed(json!({
                "error": "missing_refresh_token",
                "error_description": "authorization code exchange returned no refresh token",
            })));
        };

        let expires_at = expiry_after(now, response.expires_in)?;

        Ok(Self {
            access_token: response.access_token,
            refresh_token,
            expires_at,
        })
    }

    /// Merges a refresh response into this token set.
    ///
    /// The access token and expiry are always replaced. The refresh token is
    /// replaced only when the provider rotated it. An unusable `expires_in`
    /// leaves the token set untouched.
    pub fn apply_refresh(&mut self, response: TokenResponse, now: DateTime<Utc>) -> Res<()> {
        let expires_at = expiry_after(now, response.expires_in)?;

        self.access_token = response.access_token;
        if let Some(refresh_token) = response.refresh_token {
            self.refresh_token = refresh_token;
        }
        self.expires_at = expires_at;
        Ok(())
    }

    /// True once `now + buffer` is past `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        now + buffer > self.expires_at
    }

    pub fn is_expired(&self, buffer: Duration) -> bool {
        self.is_expired_at(Utc::now(), buffer)
    }
}

fn expiry_after(now: DateTime<Utc>, expires_in: i64) -> Res<DateTime<Utc>> {
    Duration::try_seconds(expires_in)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| {
            Error::TokenExchangeFailed(json!({
                "error": "invalid_expires_in",
                "expires_in": expires_in,
            }))
        })
}

/// Successful body of the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Query parameters delivered to the callback listener.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    /// The authorization code, if the callback is acceptable.
    ///
    /// When `expected_state` is given the callback must echo it back.
    pub fn validate(&self, expected_state: Option<&str>) -> Res<&str> {
        if let Some(expected) = expected_state {
            if self.state.as_deref() != Some(expected) {
                return Err(Error::AuthorizationStateMismatch);
            }
        }

        self.code.as_deref().ok_or_else(|| {
            Error::MissingAuthorizationCode(
                self.error
                    .clone()
                    .unwrap_or_else(|| "no `code` query parameter".to_string()),
            )
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackCount {
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub collaborative: bool,
    #[serde(default)]
    pub snapshot_id: Option<String>,
    pub owner: Owner,
    #[serde(default)]
    pub tracks: Option<TrackCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistRef {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumRef {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

/// A track as returned inside playlists and top-track listings.
///
/// Local files carry no `id`, hence the option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub album: Option<AlbumRef>,
}

impl Track {
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub added_at: Option<String>,
    #[serde(default)]
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub id: String,
    pub danceability: f64,
    pub energy: f64,
    pub valence: f64,
    pub tempo: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub speechiness: f64,
    pub loudness: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeaturesResponse {
    pub audio_features: Vec<Option<AudioFeatures>>,
}

/// A playlist together with every track collected from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTracks {
    pub playlist: Playlist,
    pub tracks: Vec<Track>,
}

/// Output document of `spotcollect collect`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    pub collected_at: Option<DateTime<Utc>>,
    pub playlists: Vec<PlaylistTracks>,
    pub top_tracks: Vec<Track>,
    pub audio_features: Vec<AudioFeatures>,
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub name: String,
    pub tracks: String,
    pub owner: String,
}

impl From<&Playlist> for PlaylistTableRow {
    fn from(p: &Playlist) -> Self {
        Self {
            name: p.name.clone(),
            tracks: p
                .tracks
                .as_ref()
                .map(|t| t.total.to_string())
                .unwrap_or_else(|| "-".to_string()),
            owner: p
                .owner
                .display_name
                .clone()
                .unwrap_or_else(|| p.owner.id.clone()),
        }
    }
}

#[derive(Tabled)]
pub struct TrackTableRow {
    pub name: String,
    pub artists: String,
    pub album: String,
}

impl From<&Track> for TrackTableRow {
    fn from(t: &Track) -> Self {
        Self {
            name: t.name.clone(),
            artists: t.artist_names(),
            album: t
                .album
                .as_ref()
                .map(|a| a.name.clone())
                .unwrap_or_default(),
        }
    }
}
