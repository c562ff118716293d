//! # Spotify Integration Module
//!
//! Authorization and authenticated access to the Spotify Web API.
//!
//! ## Architecture
//!
//! ```text
//! CLI Layer
//!     ↓
//! Spotify Integration Layer
//!     ├── Authorization (code retrieval, token exchange)
//!     ├── Client (bearer auth, refresh, pagination)
//!     └── Library (playlists, tracks, audio features)
//!     ↓
//! HTTP Layer (reqwest, JSON)
//! ```
//!
//! ## Token Lifecycle
//!
//! A token set is either valid (`now + buffer` has not passed `expires_at`)
//! or in need of a refresh. The only transition back to valid is a
//! successful refresh, which the client performs:
//!
//! - **Proactively**, before a request, when the token is inside the
//!   10-second expiry buffer
//! - **Reactively**, exactly once, when a request is answered with 401
//!
//! Every refresh is persisted through [`crate::management::TokenStore`]
//! before the request continues.
//!
//! ## Pagination
//!
//! Collection endpoints return an `items` array and a `next` cursor. The
//! cursor is an opaque URL and is requested verbatim until it is `null`.
//!
//! ## Usage Patterns
//!
//! ```rust
//! let mut client = SpotifyClient::new(config, store).await?;
//! let playlists = client.user_playlists().await?;
//! let tracks = client.playlist_tracks(&playlists[0].id).await?;
//! ```
//!
//! ## Error Types
//!
//! All functions return [`crate::Res`]; see [`crate::Error`] for the
//! failure kinds.

pub mod auth;
mod client;
mod library;

pub use client::DEFAULT_EXPIRY_BUFFER_SECS;
pub use client::SpotifyClient;
