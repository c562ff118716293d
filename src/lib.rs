//! Spotify Collector Library
//!
//! This library implements a small personal client for the Spotify Web API.
//! It runs the OAuth 2.0 authorization-code handshake, persists the resulting
//! access/refresh tokens, and issues authenticated, paginated requests to
//! collect a user's playlists and tracks.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the local callback listener
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration file and environment overrides
//! - `error` - Error taxonomy shared by every module
//! - `management` - Durable token storage
//! - `server` - One-shot local HTTP server for the OAuth callback
//! - `spotify` - Authorization flow and Web API client
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use spotcollect::{config::Config, management::TokenStore, spotify::SpotifyClient};
//!
//! #[tokio::main]
//! async fn main() -> spotcollect::Res<()> {
//!     let config = Config::load(&Config::default_path()).await?;
//!     let mut client = SpotifyClient::new(config, TokenStore::new(TokenStore::default_path())).await?;
//!     let playlists = client.user_playlists().await?;
//!     println!("{} playlists", playlists.len());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::Error;

/// A convenient Result type alias for operations that may fail.
///
/// Every fallible operation in the crate reports one of the [`Error`]
/// variants, so callers can match on the failure kind (for example
/// [`Error::TokensNotFound`] to suggest running `spotcollect auth`).
///
/// # Example
///
/// ```
/// use spotcollect::Res;
///
/// async fn fetch_data() -> Res<String> {
///     Ok("data".to_string())
/// }
/// ```
pub type Res<T> = std::result::Result<T, Error>;

/// Prints an informational message with a blue bullet point.
///
/// Used for general information and status updates. Accepts the same
/// arguments as `println!`.
///
/// # Example
///
/// ```
/// info!("Waiting for authorization...");
/// info!("Found {} playlists", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only the binary uses this. Library code returns [`Error`] values and
/// leaves the decision to terminate to its caller.
///
/// # Behavior
///
/// The process exits with status 1 right after printing, so code following
/// the macro does not execute.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// For recoverable issues the user should notice, such as a browser that
/// could not be opened.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
