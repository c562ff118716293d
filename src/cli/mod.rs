//! # CLI Module
//!
//! Command implementations behind the `spotcollect` binary. Each command
//! loads what it needs (configuration, stored tokens), delegates to
//! [`crate::spotify`], and reports progress with the status macros.
//!
//! ## Commands
//!
//! - [`auth`] - Runs the authorization handshake and stores the tokens
//! - [`whoami`] - Shows the authorized user's profile
//! - [`playlists`] - Lists the user's playlists
//! - [`collect`] - Collects playlists with their tracks, optionally top
//!   tracks and audio features, and writes them as JSON
//!
//! ## Usage Patterns
//!
//! ```bash
//! spotcollect auth                                  # Authorize once
//! spotcollect playlists                             # See what is there
//! spotcollect collect --playlist Chillin --output data.json
//! ```

mod auth;
mod collect;
mod playlists;
mod whoami;

use std::{path::PathBuf, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{Res, config::Config, management::TokenStore, spotify::SpotifyClient};

pub use auth::auth;
pub use collect::CollectOptions;
pub use collect::collect;
pub use playlists::playlists;
pub use whoami::whoami;

/// File locations shared by every command.
#[derive(Debug, Clone)]
pub struct Paths {
    pub config: PathBuf,
    pub tokens: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            config: Config::default_path(),
            tokens: TokenStore::default_path(),
        }
    }
}

async fn load_client(paths: &Paths) -> Res<SpotifyClient> {
    let config = Config::load(&paths.config).await?;
    SpotifyClient::new(config, TokenStore::new(&paths.tokens)).await
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
