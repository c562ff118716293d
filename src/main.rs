use std::{path::PathBuf, time::Duration};

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use spotcollect::{
    cli::{self, CollectOptions, Paths},
    config, error,
    spotify::auth::DEFAULT_CALLBACK_TIMEOUT,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Path to the credentials file (defaults to the local data directory)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the token file (defaults to the local data directory)
    #[clap(long, global = true)]
    tokens: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[clap(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth(AuthOptions),

    /// Show the authorized user
    Whoami,

    /// List your playlists
    Playlists,

    /// Collect playlists and their tracks
    Collect(CollectArgs),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    /// Seconds to wait for the browser redirect
    #[clap(long, default_value_t = DEFAULT_CALLBACK_TIMEOUT.as_secs())]
    timeout: u64,
}

#[derive(Parser, Debug, Clone)]
pub struct CollectArgs {
    /// Playlist name to collect; can be repeated (default: all playlists)
    #[clap(long = "playlist")]
    playlists: Vec<String>,

    /// Also collect top tracks for a time range
    #[clap(long, value_parser = ["short_term", "medium_term", "long_term"])]
    top_tracks: Option<String>,

    /// Fetch audio features for every collected track
    #[clap(long)]
    audio_features: bool,

    /// Write the collection as JSON to this file
    #[clap(long, short)]
    output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "spotcollect=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    init_tracing(args.verbose);

    if let Err(e) = config::load_env() {
        error!("Cannot load environment. Err: {}", e);
    }

    let defaults = Paths::default();
    let paths = Paths {
        config: args.config.unwrap_or(defaults.config),
        tokens: args.tokens.unwrap_or(defaults.tokens),
    };

    let result = match args.command {
        Command::Auth(opt) => cli::auth(&paths, Duration::from_secs(opt.timeout)).await,
        Command::Whoami => cli::whoami(&paths).await,
        Command::Playlists => cli::playlists(&paths).await,
        Command::Collect(opt) => {
            let opts = CollectOptions {
                playlists: opt.playlists,
                top_tracks: opt.top_tracks,
                audio_features: opt.audio_features,
                output: opt.output,
            };
            cli::collect(&paths, &opts).await
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{}", e);
    }
}
