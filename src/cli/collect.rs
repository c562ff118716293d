use std::path::{Path, PathBuf};

use chrono::Utc;
use tabled::Table;

use crate::{
    Res, cli, info, success,
    types::{Collection, PlaylistTableRow, PlaylistTracks, TrackTableRow},
    warning,
};

#[derive(Debug, Clone, Default)]
pub struct CollectOptions {
    /// Playlist names to collect; all playlists when empty.
    pub playlists: Vec<String>,
    /// Also collect top tracks for this time range.
    pub top_tracks: Option<String>,
    pub audio_features: bool,
    pub output: Option<PathBuf>,
}

pub async fn collect(paths: &cli::Paths, opts: &CollectOptions) -> Res<()> {
    let mut client = cli::load_client(paths).await?;

    let pb = cli::spinner("Fetching playlists...");
    let playlists = client.user_playlists().await;
    pb.finish_and_clear();
    let playlists = playlists?;

    let selected: Vec<_> = playlists
        .into_iter()
        .filter(|p| opts.playlists.is_empty() || opts.playlists.contains(&p.name))
        .collect();

    for name in &opts.playlists {
        if !selected.iter().any(|p| &p.name == name) {
            warning!("Playlist {} not found", name);
        }
    }

    let mut collection = Collection {
        collected_at: Some(Utc::now()),
        ..Default::default()
    };

    for playlist in selected {
        let pb = cli::spinner(&format!("Fetching tracks of {}...", playlist.name));
        let tracks = client.playlist_tracks(&playlist.id).await;
        pb.finish_and_clear();
        let tracks = tracks?;

        success!("{}: {} tracks", playlist.name, tracks.len());
        collection.playlists.push(PlaylistTracks { playlist, tracks });
    }

    if let Some(time_range) = &opts.top_tracks {
        let pb = cli::spinner("Fetching top tracks...");
        let tracks = client.top_tracks(time_range).await;
        pb.finish_and_clear();
        collection.top_tracks = tracks?;

        success!("Top tracks ({}): {}", time_range, collection.top_tracks.len());
        let rows: Vec<TrackTableRow> = collection
            .top_tracks
            .iter()
            .map(TrackTableRow::from)
            .collect();
        println!("{}", Table::new(rows));
    }

    if opts.audio_features {
        let mut ids: Vec<String> = collection
            .playlists
            .iter()
            .flat_map(|p| p.tracks.iter())
            .chain(collection.top_tracks.iter())
            .filter_map(|t| t.id.clone())
            .collect();
        ids.sort();
        ids.dedup();

        let pb = cli::spinner("Fetching audio features...");
        let features = client.audio_features(&ids).await;
        pb.finish_and_clear();
        collection.audio_features = features?;

        success!(
            "Audio features for {} of {} tracks",
            collection.audio_features.len(),
            ids.len()
        );
    }

    if !collection.playlists.is_empty() {
        let rows: Vec<PlaylistTableRow> = collection
            .playlists
            .iter()
            .map(|p| PlaylistTableRow::from(&p.playlist))
            .collect();
        println!("{}", Table::new(rows));
    } else {
        info!("No playlists collected");
    }

    if let Some(output) = &opts.output {
        write_collection(output, &collection).await?;
        success!("Collection written to {}", output.display());
    }

    Ok(())
}

async fn write_collection(path: &Path, collection: &Collection) -> Res<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        async_fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(collection)?;
    async_fs::write(path, json).await?;
    Ok(())
}
