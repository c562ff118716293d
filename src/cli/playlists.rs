use tabled::Table;

use crate::{Res, cli, info, types::PlaylistTableRow};

pub async fn playlists(paths: &cli::Paths) -> Res<()> {
    let mut client = cli::load_client(paths).await?;

    let pb = cli::spinner("Fetching playlists...");
    let playlists = client.user_playlists().await;
    pb.finish_and_clear();
    let playlists = playlists?;

    if playlists.is_empty() {
        info!("No playlists found");
        return Ok(());
    }

    let rows: Vec<PlaylistTableRow> = playlists.iter().map(PlaylistTableRow::from).collect();
    let table = Table::new(rows);
    println!("{}", table);

    info!("{} playlists", playlists.len());
    Ok(())
}
