use crate::{
    Res,
    spotify::SpotifyClient,
    types::{AudioFeatures, AudioFeaturesResponse, Playlist, PlaylistItem, Track, User},
};

/// Maximum ids accepted by `GET /v1/audio-features`.
const AUDIO_FEATURES_BATCH: usize = 100;

impl SpotifyClient {
    /// Profile of the authorized user. Also serves as a token check.
    pub async fn current_user(&mut self) -> Res<User> {
        self.get_as("/v1/me", &[]).await
    }

    pub async fn user_playlists(&mut self) -> Res<Vec<Playlist>> {
        self.paginate_as("/v1/me/playlists", &[("limit", "50")])
            .await
    }

    /// Tracks of a playlist in playlist order.
    ///
    /// Entries whose track is no longer available come back as `null` and
    /// are skipped.
    pub async fn playlist_tracks(&mut self, playlist_id: &str) -> Res<Vec<Track>> {
        let endpoint = format!("/v1/playlists/{playlist_id}/tracks");
        let items: Vec<PlaylistItem> = self.paginate_as(&endpoint, &[("limit", "100")]).await?;
        Ok(items.into_iter().filter_map(|item| item.track).collect())
    }

    /// The user's top tracks for `time_range` (`short_term`, `medium_term`
    /// or `long_term`).
    pub async fn top_tracks(&mut self, time_range: &str) -> Res<Vec<Track>> {
        self.paginate_as(
            "/v1/me/top/tracks",
            &[("time_range", time_range), ("limit", "50")],
        )
        .await
    }

    /// Audio features for `track_ids`, requested in batches of 100.
    ///
    /// Ids the provider has no features for are dropped.
    pub async fn audio_features(&mut self, track_ids: &[String]) -> Res<Vec<AudioFeatures>> {
        let mut features = Vec::with_capacity(track_ids.len());

        for chunk in track_ids.chunks(AUDIO_FEATURES_BATCH) {
            let ids = chunk.join(",");
            let response: AudioFeaturesResponse = self
                .get_as("/v1/audio-features", &[("ids", ids.as_str())])
                .await?;
            features.extend(response.audio_features.into_iter().flatten());
        }

        Ok(features)
    }
}
