use chrono::{Duration, Utc};
use reqwest::Method;
use serde_json::{Value, json};
use spotcollect::{
    Error,
    config::Config,
    management::TokenStore,
    spotify::SpotifyClient,
    types::{Credentials, TokenSet},
};
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param, query_param_is_missing},
};

struct Fixture {
    server: MockServer,
    dir: TempDir,
}

impl Fixture {
    async fn new() -> Self {
        Self {
            server: MockServer::start().await,
            dir: TempDir::new().unwrap(),
        }
    }

    fn config(&self) -> Config {
        let mut config = Config::new(Credentials {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://127.0.0.1:8080/callback".to_string(),
        });
        config.endpoints.token_url = format!("{}/api/token", self.server.uri());
        config.endpoints.api_url = self.server.uri();
        config
    }

    fn store(&self) -> TokenStore {
        TokenStore::new(self.dir.path().join("tokens.json"))
    }

    fn client(&self, tokens: TokenSet) -> SpotifyClient {
        SpotifyClient::with_tokens(self.config(), self.store(), tokens).unwrap()
    }

    async fn mount_token_endpoint(&self, body: Value, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }
}

fn valid_tokens() -> TokenSet {
    TokenSet {
        access_token: "old".to_string(),
        refresh_token: "refresh".to_string(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

fn expired_tokens() -> TokenSet {
    TokenSet {
        expires_at: Utc::now() - Duration::seconds(1),
        ..valid_tokens()
    }
}

fn fresh_token_response() -> Value {
    json!({"access_token": "fresh", "token_type": "Bearer", "expires_in": 3600})
}

#[tokio::test]
async fn test_execute_sends_bearer_token() {
    let fx = Fixture::new().await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "me"})))
        .expect(1)
        .mount(&fx.server)
        .await;
    fx.mount_token_endpoint(fresh_token_response(), 0).await;

    let mut client = fx.client(valid_tokens());
    let body = client.execute(Method::GET, "/v1/me", &[], None).await.unwrap();

    assert_eq!(body["id"], "me");
}

#[tokio::test]
async fn test_proactive_refresh_before_request() {
    let fx = Fixture::new().await;
    fx.mount_token_endpoint(fresh_token_response(), 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "me"})))
        .expect(1)
        .mount(&fx.server)
        .await;

    let mut client = fx.client(expired_tokens());
    client.execute(Method::GET, "/v1/me", &[], None).await.unwrap();

    // Refreshed tokens are persisted; refresh token retained
    let stored = fx.store().load().await.unwrap();
    assert_eq!(stored.access_token, "fresh");
    assert_eq!(stored.refresh_token, "refresh");
    assert!(stored.expires_at > Utc::now() + Duration::minutes(59));
}

#[tokio::test]
async fn test_token_inside_buffer_is_refreshed() {
    let fx = Fixture::new().await;
    fx.mount_token_endpoint(fresh_token_response(), 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&fx.server)
        .await;

    let tokens = TokenSet {
        expires_at: Utc::now() + Duration::seconds(5),
        ..valid_tokens()
    };
    let mut client = fx.client(tokens);
    client.execute(Method::GET, "/v1/me", &[], None).await.unwrap();

    assert_eq!(client.tokens().access_token, "fresh");
}

#[tokio::test]
async fn test_custom_expiry_buffer_refreshes_earlier() {
    let fx = Fixture::new().await;
    fx.mount_token_endpoint(fresh_token_response(), 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&fx.server)
        .await;

    // Valid for another hour, but inside a two-hour buffer
    let mut client = fx
        .client(valid_tokens())
        .with_expiry_buffer(Duration::hours(2));
    client.execute(Method::GET, "/v1/me", &[], None).await.unwrap();

    assert_eq!(client.tokens().access_token, "fresh");
}

#[tokio::test]
async fn test_refresh_with_unusable_expiry_keeps_tokens() {
    let fx = Fixture::new().await;
    fx.mount_token_endpoint(
        json!({"access_token": "fresh", "expires_in": 10_000_000_000_000_000_i64}),
        1,
    )
    .await;

    let tokens = valid_tokens();
    let mut client = fx.client(tokens.clone());
    assert!(matches!(
        client.refresh().await,
        Err(Error::TokenExchangeFailed(_))
    ));

    assert_eq!(client.tokens(), &tokens);
    assert!(matches!(
        fx.store().load().await,
        Err(Error::TokensNotFound(_))
    ));
}

#[tokio::test]
async fn test_refresh_rotates_refresh_token_when_provided() {
    let fx = Fixture::new().await;
    fx.mount_token_endpoint(
        json!({"access_token": "fresh", "refresh_token": "rotated", "expires_in": 3600}),
        1,
    )
    .await;

    let mut client = fx.client(valid_tokens());
    client.refresh().await.unwrap();

    assert_eq!(client.tokens().refresh_token, "rotated");
    assert_eq!(fx.store().load().await.unwrap().refresh_token, "rotated");
}

#[tokio::test]
async fn test_unauthorized_triggers_single_refresh_and_retry() {
    let fx = Fixture::new().await;
    fx.mount_token_endpoint(fresh_token_response(), 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"status": 401, "message": "The access token expired"}
        })))
        .expect(1)
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "me"})))
        .expect(1)
        .mount(&fx.server)
        .await;

    let mut client = fx.client(valid_tokens());
    let body = client.execute(Method::GET, "/v1/me", &[], None).await.unwrap();

    assert_eq!(body["id"], "me");
    assert_eq!(fx.store().load().await.unwrap().access_token, "fresh");
}

#[tokio::test]
async fn test_second_unauthorized_is_not_retried() {
    let fx = Fixture::new().await;
    fx.mount_token_endpoint(fresh_token_response(), 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(401).set_body_string("revoked"))
        .expect(2)
        .mount(&fx.server)
        .await;

    let mut client = fx.client(valid_tokens());
    match client.execute(Method::GET, "/v1/me", &[], None).await {
        Err(Error::ApiRequestFailed { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "revoked");
        }
        other => panic!("expected ApiRequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_refresh_propagates() {
    let fx = Fixture::new().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .expect(1)
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&fx.server)
        .await;

    let mut client = fx.client(expired_tokens());
    assert!(matches!(
        client.execute(Method::GET, "/v1/me", &[], None).await,
        Err(Error::TokenExchangeFailed(_))
    ));
}

#[tokio::test]
async fn test_error_status_fails_without_refresh() {
    let fx = Fixture::new().await;
    fx.mount_token_endpoint(fresh_token_response(), 0).await;
    Mock::given(method("GET"))
        .and(path("/v1/playlists/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&fx.server)
        .await;

    let mut client = fx.client(valid_tokens());
    let err = client
        .execute(Method::GET, "/v1/playlists/missing", &[], None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_execute_sends_params_and_json_body() {
    let fx = Fixture::new().await;
    Mock::given(method("PUT"))
        .and(path("/v1/me/player/volume"))
        .and(query_param("volume_percent", "50"))
        .and(body_json(json!({"device": "abc"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&fx.server)
        .await;

    let mut client = fx.client(valid_tokens());
    let body = client
        .execute(
            Method::PUT,
            "/v1/me/player/volume",
            &[("volume_percent", "50")],
            Some(&json!({"device": "abc"})),
        )
        .await
        .unwrap();

    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_paginate_follows_cursors_in_order() {
    let fx = Fixture::new().await;
    let uri = fx.server.uri();

    Mock::given(method("GET"))
        .and(path("/v1/me/playlists"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"n": 1}, {"n": 2}],
            "next": format!("{uri}/cursor/2")
        })))
        .expect(1)
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .and(query_param_is_missing("limit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"n": 3}, {"n": 4}],
            "next": format!("{uri}/cursor/3")
        })))
        .expect(1)
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cursor/3"))
        .and(query_param_is_missing("limit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"n": 5}],
            "next": null
        })))
        .expect(1)
        .mount(&fx.server)
        .await;

    let mut client = fx.client(valid_tokens());
    let items = client
        .paginate("/v1/me/playlists", &[("limit", "2")])
        .await
        .unwrap();

    let numbers: Vec<i64> = items.iter().map(|i| i["n"].as_i64().unwrap()).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_paginate_stops_when_next_is_absent() {
    let fx = Fixture::new().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&fx.server)
        .await;

    let mut client = fx.client(valid_tokens());
    let items = client.paginate("/v1/me/top/tracks", &[]).await.unwrap();

    assert!(items.is_empty());
}

#[tokio::test]
async fn test_paginate_without_items_is_not_paginated() {
    let fx = Fixture::new().await;
    let uri = fx.server.uri();
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "me",
            "next": format!("{uri}/cursor/2")
        })))
        .expect(1)
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(0)
        .mount(&fx.server)
        .await;

    let mut client = fx.client(valid_tokens());
    match client.paginate("/v1/me", &[]).await {
        Err(Error::NotPaginated(endpoint)) => assert_eq!(endpoint, "/v1/me"),
        other => panic!("expected NotPaginated, got {other:?}"),
    }
}

#[tokio::test]
async fn test_paginate_failure_mid_way_propagates() {
    let fx = Fixture::new().await;
    let uri = fx.server.uri();
    Mock::given(method("GET"))
        .and(path("/v1/me/playlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"n": 1}],
            "next": format!("{uri}/cursor/2")
        })))
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&fx.server)
        .await;

    let mut client = fx.client(valid_tokens());
    let err = client.paginate("/v1/me/playlists", &[]).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_playlist_tracks_skips_unavailable_entries() {
    let fx = Fixture::new().await;
    Mock::given(method("GET"))
        .and(path("/v1/playlists/pl1/tracks"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"added_at": "2024-01-01T00:00:00Z", "track": {
                    "id": "t1", "name": "One", "uri": "spotify:track:t1",
                    "duration_ms": 1000, "artists": [{"id": "a1", "name": "Artist"}],
                    "album": {"id": "al1", "name": "Album"}
                }},
                {"added_at": "2024-01-02T00:00:00Z", "track": null}
            ],
            "next": null
        })))
        .mount(&fx.server)
        .await;

    let mut client = fx.client(valid_tokens());
    let tracks = client.playlist_tracks("pl1").await.unwrap();

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id.as_deref(), Some("t1"));
    assert_eq!(tracks[0].artist_names(), "Artist");
}

#[tokio::test]
async fn test_user_playlists_and_current_user() {
    let fx = Fixture::new().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/playlists"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "pl1", "name": "Chillin", "collaborative": false,
                "owner": {"id": "me", "display_name": "Me"},
                "tracks": {"total": 12}
            }],
            "next": null
        })))
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "me", "display_name": "Me", "product": "premium"
        })))
        .mount(&fx.server)
        .await;

    let mut client = fx.client(valid_tokens());

    let playlists = client.user_playlists().await.unwrap();
    assert_eq!(playlists.len(), 1);
    assert_eq!(playlists[0].name, "Chillin");
    assert_eq!(playlists[0].tracks.as_ref().map(|t| t.total), Some(12));

    let user = client.current_user().await.unwrap();
    assert_eq!(user.id, "me");
    assert_eq!(user.product.as_deref(), Some("premium"));
}

#[tokio::test]
async fn test_audio_features_batches_ids() {
    let fx = Fixture::new().await;
    let features = |id: &str| {
        json!({
            "id": id, "danceability": 0.5, "energy": 0.5, "valence": 0.5, "tempo": 120.0,
            "acousticness": 0.1, "instrumentalness": 0.0, "speechiness": 0.05, "loudness": -6.0
        })
    };
    Mock::given(method("GET"))
        .and(path("/v1/audio-features"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "audio_features": [features("x"), null]
        })))
        .expect(2)
        .mount(&fx.server)
        .await;

    let ids: Vec<String> = (0..150).map(|i| format!("id{i}")).collect();
    let mut client = fx.client(valid_tokens());
    let result = client.audio_features(&ids).await.unwrap();

    // One feature per batch, nulls dropped
    assert_eq!(result.len(), 2);
}
