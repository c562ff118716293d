use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    Error, Res,
    config::Config,
    management::TokenStore,
    spotify::auth,
    types::TokenSet,
    utils,
};

/// Tokens expiring within this many seconds are refreshed before a request.
pub const DEFAULT_EXPIRY_BUFFER_SECS: i64 = 10;

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Authenticated Spotify Web API client.
///
/// Owns the [`TokenSet`] and is its only writer. Every request takes
/// `&mut self`, so calls are issued strictly one after another.
pub struct SpotifyClient {
    http: Client,
    config: Config,
    store: TokenStore,
    tokens: TokenSet,
    expiry_buffer: Duration,
}

impl SpotifyClient {
    /// Creates a client with the tokens currently held by `store`.
    pub async fn new(config: Config, store: TokenStore) -> Res<Self> {
        let tokens = store.load().await?;
        Self::with_tokens(config, store, tokens)
    }

    pub fn with_tokens(config: Config, store: TokenStore, tokens: TokenSet) -> Res<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            config,
            store,
            tokens,
            expiry_buffer: Duration::seconds(DEFAULT_EXPIRY_BUFFER_SECS),
        })
    }

    pub fn with_expiry_buffer(mut self, buffer: Duration) -> Self {
        self.expiry_buffer = buffer;
        self
    }

    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    /// Obtains a new access token and persists the updated token set.
    pub async fn refresh(&mut self) -> Res<()> {
        let response = auth::refresh_token(
            &self.http,
            &self.config.credentials,
            &self.config.endpoints.token_url,
            &self.tokens.refresh_token,
        )
        .await?;

        self.tokens.apply_refresh(response, Utc::now())?;
        self.store.save(&self.tokens).await?;

        tracing::debug!(expires_at = %self.tokens.expires_at, "access token refreshed");
        Ok(())
    }

    /// Issues one API request and returns the parsed JSON body.
    ///
    /// `endpoint` is either a path relative to the API base URL
    /// (`/v1/me`) or an absolute URL such as a pagination cursor.
    ///
    /// A token about to expire is refreshed first. If the server still
    /// answers 401, the token is refreshed once more and the request is
    /// retried a single time; a second 401 is returned as
    /// [`Error::ApiRequestFailed`]. Empty success bodies yield `Value::Null`.
    pub async fn execute(
        &mut self,
        method: Method,
        endpoint: &str,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Res<Value> {
        if self.tokens.is_expired(self.expiry_buffer) {
            tracing::debug!("access token expiring, refreshing before request");
            self.refresh().await?;
        }

        let url = utils::resolve_url(&self.config.endpoints.api_url, endpoint);

        let mut response = self.send(&method, &url, params, body).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!(%method, %url, "access token rejected, refreshing and retrying once");
            self.refresh().await?;
            response = self.send(&method, &url, params, body).await?;
        }

        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(%method, %url, status = status.as_u16(), "api request completed");

        if status.as_u16() >= 400 {
            return Err(Error::ApiRequestFailed {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn get(&mut self, endpoint: &str, params: &[(&str, &str)]) -> Res<Value> {
        self.execute(Method::GET, endpoint, params, None).await
    }

    pub async fn get_as<T: DeserializeOwned>(
        &mut self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Res<T> {
        let value = self.get(endpoint, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Follows `next` cursors and returns every `items` entry in order.
    ///
    /// The first request uses `endpoint` and `params`; later requests use the
    /// provider's cursor verbatim with no extra parameters. A failure on any
    /// page discards what was collected so far.
    ///
    /// # Errors
    ///
    /// [`Error::NotPaginated`] if a page has no `items` array.
    pub async fn paginate(&mut self, endpoint: &str, params: &[(&str, &str)]) -> Res<Vec<Value>> {
        let mut items = Vec::new();
        let mut cursor = endpoint.to_string();
        let mut params = params;
        let mut pages = 0usize;

        loop {
            let mut page = self.get(&cursor, params).await?;
            pages += 1;

            match page.get_mut("items").map(Value::take) {
                Some(Value::Array(page_items)) => items.extend(page_items),
                _ => return Err(Error::NotPaginated(cursor)),
            }

            match page.get("next").and_then(Value::as_str) {
                Some(next) => {
                    cursor = next.to_string();
                    params = &[];
                }
                None => break,
            }
        }

        tracing::debug!(endpoint, pages, items = items.len(), "pagination finished");
        Ok(items)
    }

    /// Like [`SpotifyClient::paginate`], deserializing every item into `T`.
    pub async fn paginate_as<T: DeserializeOwned>(
        &mut self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Res<Vec<T>> {
        self.paginate(endpoint, params)
            .await?
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(Error::from))
            .collect()
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Res<Response> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(&self.tokens.access_token);

        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }
}
