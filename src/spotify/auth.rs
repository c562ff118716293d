use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, header::AUTHORIZATION};
use serde_json::{Value, json};

use crate::{
    Error, Res,
    config::Config,
    info,
    management::TokenStore,
    server::CallbackServer,
    types::{Credentials, TokenResponse, TokenSet},
    utils, warning,
};

/// How long the handshake waits for the browser redirect.
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// Builds the consent URL for the configured client, scope and `state`.
pub fn authorize_url(config: &Config, state: &str) -> Res<String> {
    utils::build_authorize_url(
        &config.endpoints.auth_url,
        &config.credentials.client_id,
        &config.credentials.redirect_uri,
        &config.scope,
        state,
    )
}

/// Runs the complete authorization-code handshake and persists the tokens.
///
/// 1. Starts the local callback listener on the redirect URI's address
/// 2. Opens the consent page in the default browser
/// 3. Waits (at most `timeout`) for the single redirect carrying the code
/// 4. Exchanges the code for a token pair
/// 5. Saves the [`TokenSet`] through `store`
///
/// # Errors
///
/// - [`Error::AuthorizationTimedOut`] if no redirect arrives in time
/// - [`Error::MissingAuthorizationCode`] if the redirect has no `code`
/// - [`Error::TokenExchangeFailed`] if the provider rejects the code
/// - [`Error::TokenPersistenceFailed`] if the tokens cannot be written
pub async fn authenticate(config: &Config, store: &TokenStore, timeout: Duration) -> Res<TokenSet> {
    let code = retrieve_authorization_code(config, timeout).await?;

    let http = Client::new();
    let response = exchange_code(&http, config, &code).await?;
    let tokens = TokenSet::from_response(response, Utc::now())?;
    store.save(&tokens).await?;

    Ok(tokens)
}

/// Directs the user to the consent screen and captures the redirected code.
///
/// There is no retry: a failed or missing callback ends the handshake.
pub async fn retrieve_authorization_code(config: &Config, timeout: Duration) -> Res<String> {
    let state = utils::generate_state();
    let server = CallbackServer::bind(
        &config.server_addr()?,
        &config.callback_path()?,
        Some(state.clone()),
    )
    .await?;
    let auth_url = authorize_url(config, &state)?;

    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    info!("Waiting for authorization...");
    server.wait_for_code(timeout).await
}

/// Exchanges an authorization code for the first token pair.
pub async fn exchange_code(http: &Client, config: &Config, code: &str) -> Res<TokenResponse> {
    request_token(
        http,
        &config.credentials,
        &config.endpoints.token_url,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &config.credentials.redirect_uri),
        ],
    )
    .await
}

/// Renews the access token.
///
/// The response may omit `refresh_token`; callers keep their current one in
/// that case (see [`TokenSet::apply_refresh`]).
pub async fn refresh_token(
    http: &Client,
    credentials: &Credentials,
    token_url: &str,
    refresh_token: &str,
) -> Res<TokenResponse> {
    request_token(
        http,
        credentials,
        token_url,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ],
    )
    .await
}

async fn request_token(
    http: &Client,
    credentials: &Credentials,
    token_url: &str,
    form: &[(&str, &str)],
) -> Res<TokenResponse> {
    let res = http
        .post(token_url)
        .header(
            AUTHORIZATION,
            utils::basic_auth_header(&credentials.client_id, &credentials.client_secret),
        )
        .form(form)
        .send()
        .await?;

    let status = res.status();
    let body = res.text().await?;

    let payload: Value = match serde_json::from_str(&body) {
        Ok(payload) => payload,
        Err(_) => {
            return Err(Error::TokenExchangeFailed(json!({
                "status": status.as_u16(),
                "body": body,
            })));
        }
    };

    if payload.get("error").is_some() || !status.is_success() {
        tracing::debug!(status = status.as_u16(), "token endpoint returned an error");
        return Err(Error::TokenExchangeFailed(payload));
    }

    match serde_json::from_value::<TokenResponse>(payload.clone()) {
        Ok(token) => {
            tracing::debug!(
                rotated_refresh_token = token.refresh_token.is_some(),
                expires_in = token.expires_in,
                "token endpoint issued an access token"
            );
            Ok(token)
        }
        Err(_) => Err(Error::TokenExchangeFailed(payload)),
    }
}
