use base64::{Engine, engine::general_purpose::STANDARD};
use rand::{Rng, distr::Alphanumeric};
use reqwest::Url;

use crate::{Error, Res};

/// Random alphanumeric nonce for the authorization `state` parameter.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// `Basic <base64(client_id:client_secret)>` for the token endpoint.
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    let encoded = STANDARD.encode(format!("{client_id}:{client_secret}"));
    format!("Basic {encoded}")
}

/// Builds the provider consent URL the user is sent to.
pub fn build_authorize_url(
    auth_url: &str,
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
    state: &str,
) -> Res<String> {
    let url = Url::parse_with_params(
        auth_url,
        &[
            ("client_id", client_id),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri),
            ("scope", scope),
            ("state", state),
        ],
    )
    .map_err(|e| Error::Config(format!("invalid authorization url {auth_url:?}: {e}")))?;

    Ok(url.into())
}

/// Resolves an endpoint against the API base URL.
///
/// Absolute URLs, such as the `next` cursor of a page, are returned as they
/// are; anything else is appended to `base`.
pub fn resolve_url(base: &str, endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return endpoint.to_string();
    }

    let base = base.trim_end_matches('/');
    if endpoint.starts_with('/') {
        format!("{base}{endpoint}")
    } else {
        format!("{base}/{endpoint}")
    }
}
