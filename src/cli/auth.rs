use std::time::Duration;

use crate::{
    Res, cli::Paths, config::Config, management::TokenStore, spotify, success,
};

pub async fn auth(paths: &Paths, timeout: Duration) -> Res<()> {
    let config = Config::load(&paths.config).await?;
    let store = TokenStore::new(&paths.tokens);

    let tokens = spotify::auth::authenticate(&config, &store, timeout).await?;

    success!(
        "Authentication successful! Tokens saved to {} (valid until {})",
        store.path().display(),
        tokens.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}
