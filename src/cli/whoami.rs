use crate::{Res, cli, info};

pub async fn whoami(paths: &cli::Paths) -> Res<()> {
    let mut client = cli::load_client(paths).await?;
    let user = client.current_user().await?;

    info!(
        "Logged in as {} ({})",
        user.display_name.as_deref().unwrap_or(&user.id),
        user.id
    );
    if let Some(product) = &user.product {
        info!("Subscription: {}", product);
    }
    if let Some(country) = &user.country {
        info!("Country: {}", country);
    }
    Ok(())
}
