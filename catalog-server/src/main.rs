use anyhow::Result;
use catalog_server::config::ServerSettings;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let ax = catalog_server::build().await?;
    let settings = ServerSettings::from_app(&ax.app)?;

    tracing::info!(prefix = %settings.prefix, "catalog server starting");
    ax.listen(settings.addr()).await
}
