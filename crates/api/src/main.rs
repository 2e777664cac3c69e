use anyhow::Context;

use purchreq_api::{app, archive, config::AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    purchreq_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let retention = config
        .retention
        .to_std()
        .context("retention period out of range")?;
    archive::spawn_retention(config.archive_dir.clone(), retention);

    let app = app::build_app(app::AppServices::from_config(&config));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!(
        archive_dir = %config.archive_dir.display(),
        "listening on {}",
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;
    Ok(())
}
