use anyhow::Context;

use stockroom_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let service = stockroom_api::app::build_service(&config).await?;
    let app = stockroom_api::app::build_app(service);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("stockroom started at http://{}/", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
