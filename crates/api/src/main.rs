use gymops_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gymops_observability::init();

    let config = AppConfig::from_env()?;
    let facade = gymops_api::app::services::build_facade(&config).await?;
    let app = gymops_api::app::build_app(facade);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        central_warehouse = %config.inventory.central_warehouse,
        "listening on {}",
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;
    Ok(())
}
