use msa_gateway::config::GatewayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    msa_observability::init();

    let config = GatewayConfig::from_env().inspect_err(|e| {
        tracing::error!("invalid gateway configuration: {e}");
    })?;

    // A weak or missing secret aborts here, before the listener exists.
    let app = msa_gateway::app::build_app(&config).inspect_err(|e| {
        tracing::error!("gateway startup failed: {e}");
    })?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
