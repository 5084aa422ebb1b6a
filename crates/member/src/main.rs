use msa_member::config::MemberConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    msa_observability::init();

    let config = MemberConfig::from_env().inspect_err(|e| {
        tracing::error!("invalid member service configuration: {e}");
    })?;

    let app = msa_member::app::build_app(&config).inspect_err(|e| {
        tracing::error!("member service startup failed: {e}");
    })?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
