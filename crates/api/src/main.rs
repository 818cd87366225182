use std::net::SocketAddr;

use anyhow::Context;

use reclaim_infra::EngineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real deployments set the environment directly.
    let _ = dotenvy::dotenv();
    reclaim_observability::init();

    let config = EngineConfig::from_env();
    let services = reclaim_api::app::services::build_services(&config);
    let app = reclaim_api::app::build_app(services);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        environment = config.environment.as_str(),
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
