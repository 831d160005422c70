use anyhow::Context;
use server::{AppState, build_router, config::Config};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::logging::init("info,server=debug,services=debug,tower_http=info");

    let config = Config::from_env().context("Invalid configuration")?;
    let bind_addr = config.bind_addr;
    let state = AppState::from_config(config).await?;
    let app = build_router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    info!(%bind_addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutting down");
}
