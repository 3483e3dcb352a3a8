use anyhow::Context;
use tracing_subscriber::{fmt, EnvFilter};

use polypath_service::{build_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cfg = Config::from_env()?;
    let addr = cfg.addr()?;
    let app = build_router(AppState::new(cfg.clone()));
    tracing::info!(core_version = %polypath_core::version(), addr = %addr, max_vertices = ?cfg.max_vertices, "starting polypath-service");
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
