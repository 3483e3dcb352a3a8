use std::sync::Arc;

use axum::{routing::{get, post}, Router};

pub mod config;
pub mod errors;
pub mod routes;

pub use config::Config;
pub use errors::AppError;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self { config: Arc::new(config) }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/version", get(routes::version))
        .route("/shortest_path", post(routes::shortest_path))
        .with_state(state)
}
