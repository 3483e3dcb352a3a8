use axum::extract::{Query, State};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, info_span};

use polypath_core::{EarClipping, PathResult, ShortestPathPlanner, ShortestPathRequest};

use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ShortestPathQuery {
    #[serde(default)]
    pub steps: bool,
}

#[derive(Debug, Serialize)]
pub struct Healthz { pub status: &'static str }

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(Healthz { status: "ok" }))
}

pub async fn version() -> impl IntoResponse {
    let svc_version = env!("CARGO_PKG_VERSION");
    let core_version = polypath_core::version();
    (StatusCode::OK, Json(json!({"service_version": svc_version, "core_version": core_version})))
}

pub async fn shortest_path(
    State(state): State<AppState>,
    Query(params): Query<ShortestPathQuery>,
    Json(req): Json<ShortestPathRequest>,
) -> Result<Json<PathResult>, AppError> {
    let span = info_span!("shortest_path", vertices = req.vertices.len(), steps = params.steps);
    let _enter = span.enter();

    if req.vertices.len() < 3 {
        return Err(AppError::BadRequest(format!("polygon needs at least 3 vertices, got {}", req.vertices.len())));
    }
    let mut options = req.options.unwrap_or_default();
    if let Some(cap) = state.config.max_vertices {
        options.max_vertices = options.max_vertices.min(cap);
    }

    let result = ShortestPathPlanner::new(&req.vertices, &EarClipping, options).and_then(|planner| {
        if params.steps {
            planner.plan_with_steps(req.start, req.target)
        } else {
            planner.plan(req.start, req.target)
        }
    });

    match result {
        Ok(res) => {
            info!(points = res.path.len(), length = res.length, diagonals = res.diagonals_crossed.len(), "shortest_path done");
            Ok(Json(res))
        }
        Err(e) => {
            error!(code = e.code(), error = %e, "shortest_path error");
            Err(e.into())
        }
    }
}
