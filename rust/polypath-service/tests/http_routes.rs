use axum::{body::Body, http::{Request, StatusCode}};
use http_body_util::BodyExt;
use polypath_service::{build_router, AppState, Config};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

fn app() -> axum::Router {
    build_router(AppState::new(Config::default()))
}

async fn post_json(router: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn l_shape() -> Value {
    json!([[0, 0], [6, 0], [6, 2], [2, 2], [2, 6], [0, 6]])
}

#[tokio::test]
async fn healthz_and_version() {
    let resp = app().oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let v: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["status"], "ok");

    let resp = app().oneshot(Request::builder().uri("/version").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let v: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["core_version"], polypath_core::version());
}

#[tokio::test]
async fn shortest_path_around_the_corner() {
    let body = json!({"vertices": l_shape(), "start": [5, 1], "target": [1, 5]});
    let (status, v) = post_json(app(), "/shortest_path", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["path"], json!([[5.0, 1.0], [2.0, 2.0], [1.0, 5.0]]));
    assert!((v["length"].as_f64().unwrap() - 2.0 * 10f64.sqrt()).abs() < 1e-9);
    assert!(v.get("steps").is_none());
}

#[tokio::test]
async fn steps_flag_returns_snapshots() {
    let body = json!({"vertices": l_shape(), "start": [5, 1], "target": [1, 5]});
    let (status, v) = post_json(app(), "/shortest_path?steps=true", body).await;
    assert_eq!(status, StatusCode::OK);
    let steps = v["steps"].as_array().unwrap();
    let diagonals = v["diagonals_crossed"].as_array().unwrap().len();
    assert_eq!(steps.len(), diagonals + 2);
    assert_eq!(steps.last().unwrap()["finalized"], true);
}

#[tokio::test]
async fn outside_point_is_unprocessable() {
    let body = json!({"vertices": l_shape(), "start": [5, 1], "target": [4, 4]});
    let (status, v) = post_json(app(), "/shortest_path", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(v["error"]["code"], "POINT_NOT_IN_POLYGON");
}

#[tokio::test]
async fn vertex_cap_from_config_applies() {
    let router = build_router(AppState::new(Config { max_vertices: Some(4), ..Config::default() }));
    let body = json!({"vertices": l_shape(), "start": [5, 1], "target": [1, 5]});
    let (status, v) = post_json(router, "/shortest_path", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(v["error"]["code"], "POLYGON_REJECTED");
}

#[tokio::test]
async fn too_few_vertices_is_a_bad_request() {
    let body = json!({"vertices": [[0, 0], [1, 0]], "start": [0, 0], "target": [1, 0]});
    let (status, v) = post_json(app(), "/shortest_path", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"]["code"], "bad_request");
}

#[tokio::test]
async fn unit_square_plans_with_default_options() {
    let body = json!({"vertices": [[0, 0], [1, 0], [1, 1], [0, 1]], "start": [0.25, 0.25], "target": [0.75, 0.75]});
    let (status, v) = post_json(app(), "/shortest_path", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["path"], json!([[0.25, 0.25], [0.75, 0.75]]));
}
