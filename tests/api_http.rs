// tests/api_http.rs
//
// HTTP-level tests for the UI Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot, backed by
// an in-memory feed source.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{self, Body},
    http::{Request, StatusCode},
};
use serde_json::{Value as Json, json};
use tower::ServiceExt as _; // for `oneshot`

use quakemap::dashboard::Dashboard;
use quakemap::errors::QuakeError;
use quakemap::feed::{FeedSource, FeedWindow};
use quakemap::models::FeatureCollection;
use quakemap::server::{AppState, create_router};
use quakemap::state::{FilterState, Generation};

const BODY_LIMIT: usize = 1024 * 1024;

struct FixedFeed;

#[async_trait]
impl FeedSource for FixedFeed {
    async fn fetch(&self, window: FeedWindow) -> Result<FeatureCollection, QuakeError> {
        let features = match window {
            FeedWindow::Day => json!([
                { "id": "d1", "properties": { "mag": 5.2, "place": "Offshore" }, "geometry": { "coordinates": [142.0, 38.0, 20.0] } },
                { "id": "d2", "properties": { "mag": 1.8 }, "geometry": { "coordinates": [-122.8, 38.8, 2.0] } },
                { "id": "d3", "properties": {}, "geometry": { "coordinates": [] } }
            ]),
            FeedWindow::Week => json!([
                { "id": "w1", "properties": { "mag": 3.9 }, "geometry": { "coordinates": [10.0, 10.0, 5.0] } },
                { "id": "w2", "properties": { "mag": 4.0 }, "geometry": { "coordinates": [20.0, 20.0, 5.0] } },
                { "id": "w3", "properties": { "mag": 6.1, "tsunami": 1 }, "geometry": { "coordinates": [30.0, 30.0, 5.0] } }
            ]),
            FeedWindow::Month => {
                return Err(QuakeError::Api {
                    status: 500,
                    message: "Internal Server Error".into(),
                });
            }
        };
        Ok(serde_json::from_value(json!({ "type": "FeatureCollection", "features": features }))?)
    }
}

fn test_dashboard() -> Arc<Dashboard> {
    Dashboard::new(
        Arc::new(FixedFeed),
        FilterState::default(),
        Duration::from_secs(5),
    )
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Json) {
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET")
}

fn post(uri: &str, payload: &Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST")
}

#[tokio::test]
async fn health_returns_ok() {
    let app = create_router(AppState::new(test_dashboard()));
    let resp = app.oneshot(get("/health")).await.expect("oneshot");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn index_serves_map_page() {
    let app = create_router(AppState::new(test_dashboard()));
    let resp = app.oneshot(get("/")).await.expect("oneshot");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let html = String::from_utf8(bytes.to_vec()).expect("utf8");
    assert!(html.contains("leaflet"));
    assert!(html.contains("/api/min-magnitude"));
}

#[tokio::test]
async fn initial_refresh_populates_state() {
    let dashboard = test_dashboard();
    dashboard.refresh().await.expect("join");

    let app = create_router(AppState::new(dashboard));
    let (status, view) = call(app, get("/api/state")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["filter"]["window"], "day");
    assert_eq!(view["loading"], false);
    assert_eq!(view["statistics"]["total"], 2);
    assert_eq!(view["statistics"]["significant"], 1);
    assert_eq!(view["markers"][0]["id"], "d1");
    assert_eq!(view["markers"][0]["color"], "#FF4500");
    assert_eq!(view["markers"][1]["place"], "Unknown location");
    assert_eq!(view["fit"]["max_zoom"], 8);
}

#[tokio::test]
async fn window_change_starts_cycle_and_commits() {
    let dashboard = test_dashboard();
    let mut updates = dashboard.subscribe();
    let app = create_router(AppState::new(Arc::clone(&dashboard)));

    let (status, body) = call(app.clone(), post("/api/window", &json!({ "window": "week" }))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["changed"], true);
    assert_eq!(body["generation"], 1);

    let committed = updates.recv().await.expect("update");
    assert_eq!(committed, Generation(1));

    let (_, body) = call(
        app.clone(),
        post("/api/min-magnitude", &json!({ "min_magnitude": 4.0 })),
    )
    .await;
    assert_eq!(body["generation"], 2);
    updates.recv().await.expect("update");

    let (_, view) = call(app, get("/api/state")).await;
    let mags: Vec<f64> = view["markers"]
        .as_array()
        .expect("markers")
        .iter()
        .map(|m| m["magnitude"].as_f64().expect("magnitude"))
        .collect();
    assert_eq!(mags, vec![4.0, 6.1]);
    assert_eq!(view["markers"][1]["tsunami"], 1);
}

#[tokio::test]
async fn unchanged_value_does_not_start_cycle() {
    let app = create_router(AppState::new(test_dashboard()));
    let (status, body) = call(app, post("/api/window", &json!({ "window": "day" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], false);
    assert_eq!(body["generation"], 0);
}

#[tokio::test]
async fn unknown_window_is_rejected() {
    let dashboard = test_dashboard();
    let app = create_router(AppState::new(Arc::clone(&dashboard)));
    let (status, body) = call(app, post("/api/window", &json!({ "window": "custom" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().expect("error").contains("custom"));
    assert_eq!(dashboard.generation(), Generation(0));
}

#[tokio::test]
async fn magnitude_is_clamped_to_slider_range() {
    let dashboard = test_dashboard();
    let mut updates = dashboard.subscribe();
    let app = create_router(AppState::new(Arc::clone(&dashboard)));

    let (status, _) = call(
        app,
        post("/api/min-magnitude", &json!({ "min_magnitude": 42.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    updates.recv().await.expect("update");

    assert!((dashboard.filter().min_magnitude - 10.0).abs() < f64::EPSILON);
    assert!(dashboard.events().is_empty());
}

#[tokio::test]
async fn feed_failure_is_surfaced_and_previous_markers_kept() {
    let dashboard = test_dashboard();
    dashboard.refresh().await.expect("join");
    let mut updates = dashboard.subscribe();
    let app = create_router(AppState::new(Arc::clone(&dashboard)));

    call(app.clone(), post("/api/window", &json!({ "window": "month" }))).await;
    updates.recv().await.expect("update");

    let (_, view) = call(app, get("/api/state")).await;
    assert_eq!(view["filter"]["window"], "month");
    assert_eq!(view["shown_filter"]["window"], "day");
    assert_eq!(view["statistics"]["total"], 2);
    assert!(view["error"].as_str().expect("error").contains("HTTP 500"));
}

#[tokio::test]
async fn legend_has_seven_bands() {
    let app = create_router(AppState::new(test_dashboard()));
    let (status, rows) = call(app, get("/api/legend")).await;
    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().expect("rows");
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[0]["range"], "7.0+");
    assert_eq!(rows[6]["color"], "#32CD32");
}
