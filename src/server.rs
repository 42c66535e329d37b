//! Web server for the quakemap UI.
//!
//! Serves the map page and a small JSON API around a [`Dashboard`]:
//! - Axum for HTTP
//! - SSE (Server-Sent Events) to tell the page a new cycle was committed
//! - Leaflet in the browser as the map layer

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::dashboard::Dashboard;
use crate::feed::{FeedClient, FeedConfig, FeedWindow};
use crate::presentation::{DashboardView, LegendEntry, legend};
use crate::state::{FilterState, Generation, MIN_MAGNITUDE_CEIL, MIN_MAGNITUDE_FLOOR};

/// Extra time a cycle may take beyond the request timeout.
const CYCLE_GRACE_SECS: u64 = 5;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub feed: FeedConfig,
    pub filter: FilterState,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            feed: FeedConfig::default(),
            filter: FilterState::default(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    dashboard: Arc<Dashboard>,
}

impl AppState {
    #[must_use]
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        Self { dashboard }
    }
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/stream", get(sse_handler))
        .route("/api/state", get(state_handler))
        .route("/api/legend", get(legend_handler))
        .route("/api/window", post(window_handler))
        .route("/api/min-magnitude", post(magnitude_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Start the web server.
///
/// # Errors
///
/// Returns an error if the feed client cannot be built or the listener
/// cannot bind.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let client = FeedClient::new(&config.feed)?;
    let cycle_timeout = client.timeout() + Duration::from_secs(CYCLE_GRACE_SECS);
    let dashboard = Dashboard::new(Arc::new(client), config.filter, cycle_timeout);

    // Initial load; the page picks it up through /stream.
    drop(dashboard.refresh());

    let app = create_router(AppState::new(dashboard));

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("quakemap UI starting at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Body of `POST /api/window`.
#[derive(Debug, Deserialize)]
pub struct WindowRequest {
    pub window: String,
}

/// Body of `POST /api/min-magnitude`.
#[derive(Debug, Deserialize)]
pub struct MagnitudeRequest {
    pub min_magnitude: f64,
}

/// Response to either mutator.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    /// Whether a new ingestion cycle was started
    pub changed: bool,
    pub generation: Generation,
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn mutation_response(changed: bool, generation: Generation) -> Response {
    let status = if changed {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    (status, Json(MutationResponse { changed, generation })).into_response()
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Main page handler - serves the HTML UI.
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// SSE stream handler; emits the generation of each committed cycle.
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.dashboard.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(generation) => Some(Ok(Event::default()
            .event("state")
            .data(generation.0.to_string()))),
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Current view model.
async fn state_handler(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.dashboard.view())
}

/// Magnitude legend.
async fn legend_handler() -> Json<Vec<LegendEntry>> {
    Json(legend())
}

/// Time window mutator.
async fn window_handler(
    State(state): State<AppState>,
    Json(body): Json<WindowRequest>,
) -> Response {
    let window: FeedWindow = match body.window.parse() {
        Ok(w) => w,
        Err(e) => return bad_request(e.to_string()),
    };

    let changed = state.dashboard.set_time_window(window).is_some();
    if changed {
        tracing::info!("time window set to {} via UI", window);
    }
    mutation_response(changed, state.dashboard.generation())
}

/// Magnitude threshold mutator. Acts as the slider: clamps to [0, 10].
async fn magnitude_handler(
    State(state): State<AppState>,
    Json(body): Json<MagnitudeRequest>,
) -> Response {
    if !body.min_magnitude.is_finite() {
        return bad_request(format!(
            "min_magnitude must be a number, got {}",
            body.min_magnitude
        ));
    }
    let min_magnitude = body
        .min_magnitude
        .clamp(MIN_MAGNITUDE_FLOOR, MIN_MAGNITUDE_CEIL);

    let changed = state.dashboard.set_min_magnitude(min_magnitude).is_some();
    if changed {
        tracing::info!("minimum magnitude set to {:.1} via UI", min_magnitude);
    }
    mutation_response(changed, state.dashboard.generation())
}

/// Health check endpoint.
async fn health_handler() -> &'static str {
    "OK"
}

// ============================================================================
// HTML Template (embedded for single-binary deployment)
// ============================================================================

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>quakemap</title>
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        html, body { height: 100%; }
        body {
            font-family: 'Inter', -apple-system, BlinkMacSystemFont, sans-serif;
            display: flex;
            flex-direction: column;
        }
        .navbar {
            display: flex;
            align-items: center;
            gap: 1.5rem;
            padding: 0.75rem 1.5rem;
            background: linear-gradient(90deg, #4c1d95, #1e3a8a);
            color: #fff;
        }
        .navbar h1 { font-size: 1.125rem; font-weight: 600; margin-right: auto; }
        .control { display: flex; align-items: center; gap: 0.5rem; }
        .control select { padding: 0.25rem 0.5rem; border-radius: 6px; }
        .control .value {
            min-width: 2.5rem;
            text-align: center;
            font-weight: 700;
            background: #5b21b6;
            border-radius: 6px;
            padding: 0.125rem 0.375rem;
        }
        .banner { padding: 0.5rem; text-align: center; display: none; }
        .banner.error { background: #fecaca; color: #991b1b; }
        .banner.loading { background: #f3f4f6; }
        #map { flex: 1; }
        .panel {
            position: absolute;
            bottom: 1rem;
            z-index: 1000;
            background: #fff;
            padding: 1rem;
            border-radius: 10px;
            box-shadow: 0 10px 15px -3px rgba(0,0,0,0.1);
            font-size: 0.75rem;
        }
        .panel h3 { font-size: 0.875rem; margin-bottom: 0.5rem; }
        #stats { left: 1rem; width: 16rem; }
        #legend { right: 1rem; width: 13rem; }
        .swatch {
            display: inline-block;
            width: 1rem;
            height: 1rem;
            border-radius: 50%;
            border: 1px solid #9ca3af;
            margin-right: 0.5rem;
            vertical-align: middle;
        }
        .tsunami { color: #dc2626; font-weight: 700; }
    </style>
</head>
<body>
    <nav class="navbar">
        <h1>🌍 quakemap</h1>
        <label class="control">Time:
            <select id="window">
                <option value="day">Past Day</option>
                <option value="week">Past Week</option>
                <option value="month">Past Month</option>
            </select>
        </label>
        <label class="control">Min Mag:
            <input id="magnitude" type="range" min="0" max="10" step="0.1" value="0" />
            <span id="magnitude-value" class="value">0</span>
        </label>
    </nav>
    <div id="error" class="banner error"></div>
    <div id="loading" class="banner loading">Loading earthquake data...</div>
    <div id="map"></div>
    <div id="stats" class="panel">
        <h3>Statistics</h3>
        <div>Total Earthquakes: <strong id="stat-total">0</strong></div>
        <div>Significant (4.0+): <strong id="stat-significant">0</strong></div>
        <div>Largest Magnitude: <strong id="stat-max">M0.0</strong></div>
        <div style="color:#4b5563;margin-top:0.5rem">Data from USGS - Updates every few minutes</div>
    </div>
    <div id="legend" class="panel"><h3>Magnitude Scale</h3></div>
<script>
(function() {
  var map = L.map('map', { worldCopyJump: true, maxBounds: [[-90, -180], [90, 180]], maxBoundsViscosity: 1.0 })
    .setView([20, 0], 2);
  L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
    attribution: '&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors'
  }).addTo(map);
  var layer = L.layerGroup().addTo(map);

  function esc(s) {
    return String(s).replace(/[&<>"']/g, function(c) {
      return { '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' }[c];
    });
  }

  function popup(m) {
    var rows = [
      '<h3>M' + m.magnitude.toFixed(1) + ' Earthquake</h3>',
      '<div><strong>Location:</strong> ' + esc(m.place) + '</div>',
      '<div><strong>Time:</strong> ' + (m.time ? new Date(m.time).toLocaleString() : 'Unknown time') + '</div>',
      '<div><strong>Depth:</strong> ' + (m.depth !== null ? m.depth.toFixed(1) + ' km' : 'N/A') + '</div>',
      '<div><strong>Coordinates:</strong> ' + m.lat.toFixed(3) + ', ' + m.lng.toFixed(3) + '</div>'
    ];
    if (m.felt) rows.push('<div><strong>Felt Reports:</strong> ' + m.felt.toLocaleString() + '</div>');
    if (m.significance > 0) rows.push('<div><strong>Significance:</strong> ' + m.significance + '</div>');
    if (m.tsunami === 1) rows.push('<div class="tsunami">🌊 Tsunami Warning</div>');
    if (m.url) rows.push('<div><a href="' + esc(m.url) + '" target="_blank" rel="noopener noreferrer">📄 View Details →</a></div>');
    return rows.join('');
  }

  function render(view) {
    document.getElementById('window').value = view.filter.window;
    document.getElementById('magnitude').value = view.filter.min_magnitude;
    document.getElementById('magnitude-value').textContent = view.filter.min_magnitude;

    var err = document.getElementById('error');
    err.textContent = view.error || '';
    err.style.display = view.error ? 'block' : 'none';
    document.getElementById('loading').style.display = view.loading ? 'block' : 'none';

    layer.clearLayers();
    view.markers.forEach(function(m) {
      L.circleMarker([m.lat, m.lng], {
        radius: m.radius, fillColor: m.color, color: '#333', weight: 1, opacity: 0.8, fillOpacity: 0.7
      }).bindPopup(popup(m)).addTo(layer);
    });
    if (view.fit) {
      var b = view.fit.bounds;
      map.fitBounds([[b.south, b.west], [b.north, b.east]], {
        padding: [view.fit.padding, view.fit.padding], maxZoom: view.fit.max_zoom
      });
    }

    document.getElementById('stat-total').textContent = view.statistics.total;
    document.getElementById('stat-significant').textContent = view.statistics.significant;
    document.getElementById('stat-max').textContent = 'M' + view.statistics.max_magnitude.toFixed(1);
  }

  function load() {
    fetch('/api/state').then(function(r) { return r.json(); }).then(render);
  }

  function post(url, body) {
    fetch(url, { method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify(body) })
      .then(load);
  }

  fetch('/api/legend').then(function(r) { return r.json(); }).then(function(rows) {
    var el = document.getElementById('legend');
    rows.forEach(function(row) {
      var div = document.createElement('div');
      div.innerHTML = '<span class="swatch" style="background:' + row.color + '"></span>' + row.range + ' - ' + row.label;
      el.appendChild(div);
    });
  });

  document.getElementById('window').addEventListener('change', function(e) {
    post('/api/window', { window: e.target.value });
  });
  var slider = document.getElementById('magnitude');
  slider.addEventListener('input', function(e) {
    document.getElementById('magnitude-value').textContent = e.target.value;
  });
  slider.addEventListener('change', function(e) {
    post('/api/min-magnitude', { min_magnitude: Number(e.target.value) });
  });

  new EventSource('/stream').addEventListener('state', load);
  load();
})();
</script>
</body>
</html>
"##;
