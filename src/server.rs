//! Web server for the quakemap UI.
//!
//! Serves an interactive earthquake map using:
//! - Axum for HTTP server
//! - JSON command endpoints that mutate the shared [`Dashboard`]
//! - Leaflet + Leaflet.heat for markers and the heat layer
//!
//! The page keeps no state of its own: every control change is posted to
//! the server, which answers with the full view to draw.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{Html, IntoResponse},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::client::{FeedSource, TimeWindow};
use crate::dashboard::{Command, Dashboard, View};
use crate::errors::QuakemapError;
use crate::filters::{DepthBucket, FilterState};
use crate::stats::{Focus, LocateTarget};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub window: TimeWindow,
    pub filter: FilterState,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            window: TimeWindow::Day,
            filter: FilterState::default(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The single owning controller for events and filters
    dashboard: Arc<Mutex<Dashboard>>,
    /// Where event collections come from
    source: Arc<dyn FeedSource>,
}

impl AppState {
    pub fn new(config: &ServerConfig, source: Arc<dyn FeedSource>) -> Self {
        Self {
            dashboard: Arc::new(Mutex::new(Dashboard::new(config.window, config.filter))),
            source,
        }
    }

    /// Fetch `window` and install it unless a newer request overtook it.
    ///
    /// The dashboard lock is released while the request is in flight.
    pub async fn load_window(&self, window: TimeWindow) -> View {
        let ticket = self.dashboard.lock().await.begin_fetch(window);

        let events = self.source.fetch(ticket.window()).await;

        let mut dashboard = self.dashboard.lock().await;
        if !dashboard.finish_fetch(ticket, events) {
            tracing::debug!("{} response superseded by a newer request", window);
        }
        dashboard.view(Utc::now())
    }

    async fn apply(&self, commands: &[Command]) -> Result<View, QuakemapError> {
        let mut dashboard = self.dashboard.lock().await;
        for command in commands {
            dashboard.apply(*command)?;
        }
        Ok(dashboard.view(Utc::now()))
    }
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/view", get(view_handler))
        .route("/api/magnitude", post(magnitude_handler))
        .route("/api/depth", post(depth_handler))
        .route("/api/window", post(window_handler))
        .route("/api/locate/{target}", get(locate_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Start the web server.
pub async fn run_server(config: ServerConfig, source: Arc<dyn FeedSource>) -> anyhow::Result<()> {
    let state = AppState::new(&config, source);

    // Initial load for the configured window
    let view = state.load_window(config.window).await;
    if view.total_events == 0 {
        tracing::warn!("no earthquake data received for {} window", config.window);
    }

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("🌍 quakemap UI starting at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Request bodies
// ============================================================================

/// Slider movement; either or both bounds may be sent.
#[derive(Debug, Deserialize)]
struct MagnitudeRequest {
    min: Option<f64>,
    max: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DepthRequest {
    bucket: DepthBucket,
}

#[derive(Debug, Deserialize)]
struct WindowRequest {
    window: TimeWindow,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Main page handler - serves the HTML UI.
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Current view without changing anything.
async fn view_handler(State(state): State<AppState>) -> Json<View> {
    Json(state.dashboard.lock().await.view(Utc::now()))
}

/// Magnitude slider handler.
async fn magnitude_handler(
    State(state): State<AppState>,
    Json(req): Json<MagnitudeRequest>,
) -> Result<Json<View>, QuakemapError> {
    let mut commands = Vec::with_capacity(2);
    if let Some(min) = req.min {
        commands.push(Command::SetMinMagnitude(min));
    }
    if let Some(max) = req.max {
        commands.push(Command::SetMaxMagnitude(max));
    }
    Ok(Json(state.apply(&commands).await?))
}

/// Depth selector handler.
async fn depth_handler(
    State(state): State<AppState>,
    Json(req): Json<DepthRequest>,
) -> Result<Json<View>, QuakemapError> {
    Ok(Json(state.apply(&[Command::SetDepth(req.bucket)]).await?))
}

/// Time window selector handler - triggers a fresh fetch.
async fn window_handler(
    State(state): State<AppState>,
    Json(req): Json<WindowRequest>,
) -> Json<View> {
    tracing::info!("time window changed to {} via UI", req.window);
    Json(state.load_window(req.window).await)
}

/// Click-to-locate handler.
async fn locate_handler(
    State(state): State<AppState>,
    Path(target): Path<String>,
) -> Result<Json<Focus>, QuakemapError> {
    let target: LocateTarget = target.parse().map_err(QuakemapError::InvalidFilter)?;
    let focus = state.dashboard.lock().await.locate(target, Utc::now())?;
    Ok(Json(focus))
}

/// Health check endpoint.
async fn health_handler() -> impl IntoResponse {
    "OK"
}

// ============================================================================
// HTML Template (embedded for single-binary deployment)
// ============================================================================

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>quakemap — Earthquake Map</title>

    <!-- Leaflet + heat layer -->
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
    <script src="https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js"></script>

    <style>
        :root {
            --font: 'Inter', -apple-system, BlinkMacSystemFont, sans-serif;
            --bg-primary: #09090b;
            --bg-elevated: #1c1c1f;
            --text-primary: #fafafa;
            --text-secondary: #a1a1aa;
            --border: #27272a;
            --accent: #818cf8;
            --radius-md: 10px;
        }

        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: var(--font);
            background: var(--bg-primary);
            color: var(--text-primary);
            display: flex;
            height: 100vh;
        }

        #map { flex: 1; }

        .sidebar {
            width: 300px;
            padding: 20px;
            background: var(--bg-elevated);
            border-left: 1px solid var(--border);
            overflow-y: auto;
        }

        .sidebar h1 { font-size: 18px; margin-bottom: 16px; }
        .sidebar h2 { font-size: 13px; color: var(--text-secondary); margin: 18px 0 8px; text-transform: uppercase; }

        .control { margin-bottom: 12px; font-size: 14px; }
        .control input[type=range], .control select { width: 100%; margin-top: 4px; }
        .control select {
            background: var(--bg-primary);
            color: var(--text-primary);
            border: 1px solid var(--border);
            border-radius: 6px;
            padding: 6px;
        }

        .stat { display: flex; justify-content: space-between; padding: 6px 0; border-bottom: 1px solid var(--border); font-size: 14px; }
        .stat .value { font-weight: 600; }
        .clickable { cursor: pointer; color: var(--accent); }

        #loading {
            position: fixed; inset: 0;
            display: flex; align-items: center; justify-content: center;
            background: rgba(0,0,0,0.5);
            font-size: 18px;
            z-index: 2000;
        }
        .hidden { display: none !important; }
    </style>
</head>
<body>
    <div id="map"></div>

    <aside class="sidebar">
        <h1>🌍 quakemap</h1>

        <h2>Filters</h2>
        <div class="control">
            Min magnitude: <span id="min-mag-value">-2</span>
            <input type="range" id="min-mag" min="-2" max="10" step="0.1" value="-2">
        </div>
        <div class="control">
            Max magnitude: <span id="max-mag-value">10</span>
            <input type="range" id="max-mag" min="-2" max="10" step="0.1" value="10">
        </div>
        <div class="control">
            Time window
            <select id="time-select">
                <option value="hour">Past hour</option>
                <option value="day" selected>Past day</option>
                <option value="week">Past week</option>
                <option value="month">Past month</option>
            </select>
        </div>
        <div class="control">
            Depth
            <select id="depth-select">
                <option value="any">All depths</option>
                <option value="shallow">Shallow (0–70 km)</option>
                <option value="intermediate">Intermediate (70–300 km)</option>
                <option value="deep">Deep (&gt;300 km)</option>
            </select>
        </div>

        <h2>Statistics</h2>
        <div class="stat"><span>Total earthquakes</span><span class="value" id="total-quakes">0</span></div>
        <div class="stat"><span>Average magnitude</span><span class="value" id="avg-magnitude">—</span></div>
        <div class="stat"><span>Max magnitude</span><span class="value clickable" id="max-magnitude" data-target="strongest">—</span></div>
        <div class="stat"><span>Min magnitude</span><span class="value clickable" id="min-magnitude" data-target="weakest">—</span></div>
        <div class="stat"><span>Most recent</span><span class="value clickable" id="most-recent" data-target="most-recent">—</span></div>
    </aside>

    <div id="loading" class="hidden">Loading seismic data…</div>

    <script>
        const map = L.map('map').setView([0, 0], 2);
        L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
            maxZoom: 19,
            attribution: '© OpenStreetMap contributors'
        }).addTo(map);

        const markerLayer = L.layerGroup().addTo(map);
        let heatLayer = null;

        function draw(view) {
            markerLayer.clearLayers();
            if (heatLayer) { map.removeLayer(heatLayer); }

            const style = view.frame.marker_style;
            view.frame.markers.forEach(m => {
                L.circleMarker([m.lat, m.lon], {
                    radius: m.radius,
                    fillColor: m.fill_color,
                    color: style.color,
                    weight: style.weight,
                    opacity: style.opacity,
                    fillOpacity: style.fill_opacity
                }).addTo(markerLayer).bindPopup(m.popup);
            });

            const points = view.frame.heat.map(p => [p.lat, p.lon, p.weight]);
            heatLayer = L.heatLayer(points, {radius: view.frame.heat_radius}).addTo(map);

            // Sliders reflect the server's clamped values
            const mag = view.filter.magnitude;
            document.getElementById('min-mag').value = mag.min;
            document.getElementById('max-mag').value = mag.max;
            document.getElementById('min-mag-value').textContent = mag.min;
            document.getElementById('max-mag-value').textContent = mag.max;
            document.getElementById('time-select').value = view.window;
            document.getElementById('depth-select').value = view.filter.depth;

            const panel = view.panel;
            document.getElementById('total-quakes').textContent = panel.total;
            document.getElementById('avg-magnitude').textContent = panel.average;
            document.getElementById('max-magnitude').textContent = panel.max;
            document.getElementById('min-magnitude').textContent = panel.min;
            document.getElementById('most-recent').textContent = panel.most_recent;

            document.getElementById('loading').classList.toggle('hidden', !view.loading);
        }

        async function send(method, path, body) {
            const opts = { method, headers: { 'Content-Type': 'application/json' } };
            if (body !== undefined) { opts.body = JSON.stringify(body); }
            const response = await fetch(path, opts);
            if (!response.ok) {
                console.error('request failed', path, await response.text());
                return null;
            }
            return response.json();
        }

        // Responses may arrive out of order while a slider is dragged;
        // only draw a view newer than the last one drawn.
        let requestSeq = 0;
        let drawnSeq = 0;

        async function command(path, body) {
            const seq = ++requestSeq;
            const view = await send('POST', path, body);
            if (view && seq > drawnSeq) {
                drawnSeq = seq;
                draw(view);
            }
        }

        document.getElementById('min-mag').addEventListener('input', e => {
            command('/api/magnitude', { min: parseFloat(e.target.value) });
        });
        document.getElementById('max-mag').addEventListener('input', e => {
            command('/api/magnitude', { max: parseFloat(e.target.value) });
        });
        document.getElementById('depth-select').addEventListener('change', e => {
            command('/api/depth', { bucket: e.target.value });
        });
        document.getElementById('time-select').addEventListener('change', e => {
            document.getElementById('loading').classList.remove('hidden');
            command('/api/window', { window: e.target.value });
        });

        document.querySelectorAll('.clickable').forEach(el => {
            el.addEventListener('click', async () => {
                const focus = await send('GET', '/api/locate/' + el.dataset.target);
                if (!focus) { return; }
                map.setView([focus.lat, focus.lon], focus.zoom);
                L.popup().setLatLng([focus.lat, focus.lon]).setContent(focus.popup).openOn(map);
            });
        });

        const initialSeq = ++requestSeq;
        send('GET', '/api/view').then(view => {
            if (view && initialSeq > drawnSeq) {
                drawnSeq = initialSeq;
                draw(view);
            }
        });
    </script>
</body>
</html>
"##;
