//! Query server for geocode resolution.
//!
//! Provides an HTTP API over the multi-provider resolver: forward search
//! with distance ranking, reverse lookup, and the persisted search history.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use waypoint::history::{HistoryEntry, SearchHistory};
use waypoint::{Config, GeocodeResolver, ReverseLocation, SearchResult};

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Geocoding query server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// Path to a TOML config file; built-in defaults apply when omitted
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

/// Application state shared across handlers
struct AppState {
    resolver: GeocodeResolver,
    history: Mutex<SearchHistory>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    info!("Waypoint Query Server");
    info!(
        "Bias location: {}, {} ({})",
        config.home.lat, config.home.lng, config.home.name
    );
    info!(
        "{} forward providers, {} reverse providers",
        config.providers.len(),
        config.reverse_providers.len()
    );

    let resolver = GeocodeResolver::from_config(&config)?;
    let history = SearchHistory::load(
        &config.search.history_file,
        config.search.max_history_items,
    );
    info!("Loaded {} history entries", history.entries().len());

    let state = Arc::new(AppState {
        resolver,
        history: Mutex::new(history),
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/search", get(search_handler))
        .route("/v1/reverse", get(reverse_handler))
        .route(
            "/v1/history",
            get(history_handler)
                .post(record_history_handler)
                .delete(clear_history_handler),
        )
        .route("/v1/history/{id}", delete(remove_history_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Forward geocoding search
async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQueryParams>,
) -> Json<SearchResponse> {
    let started = Instant::now();
    let results = state.resolver.resolve(&params.text).await;
    let provider = results.first().map(|r| r.provider.clone());

    Json(SearchResponse {
        results,
        provider,
        took_ms: started.elapsed().as_millis(),
    })
}

/// Reverse geocoding
async fn reverse_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReverseQueryParams>,
) -> Json<ReverseLocation> {
    let location = state
        .resolver
        .reverse(params.point_lat, params.point_lon)
        .await;
    Json(location)
}

/// List history entries, newest first
async fn history_handler(State(state): State<Arc<AppState>>) -> Json<Vec<HistoryEntry>> {
    Json(state.history.lock().unwrap().entries().to_vec())
}

/// Record a selected search result into history
async fn record_history_handler(
    State(state): State<Arc<AppState>>,
    Json(result): Json<SearchResult>,
) -> StatusCode {
    state.history.lock().unwrap().record(&result);
    StatusCode::CREATED
}

/// Remove a single history entry
async fn remove_history_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if state.history.lock().unwrap().remove(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Clear the whole history
async fn clear_history_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    state.history.lock().unwrap().clear();
    StatusCode::NO_CONTENT
}

#[derive(Deserialize)]
struct SearchQueryParams {
    /// Search text
    text: String,
}

#[derive(Deserialize)]
struct ReverseQueryParams {
    /// Point latitude
    #[serde(rename = "point.lat")]
    point_lat: f64,
    /// Point longitude
    #[serde(rename = "point.lon")]
    point_lon: f64,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
    /// Provider that produced the results, absent when the list is empty
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    took_ms: u128,
}
