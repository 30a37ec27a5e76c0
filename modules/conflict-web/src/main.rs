use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{RawQuery, State},
    http::{header, HeaderValue},
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use conflict_common::stats::{overview_kpis, severity_counts};
use conflict_common::{Config, Dataset, DatasetCache, FilterState};

mod charts;
mod pages;
mod query;
mod templates;

use query::DashboardQuery;

// --- App State ---

struct AppState {
    dataset: Arc<Dataset>,
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("conflict=info".parse()?))
        .init();

    let config = Config::from_env()?;

    let cache = DatasetCache::new(&config.data_path);
    let dataset = cache.get_or_load()?;
    info!(
        path = %cache.path().display(),
        events = dataset.len(),
        top_clusters = ?dataset.top_clusters(),
        "Dataset ready"
    );

    let app = router(Arc::new(AppState { dataset }), config.figures_dir);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Conflict dashboard starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>, figures_dir: PathBuf) -> Router {
    Router::new()
        .route("/", get(overview_page))
        .route("/clusters", get(clusters_page))
        .route("/pareto", get(pareto_page))
        .route("/conclusions", get(conclusions_page))
        .route("/api/summary", get(api_summary))
        .route("/health", get(health))
        .with_state(state)
        .nest_service("/figures", ServeDir::new(figures_dir))
        // Every response reflects the query it was rendered for
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

// --- Handlers ---

fn parse_query(raw: Option<String>) -> DashboardQuery {
    DashboardQuery::parse(raw.as_deref().unwrap_or_default())
}

async fn overview_page(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> impl IntoResponse {
    let dataset = &state.dataset;
    let filters = FilterState::build(dataset, parse_query(raw).selection(dataset));
    Html(pages::render_overview(dataset, &filters))
}

async fn clusters_page(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> impl IntoResponse {
    let dataset = &state.dataset;
    let query = parse_query(raw);
    let filters = FilterState::build(dataset, query.selection(dataset));
    Html(pages::render_clusters(dataset, &filters, query.profile))
}

async fn pareto_page(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> impl IntoResponse {
    let dataset = &state.dataset;
    let filters = FilterState::build(dataset, parse_query(raw).selection(dataset));
    Html(pages::render_pareto(dataset, &filters))
}

async fn conclusions_page(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> impl IntoResponse {
    let dataset = &state.dataset;
    let filters = FilterState::build(dataset, parse_query(raw).selection(dataset));
    Html(pages::render_conclusions(dataset, &filters))
}

async fn api_summary(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> impl IntoResponse {
    let dataset = &state.dataset;
    let filters = FilterState::build(dataset, parse_query(raw).selection(dataset));
    let rows = filters.filtered_view.rows();

    let severity: Vec<serde_json::Value> = severity_counts(rows, &filters.color_map)
        .into_iter()
        .map(|(category, events)| {
            serde_json::json!({
                "category": category,
                "color": filters.color_map.color(category),
                "events": events,
            })
        })
        .collect();

    Json(serde_json::json!({
        "selection": filters.selection,
        "kpis": overview_kpis(rows),
        "severity": severity,
        "top_clusters": filters.top_clusters,
        "available_clusters": filters.available_clusters(),
    }))
}

async fn health() -> &'static str {
    "ok"
}
