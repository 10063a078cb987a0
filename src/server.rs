//! HTTP surface of the dashboard.
//!
//! Each selector change in the page maps to one request here, which runs one
//! read-only query against the shared table and returns a chart figure or a
//! map document.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::extract::{Path, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{Next, from_fn};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinError;
use tracing::{Instrument, error, info, warn};

use crate::analyzers::{
    CategoryDimension, TimeDimension, severity_by_dimension, severity_proportions,
};
use crate::charts::{bar_figure, pie_figure};
use crate::dashboard::render_page;
use crate::error::MapError;
use crate::features::AccidentTable;
use crate::maps::{MAP_DOCUMENTS, MapStore};

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<AccidentTable>,
    pub maps: Arc<dyn MapStore>,
}

impl AppState {
    pub fn new(table: AccidentTable, maps: impl MapStore + 'static) -> Self {
        Self {
            table: Arc::new(table),
            maps: Arc::new(maps),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BarParams {
    dimension: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PieParams {
    category: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/healthz", get(healthz_handler))
        .route("/api/figures/bar", get(bar_figure_handler))
        .route("/api/figures/pie", get(pie_figure_handler))
        .route("/api/maps", get(map_list_handler))
        .route("/api/maps/:name", get(map_document_handler))
        .layer(from_fn(request_tracing))
        .with_state(state)
}

/// Serves until Ctrl+C or SIGTERM, then drains in-flight requests.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, records = state.table.len(), "Dashboard listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await?;

    info!("Dashboard stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Shutdown signal received");
}

async fn request_tracing(request: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        "http.request",
        method = %request.method(),
        route = %request.uri().path(),
    );

    async move {
        let started = Instant::now();
        let response = next.run(request).await;
        info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request handled"
        );
        response
    }
    .instrument(span)
    .await
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Answers a query whose blocking task panicked or was cancelled.
fn query_task_failed(e: JoinError) -> Response {
    error!(error = %e, "Aggregation task failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "aggregation failed".to_string())
}

async fn index_handler() -> Html<String> {
    Html(render_page())
}

async fn healthz_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "records": state.table.len(),
    }))
}

async fn bar_figure_handler(
    State(state): State<AppState>,
    Query(params): Query<BarParams>,
) -> Response {
    let dimension = params
        .dimension
        .unwrap_or_else(|| TimeDimension::Year.name().to_string());

    // Full-table scan; keep it off the async workers.
    let table = Arc::clone(&state.table);
    let query = dimension.clone();
    let result = tokio::task::spawn_blocking(move || severity_by_dimension(&table, &query)).await;

    match result {
        Ok(Ok(table)) => Json(bar_figure(&table)).into_response(),
        Ok(Err(e)) => {
            warn!(dimension = %dimension, error = %e, "Bar figure refused");
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => query_task_failed(e),
    }
}

async fn pie_figure_handler(
    State(state): State<AppState>,
    Query(params): Query<PieParams>,
) -> Response {
    let category = params
        .category
        .unwrap_or_else(|| CategoryDimension::AreaType.name().to_string());

    let table = Arc::clone(&state.table);
    let query = category.clone();
    let result = tokio::task::spawn_blocking(move || severity_proportions(&table, &query)).await;

    match result {
        Ok(Ok(series)) => Json(pie_figure(&series)).into_response(),
        Ok(Err(e)) => {
            warn!(category = %category, error = %e, "Pie figure refused");
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => query_task_failed(e),
    }
}

async fn map_list_handler() -> Json<Value> {
    Json(json!({ "maps": MAP_DOCUMENTS }))
}

async fn map_document_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    match state.maps.read(&name).await {
        Ok(contents) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            contents,
        )
            .into_response(),
        Err(e) => {
            let status = match e {
                MapError::UnknownDocument(_) | MapError::FileNotFound(_) => StatusCode::NOT_FOUND,
                MapError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            };
            warn!(map = %name, error = %e, "Map document unavailable");
            error_response(status, e.to_string())
        }
    }
}
