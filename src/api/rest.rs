// =============================================================================
// REST API Endpoints -- Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`:
//
//   POST /api/v1/ingest   ingest a JSON array of trades
//   GET  /api/v1/trades   recent trades for a symbol (oldest to newest)
//   GET  /api/v1/candles  OHLC candles for a symbol and interval
//   GET  /api/v1/health   liveness probe
//
// The ingest handler is the gateway described in the design: it dedups the
// batch by trade ID, pushes the survivors into the trade cache, then feeds
// each symbol's slice of the batch to every configured interval's builder.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::types::{Interval, Trade};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS and request logging middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/ingest", post(ingest))
        .route("/api/v1/trades", get(trades))
        .route("/api/v1/candles", get(candles))
        .layer(middleware::from_fn(log_request))
        .layer(cors)
        .with_state(state)
}

/// Log one line per request: method, path, status, elapsed time.
async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = std::time::Instant::now();

    let response = next.run(req).await;

    info!(
        method = %method,
        path = %path,
        status = %response.status(),
        elapsed = ?start.elapsed(),
        "request"
    );
    response
}

fn bad_request(message: String) -> Response {
    let body = serde_json::json!({ "error": message });
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    uptime_secs: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        uptime_secs: state.uptime_secs(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Ingest
// =============================================================================

#[derive(Serialize, Deserialize)]
pub struct IngestResponse {
    /// Trades in the delivered batch.
    pub received: usize,
    /// Trades that survived deduplication and were processed.
    pub accepted: usize,
}

async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<Vec<Trade>>,
) -> Json<IngestResponse> {
    let received = batch.len();

    let accepted_trades = state.dedup_trades(batch);
    let accepted = accepted_trades.len();
    if accepted == 0 {
        return Json(IngestResponse { received, accepted });
    }

    state.trade_cache.push_trades(&accepted_trades);

    // Group by symbol so each builder only ever sees its own instrument.
    let mut by_symbol: HashMap<String, Vec<Trade>> = HashMap::new();
    for trade in accepted_trades {
        by_symbol.entry(trade.symbol.clone()).or_default().push(trade);
    }

    for (symbol, symbol_trades) in &by_symbol {
        for interval in &state.config.intervals {
            let builder = state.builders.get_or_create(symbol, *interval);
            builder.process_trades(symbol_trades);
        }
    }

    state.increment_version();
    info!(received, accepted, symbols = by_symbol.len(), "trade batch ingested");

    Json(IngestResponse { received, accepted })
}

// =============================================================================
// Trades
// =============================================================================

#[derive(Deserialize)]
struct TradesQuery {
    symbol: Option<String>,
}

async fn trades(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TradesQuery>,
) -> Response {
    let Some(symbol) = query.symbol.filter(|s| !s.is_empty()) else {
        return bad_request("symbol is required".to_string());
    };

    Json(state.trade_cache.get_trades(&symbol)).into_response()
}

// =============================================================================
// Candles
// =============================================================================

#[derive(Deserialize)]
struct CandlesQuery {
    symbol: Option<String>,
    interval: Option<String>,
}

async fn candles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CandlesQuery>,
) -> Response {
    let Some(symbol) = query.symbol.filter(|s| !s.is_empty()) else {
        return bad_request("symbol is required".to_string());
    };

    let interval_arg = query.interval.unwrap_or_else(|| "1m".to_string());
    let Some(interval) = Interval::parse(&interval_arg) else {
        warn!(interval = %interval_arg, "rejected candles query with unknown interval");
        return bad_request(format!("invalid interval value {interval_arg:?}"));
    };

    // A missing builder just means this (symbol, interval) never traded.
    let candles = match state.builders.get(&symbol, interval) {
        Some(builder) => builder.get_candles(),
        None => Vec::new(),
    };

    Json(candles).into_response()
}

// =============================================================================
// Tests
// =============================================================================
