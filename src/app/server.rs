//! Administrative HTTP surface.
//!
//! Provides:
//!   GET  /health                       → liveness probe
//!   GET  /api/monitor/event-status     → event monitor status
//!   GET  /api/monitor/event-stats      → event monitor counters
//!   GET  /api/monitor/maturity-status  → maturity monitor status
//!   POST /api/strategies/:id/close     → force-close a strategy
//!
//! Money amounts are serialized as decimal strings; JSON numbers lose
//! precision past 2^53 and these values are consumed by settlement
//! tooling.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::AppState;
use crate::domain::{BeginSettlement, SettlementRecord, StrategyId};
use crate::error::{CatalogError, Error, Result};
use crate::service::{CloseOutcome, ClosedLeg, EventMonitor, MaturityMonitor, PositionCloser};

/// Shared state for the admin routes.
#[derive(Clone)]
pub struct ServerState {
    pub event_monitor: Arc<EventMonitor>,
    pub maturity_monitor: Arc<MaturityMonitor>,
    pub closer: Arc<PositionCloser>,
    pub state: Arc<AppState>,
}

/// Build the Axum router.
pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/monitor/event-status", get(event_status))
        .route("/api/monitor/event-stats", get(event_stats))
        .route("/api/monitor/maturity-status", get(maturity_status))
        .route("/api/strategies/:id/close", post(close_strategy))
        .with_state(state)
}

/// Start the admin server.
pub async fn serve(state: ServerState, bind_addr: &str) -> Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = bind_addr, "Admin server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
pub struct CloseRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseResponse {
    pub success: bool,
    pub strategy_id: String,
    pub total_payout: String,
    #[serde(rename = "payoutPerUSDC")]
    pub payout_per_usdc: String,
    pub transaction_hash: Option<String>,
    pub positions: Vec<ClosedLegDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedLegDto {
    pub market_id: String,
    pub size: String,
    pub side: String,
}

impl ClosedLegDto {
    fn from_leg(leg: &ClosedLeg) -> Self {
        Self {
            market_id: leg.market_id.to_string(),
            size: leg.size.to_string(),
            side: leg.side.to_string(),
        }
    }
}

impl CloseResponse {
    fn from_outcome(outcome: &CloseOutcome) -> Self {
        Self {
            success: true,
            strategy_id: outcome.strategy_id.to_string(),
            total_payout: outcome.total_payout.to_string(),
            payout_per_usdc: outcome.payout_per_unit_invested.to_string(),
            // Settlement submission to the contract happens outside
            // this process, so no hash is available here.
            transaction_hash: None,
            positions: outcome.positions.iter().map(ClosedLegDto::from_leg).collect(),
        }
    }

    fn from_record(record: &SettlementRecord) -> Self {
        Self {
            success: true,
            strategy_id: record.strategy_id().to_string(),
            total_payout: record.total_payout().to_string(),
            payout_per_usdc: record.payout_per_unit_invested().to_string(),
            transaction_hash: None,
            positions: Vec::new(),
        }
    }
}

// --- Handlers ---

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn event_status(State(state): State<ServerState>) -> impl IntoResponse {
    Json(state.event_monitor.status())
}

async fn event_stats(State(state): State<ServerState>) -> impl IntoResponse {
    Json(state.event_monitor.stats_snapshot())
}

async fn maturity_status(State(state): State<ServerState>) -> impl IntoResponse {
    Json(state.maturity_monitor.status())
}

/// Force-close a strategy ahead of (or instead of) maturity detection.
///
/// Uses the same settlement claim as the maturity monitor, so a manual
/// close can never race a poll-triggered one into a double settlement.
/// Closing an already settled strategy returns the stored record.
async fn close_strategy(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
    body: Option<Json<CloseRequest>>,
) -> impl IntoResponse {
    let strategy_id = StrategyId::new(id);
    let reason = body.and_then(|Json(request)| request.reason);

    match state.state.settlements_mut().begin(strategy_id) {
        BeginSettlement::AlreadySettled(record) => {
            return (StatusCode::OK, Json(CloseResponse::from_record(&record))).into_response();
        }
        BeginSettlement::InProgress => {
            return (
                StatusCode::CONFLICT,
                Json(error_body("settlement already in progress")),
            )
                .into_response();
        }
        BeginSettlement::Begun => {}
    }

    info!(
        strategy_id = %strategy_id,
        reason = reason.as_deref().unwrap_or("manual"),
        "Force-close requested"
    );

    let result = state
        .closer
        .close_position(strategy_id, reason.as_deref().or(Some("manual")))
        .await;

    match result {
        Ok(outcome) => {
            state.state.settlements_mut().finish(
                strategy_id,
                outcome.total_payout,
                outcome.payout_per_unit_invested,
            );
            (StatusCode::OK, Json(CloseResponse::from_outcome(&outcome))).into_response()
        }
        Err(e) => {
            state.state.settlements_mut().abort(strategy_id);
            let status = match &e {
                Error::Catalog(CatalogError::UnknownStrategy { .. }) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(error_body(&e.to_string()))).into_response()
        }
    }
}

fn error_body(message: &str) -> serde_json::Value {
    serde_json::json!({"success": false, "error": message})
}
