use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

use crate::db::models::{
    HistoryEntry, MarketAnalyticsResult, MarketLine, ScheduleGame, SimulationConfig,
    SimulationResult, Team,
};
use crate::db::Database;
use crate::engine::{analyze_market, simulate_with_cancel, MAX_ITERATIONS};
use crate::error::SimError;
use crate::schedule::{fetch_with_fallback, MockSchedule, ScheduleProvider};
use crate::teams::TeamDirectory;

const DEFAULT_HISTORY_LIMIT: i64 = 20;
const MAX_HISTORY_LIMIT: i64 = 500;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub directory: TeamDirectory,
    pub schedule: Arc<dyn ScheduleProvider>,
    /// Used when a simulate request carries no config of its own.
    pub defaults: SimulationConfig,
}

type ApiError = (StatusCode, String);

/// Build the Axum router for the JSON API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/schedule", get(schedule_handler))
        .route("/api/simulate", post(simulate_handler))
        .route(
            "/api/history",
            get(history_handler).delete(clear_history_handler),
        )
        .route(
            "/api/history/:id",
            get(history_detail_handler).delete(delete_history_handler),
        )
        .route("/api/teams", get(teams_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    /// YYYY-MM-DD; today (UTC) when absent
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub team_a: String,
    pub team_b: String,
    pub config: Option<SimulationConfig>,
    pub odds: Option<MarketLine>,
}

#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    pub result: SimulationResult,
    pub market: Option<MarketAnalyticsResult>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub removed: usize,
}

/// GET /api/schedule?date=2025-02-08
async fn schedule_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ScheduleQuery>,
) -> Result<Json<Vec<ScheduleGame>>, ApiError> {
    let date = q.date.unwrap_or_else(|| Utc::now().date_naive());
    fetch_with_fallback(state.schedule.as_ref(), &MockSchedule, date)
        .await
        .map(Json)
        .map_err(internal)
}

/// POST /api/simulate
async fn simulate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SimulateRequest>,
) -> Result<Json<SimulateResponse>, ApiError> {
    if req.team_a.trim().is_empty() || req.team_b.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "team_a and team_b are required".to_string(),
        ));
    }

    let (team_a, team_b) = {
        let mut rng = rand::thread_rng();
        (
            state.directory.resolve_by_name(&req.team_a, &mut rng),
            state.directory.resolve_by_name(&req.team_b, &mut rng),
        )
    };
    let config = req.config.unwrap_or_else(|| state.defaults.clone());
    if config.iterations > MAX_ITERATIONS {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("iterations must be at most {}", MAX_ITERATIONS),
        ));
    }

    // Dropping this future (client gone) stops the blocking run between trials.
    let cancel = CancelOnDrop::new();
    let flag = cancel.flag();
    let result = tokio::task::spawn_blocking(move || {
        simulate_with_cancel(&team_a, &team_b, &config, &flag)
    })
    .await
    .map_err(|e| internal(anyhow::anyhow!("simulation task failed: {}", e)))?
    .map_err(sim_error)?;

    let market = req.odds.as_ref().map(|line| analyze_market(&result, line));

    state.db.insert_simulation(&result).map_err(|e| {
        error!("Failed to store simulation {}: {:#}", result.id, e);
        internal(e)
    })?;
    info!(
        "Simulated {} vs {}: {} wins {:.1}% of {} trials",
        result.team_a.abbrev,
        result.team_b.abbrev,
        result.winner_id,
        100.0 * result.win_prob_a.max(result.win_prob_b),
        result.simulations_run
    );

    Ok(Json(SimulateResponse { result, market }))
}

/// GET /api/history?limit=20
async fn history_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    let limit = q
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    state.db.list_history(limit).map(Json).map_err(internal)
}

/// GET /api/history/:id
async fn history_detail_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SimulationResult>, ApiError> {
    match state.db.get_simulation(&id).map_err(internal)? {
        Some(result) => Ok(Json(result)),
        None => Err((StatusCode::NOT_FOUND, format!("No simulation with id {}", id))),
    }
}

/// DELETE /api/history/:id
async fn delete_history_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_simulation(&id).map_err(internal)? {
        info!("Deleted simulation {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("No simulation with id {}", id)))
    }
}

/// GET /api/teams
async fn teams_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Team>> {
    Json(state.directory.reference_teams())
}

/// DELETE /api/history
async fn clear_history_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClearedResponse>, ApiError> {
    let removed = state.db.clear_history().map_err(internal)?;
    info!("Cleared {} stored simulation(s)", removed);
    Ok(Json(ClearedResponse { removed }))
}

/// Raises its flag when dropped.
struct CancelOnDrop(Arc<AtomicBool>);

impl CancelOnDrop {
    fn new() -> Self {
        CancelOnDrop(Arc::new(AtomicBool::new(false)))
    }

    fn flag(&self) -> Arc<AtomicBool> {
        self.0.clone()
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if !self.0.swap(true, Ordering::Relaxed) {
            debug!("Simulation request dropped, cancel flag raised");
        }
    }
}

fn sim_error(e: SimError) -> ApiError {
    let status = match e {
        SimError::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
        SimError::Cancelled { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

fn internal(e: anyhow::Error) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
