//! Liveness endpoint with worker pool occupancy.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Pool occupancy as seen by `/health`.
#[derive(Debug, Serialize)]
pub struct PoolStatus {
    /// Jobs holding an encode slot
    pub running: usize,
    /// Jobs accepted and waiting for a slot
    pub queued: usize,
    /// Pending jobs allowed before `create-video` answers 503
    pub capacity: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, `saturated` (new renders get 503) or `draining` (shutting down)
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub pool: PoolStatus,
}

fn pool_state(accepting: bool, pending: usize, capacity: usize) -> &'static str {
    if !accepting {
        "draining"
    } else if pending >= capacity {
        "saturated"
    } else {
        "ok"
    }
}

/// Always 200 while the process serves requests; `status` tells whether a
/// render submitted now would be accepted.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let executor = &state.executor;
    let pending = executor.pending_jobs();
    let running = executor.running_jobs();

    Json(HealthResponse {
        status: pool_state(executor.is_accepting(), pending, executor.capacity()),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
        pool: PoolStatus {
            running,
            queued: pending.saturating_sub(running),
            capacity: executor.capacity(),
        },
    })
}
