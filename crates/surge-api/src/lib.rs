//! surge-api — read-mostly ops API for Surge.
//!
//! Serves the controller's latest report, the capacity history, and
//! advisory estimates to the operations dashboard.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/capacity` | Latest tick report |
//! | GET | `/api/v1/capacity/evaluate?connections=N` | Report for a hypothetical load |
//! | POST | `/api/v1/admission` | Admission decision for a client |
//! | POST | `/api/v1/queue/position` | Position and wait estimate |
//! | GET | `/api/v1/history?limit=N` | Recent capacity samples |
//! | GET | `/api/v1/tiers` | Tier catalog and active tier |
//! | GET | `/api/v1/savings?days=N` | Savings from deferring the upgrade |
//! | GET | `/metrics` | Prometheus exposition |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use surge_admission::CapacityController;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub controller: Arc<CapacityController>,
}

/// Build the complete API router (REST + metrics).
pub fn build_router(controller: Arc<CapacityController>) -> Router {
    let api_state = ApiState { controller };

    let api_routes = Router::new()
        .route("/capacity", get(handlers::latest_capacity))
        .route("/capacity/evaluate", get(handlers::evaluate_capacity))
        .route("/admission", post(handlers::admission))
        .route("/queue/position", post(handlers::queue_position))
        .route("/history", get(handlers::history))
        .route("/tiers", get(handlers::list_tiers))
        .route("/savings", get(handlers::savings))
        .with_state(api_state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::prometheus_metrics).with_state(api_state))
}
