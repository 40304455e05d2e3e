//! REST API handlers.
//!
//! Handlers read from the shared `CapacityController` and return JSON in the
//! `{ success, data, error }` envelope. Nothing here mutates admission state.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use surge_admission::{CapacityReport, ClientContext, QueueEntry};

use crate::ApiState;

const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Response wrapper for consistent API format.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn latest_report(state: &ApiState) -> Option<CapacityReport> {
    state.controller.subscribe().borrow().clone()
}

// ── Capacity ───────────────────────────────────────────────────

/// GET /api/v1/capacity
pub async fn latest_capacity(State(state): State<ApiState>) -> impl IntoResponse {
    match latest_report(&state) {
        Some(report) => ApiResponse::ok(report).into_response(),
        None => {
            error_response("no capacity tick yet", StatusCode::SERVICE_UNAVAILABLE).into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct EvaluateQuery {
    pub connections: u32,
}

/// GET /api/v1/capacity/evaluate?connections=N
pub async fn evaluate_capacity(
    State(state): State<ApiState>,
    Query(q): Query<EvaluateQuery>,
) -> impl IntoResponse {
    ApiResponse::ok(state.controller.evaluate(q.connections))
}

// ── Admission ──────────────────────────────────────────────────

/// Admission request body. Without `connections` the latest tick is used.
#[derive(Deserialize)]
pub struct AdmissionRequest {
    pub client: ClientContext,
    #[serde(default)]
    pub queue: Vec<QueueEntry>,
    #[serde(default)]
    pub connections: Option<u32>,
}

/// POST /api/v1/admission
pub async fn admission(
    State(state): State<ApiState>,
    Json(req): Json<AdmissionRequest>,
) -> impl IntoResponse {
    let status = match req.connections {
        Some(n) => state.controller.evaluate(n).status,
        None => match latest_report(&state) {
            Some(report) => report.status,
            None => {
                return error_response(
                    "no capacity tick yet; pass `connections` explicitly",
                    StatusCode::SERVICE_UNAVAILABLE,
                )
                .into_response();
            }
        },
    };

    let decision = state.controller.admit(&status, &req.client, &req.queue);
    ApiResponse::ok(decision).into_response()
}

#[derive(Deserialize)]
pub struct QueuePositionRequest {
    pub client_id: String,
    #[serde(default)]
    pub queue: Vec<QueueEntry>,
}

/// POST /api/v1/queue/position
pub async fn queue_position(
    State(state): State<ApiState>,
    Json(req): Json<QueuePositionRequest>,
) -> impl IntoResponse {
    if req.client_id.is_empty() {
        return error_response("client_id must not be empty", StatusCode::BAD_REQUEST)
            .into_response();
    }
    ApiResponse::ok(state.controller.queue_position(&req.queue, &req.client_id)).into_response()
}

// ── History ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// GET /api/v1/history?limit=N
pub async fn history(
    State(state): State<ApiState>,
    Query(q): Query<HistoryQuery>,
) -> impl IntoResponse {
    let limit = q.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let samples = state
        .controller
        .recorder()
        .map(|r| r.recent(limit))
        .unwrap_or_default();
    ApiResponse::ok(samples)
}

// ── Tiers ──────────────────────────────────────────────────────

/// GET /api/v1/tiers
pub async fn list_tiers(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(serde_json::json!({
        "active": state.controller.tier().id,
        "tiers": state.controller.catalog().tiers(),
    }))
}

#[derive(Deserialize)]
pub struct SavingsQuery {
    pub days: u32,
}

/// GET /api/v1/savings?days=N
pub async fn savings(
    State(state): State<ApiState>,
    Query(q): Query<SavingsQuery>,
) -> impl IntoResponse {
    let tier = state.controller.tier();
    let next = state.controller.catalog().next_tier(tier);
    ApiResponse::ok(serde_json::json!({
        "tier": tier.id,
        "upgrades_to": next.id,
        "days_delayed": q.days,
        "saved_usd": state.controller.savings(q.days),
    }))
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let latest = latest_report(&state).map(|r| r.to_sample());
    let body = surge_metrics::render_prometheus(state.controller.tier(), latest.as_ref());
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use surge_admission::{CapacityController, PriorityAccess};
    use surge_core::{PolicyConstants, TierCatalog};
    use surge_metrics::MetricsRecorder;
    use surge_state::InMemoryHistory;

    fn test_state() -> ApiState {
        let catalog = TierCatalog::builtin();
        let tier = catalog.resolve("standard").clone();
        let controller = CapacityController::new(tier, catalog, PolicyConstants::default())
            .with_priority_access(PriorityAccess::new(["owner-1"]))
            .with_recorder(MetricsRecorder::new(Arc::new(InMemoryHistory::new(1000))));
        ApiState {
            controller: Arc::new(controller),
        }
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn capacity_before_first_tick() {
        let state = test_state();
        let resp = latest_capacity(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn capacity_after_tick() {
        let state = test_state();
        state.controller.tick(205);

        let resp = latest_capacity(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["status"]["queue_length"], 5);
        assert_eq!(json["data"]["band"], "overloaded");
    }

    #[tokio::test]
    async fn evaluate_does_not_record() {
        let state = test_state();
        let query = Query(EvaluateQuery { connections: 105 });
        let resp = evaluate_capacity(State(state.clone()), query)
            .await
            .into_response();
        let json = body_json(resp).await;
        assert_eq!(json["data"]["status"]["capacity_percent"], 70.0);

        let resp = history(State(state), Query(HistoryQuery { limit: None }))
            .await
            .into_response();
        let json = body_json(resp).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn history_respects_limit() {
        let state = test_state();
        for n in [10, 20, 30] {
            state.controller.tick(n);
        }

        let resp = history(State(state), Query(HistoryQuery { limit: Some(2) }))
            .await
            .into_response();
        let json = body_json(resp).await;
        let samples = json["data"].as_array().unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0]["connections"], 20);
        assert_eq!(samples[1]["connections"], 30);
    }

    #[tokio::test]
    async fn admission_needs_a_load_figure() {
        let state = test_state();
        let req = AdmissionRequest {
            client: ClientContext::default(),
            queue: Vec::new(),
            connections: None,
        };
        let resp = admission(State(state), Json(req)).await.into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn admission_at_ceiling_enqueues() {
        let state = test_state();
        state.controller.tick(200);

        let req = AdmissionRequest {
            client: ClientContext {
                client_id: "owner-1".to_string(),
                ..ClientContext::default()
            },
            queue: Vec::new(),
            connections: None,
        };
        let resp = admission(State(state), Json(req)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["data"]["decision"], "enqueue");
        assert_eq!(json["data"]["priority"], true);
    }

    #[tokio::test]
    async fn queue_position_rejects_empty_id() {
        let state = test_state();
        let req = QueuePositionRequest {
            client_id: String::new(),
            queue: Vec::new(),
        };
        let resp = queue_position(State(state), Json(req)).await.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn savings_for_standard() {
        let state = test_state();
        let resp = savings(State(state), Query(SavingsQuery { days: 15 }))
            .await
            .into_response();
        let json = body_json(resp).await;
        assert_eq!(json["data"]["upgrades_to"], "pro");
        assert_eq!(json["data"]["saved_usd"], 30.0);
    }

    #[tokio::test]
    async fn tiers_lists_catalog() {
        let state = test_state();
        let resp = list_tiers(State(state)).await.into_response();
        let json = body_json(resp).await;
        assert_eq!(json["data"]["active"], "standard");
        assert_eq!(json["data"]["tiers"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn prometheus_endpoint_returns_text() {
        let state = test_state();
        state.controller.tick(205);
        let resp = prometheus_metrics(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.contains("text/plain"));
    }
}
