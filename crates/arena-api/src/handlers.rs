use std::sync::atomic::Ordering;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use arena_common::{JobMetrics, NetworkStats, NodeMetrics, NodeSpec, NodeStatus, WorkloadSpec};
use arena_dispatch::DispatchError;
use arena_registry::{NodeFilter, RegistryError};

use crate::state::AppState;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

fn error_response(status: StatusCode, kind: &str, message: String) -> Response {
    (
        status,
        Json(json!({
            "error": {
                "type": kind,
                "message": message,
            }
        })),
    )
        .into_response()
}

fn registry_error(err: RegistryError) -> Response {
    match &err {
        RegistryError::NotFound(_) => {
            error_response(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
    }
}

fn dispatch_error(err: DispatchError) -> Response {
    let (status, kind) = match &err {
        DispatchError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        DispatchError::NoEligibleNode(_) => (StatusCode::SERVICE_UNAVAILABLE, "no_eligible_node"),
        DispatchError::InvalidState { .. } => (StatusCode::CONFLICT, "invalid_state"),
        DispatchError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
    };
    error_response(status, kind, err.to_string())
}

// ── Nodes ───────────────────────────────────────────────────────────────

pub async fn list_nodes(
    State(st): State<AppState>,
    Query(filter): Query<NodeFilter>,
) -> impl IntoResponse {
    Json(st.registry.list(&filter))
}

pub async fn upsert_node(State(st): State<AppState>, Json(spec): Json<NodeSpec>) -> Response {
    let node_id = spec.node_id.clone();
    st.registry.upsert(spec);
    match st.registry.get(&node_id) {
        Ok(node) => (StatusCode::OK, Json(node)).into_response(),
        Err(e) => registry_error(e),
    }
}

pub async fn get_node(State(st): State<AppState>, Path(id): Path<String>) -> Response {
    match st.registry.get(&id) {
        Ok(node) => Json(node).into_response(),
        Err(e) => registry_error(e),
    }
}

pub async fn delete_node(State(st): State<AppState>, Path(id): Path<String>) -> Response {
    match st.registry.remove(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => registry_error(e),
    }
}

pub async fn node_metrics(State(st): State<AppState>, Path(id): Path<String>) -> Response {
    match st.registry.get(&id) {
        Ok(node) => match node.metrics {
            Some(metrics) => Json(metrics).into_response(),
            None => error_response(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("node '{id}' has not reported metrics yet"),
            ),
        },
        Err(e) => registry_error(e),
    }
}

pub async fn report_node_metrics(
    State(st): State<AppState>,
    Path(id): Path<String>,
    Json(metrics): Json<NodeMetrics>,
) -> Response {
    match st.registry.report_metrics(&id, metrics) {
        Ok(status) => Json(json!({ "node_id": id, "status": status })).into_response(),
        Err(e) => registry_error(e),
    }
}

// ── Jobs ────────────────────────────────────────────────────────────────

pub async fn submit_job(State(st): State<AppState>, Json(workload): Json<WorkloadSpec>) -> Response {
    match st.dispatcher.submit(workload) {
        Ok(job) => {
            st.metrics
                .jobs_submitted_total
                .fetch_add(1, Ordering::Relaxed);
            (
                StatusCode::ACCEPTED,
                Json(json!({ "job_id": job.job_id, "status": job.status })),
            )
                .into_response()
        }
        Err(e) => {
            st.metrics
                .jobs_rejected_total
                .fetch_add(1, Ordering::Relaxed);
            dispatch_error(e)
        }
    }
}

pub async fn list_jobs(State(st): State<AppState>) -> impl IntoResponse {
    Json(st.dispatcher.list_jobs())
}

pub async fn get_job(State(st): State<AppState>, Path(id): Path<String>) -> Response {
    match st.dispatcher.get_status(&id) {
        Ok(job) => Json(job).into_response(),
        Err(e) => dispatch_error(e),
    }
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct CompleteBody {
    pub result: String,
    pub metrics: JobMetrics,
}

pub async fn complete_job(
    State(st): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CompleteBody>,
) -> Response {
    match st.dispatcher.complete(&id, body.result, body.metrics) {
        Ok(job) => Json(job).into_response(),
        Err(e) => dispatch_error(e),
    }
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct FailBody {
    pub reason: String,
}

pub async fn fail_job(
    State(st): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FailBody>,
) -> Response {
    match st.dispatcher.fail(&id, &body.reason) {
        Ok(job) => Json(job).into_response(),
        Err(e) => dispatch_error(e),
    }
}

// ── Network ─────────────────────────────────────────────────────────────

pub async fn network_stats(State(st): State<AppState>) -> impl IntoResponse {
    let nodes = st.registry.list(&NodeFilter::default());

    let online_nodes = nodes
        .iter()
        .filter(|n| n.status == NodeStatus::Online)
        .count();
    let total_vram_mb = nodes.iter().map(|n| n.gpu.vram_mb).sum();
    let latencies: Vec<u64> = nodes
        .iter()
        .filter_map(|n| n.metrics.as_ref().map(|m| m.latency_ms))
        .collect();
    let avg_latency_ms = if latencies.is_empty() {
        None
    } else {
        Some(latencies.iter().sum::<u64>() / latencies.len() as u64)
    };

    let (jobs_total, jobs_completed, jobs_failed) = st.dispatcher.job_counts();

    Json(NetworkStats {
        total_nodes: nodes.len(),
        online_nodes,
        total_vram_mb,
        avg_latency_ms,
        jobs_total,
        jobs_completed,
        jobs_failed,
    })
}
