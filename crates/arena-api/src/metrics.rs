use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::state::AppState;

#[derive(Debug, Default)]
pub struct Metrics {
    pub requests_total: AtomicU64,
    pub requests_inflight: AtomicU64,
    pub status_2xx: AtomicU64,
    pub status_4xx: AtomicU64,
    pub status_5xx: AtomicU64,
    pub jobs_submitted_total: AtomicU64,
    pub jobs_rejected_total: AtomicU64,
}

pub fn render_metrics(metrics: &Metrics) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "# HELP arena_api_requests_total Total requests handled by the API.\n\
         # TYPE arena_api_requests_total counter\n\
         arena_api_requests_total {}\n",
        metrics.requests_total.load(Ordering::Relaxed),
    ));
    body.push_str(&format!(
        "# HELP arena_api_requests_inflight Currently in-flight requests.\n\
         # TYPE arena_api_requests_inflight gauge\n\
         arena_api_requests_inflight {}\n",
        metrics.requests_inflight.load(Ordering::Relaxed),
    ));
    body.push_str(&format!(
        "# HELP arena_api_responses_2xx Total 2xx responses.\n\
         # TYPE arena_api_responses_2xx counter\n\
         arena_api_responses_2xx {}\n",
        metrics.status_2xx.load(Ordering::Relaxed),
    ));
    body.push_str(&format!(
        "# HELP arena_api_responses_4xx Total 4xx responses.\n\
         # TYPE arena_api_responses_4xx counter\n\
         arena_api_responses_4xx {}\n",
        metrics.status_4xx.load(Ordering::Relaxed),
    ));
    body.push_str(&format!(
        "# HELP arena_api_responses_5xx Total 5xx responses.\n\
         # TYPE arena_api_responses_5xx counter\n\
         arena_api_responses_5xx {}\n",
        metrics.status_5xx.load(Ordering::Relaxed),
    ));
    body.push_str(&format!(
        "# HELP arena_api_jobs_submitted_total Jobs accepted for dispatch.\n\
         # TYPE arena_api_jobs_submitted_total counter\n\
         arena_api_jobs_submitted_total {}\n",
        metrics.jobs_submitted_total.load(Ordering::Relaxed),
    ));
    body.push_str(&format!(
        "# HELP arena_api_jobs_rejected_total Job submissions rejected before dispatch.\n\
         # TYPE arena_api_jobs_rejected_total counter\n\
         arena_api_jobs_rejected_total {}\n",
        metrics.jobs_rejected_total.load(Ordering::Relaxed),
    ));

    body
}

pub async fn metrics_handler(State(st): State<AppState>) -> impl IntoResponse {
    let body = render_metrics(&st.metrics);
    (
        axum::http::StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}

pub async fn track_requests(
    State(st): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, std::convert::Infallible> {
    st.metrics.requests_inflight.fetch_add(1, Ordering::Relaxed);
    let resp = next.run(req).await;
    st.metrics.requests_inflight.fetch_sub(1, Ordering::Relaxed);
    st.metrics.requests_total.fetch_add(1, Ordering::Relaxed);

    let status = resp.status().as_u16();
    if status >= 500 {
        st.metrics.status_5xx.fetch_add(1, Ordering::Relaxed);
    } else if status >= 400 {
        st.metrics.status_4xx.fetch_add(1, Ordering::Relaxed);
    } else if status >= 200 {
        st.metrics.status_2xx.fetch_add(1, Ordering::Relaxed);
    }

    Ok(resp)
}
