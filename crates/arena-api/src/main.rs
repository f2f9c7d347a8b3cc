mod args;
mod handlers;
mod metrics;
mod seed;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use clap::Parser;

use arena_dispatch::backend::{ExecutionBackend, HttpBackend, SimulatedBackend};
use arena_dispatch::strategy::parse_strategy;
use arena_dispatch::Dispatcher;
use arena_registry::sweep::sweep_loop;
use arena_registry::{Registry, RegistryConfig};

use crate::args::Args;
use crate::handlers::{
    complete_job, delete_node, fail_job, get_job, get_node, healthz, list_jobs, list_nodes,
    network_stats, node_metrics, report_node_metrics, submit_job, upsert_node,
};
use crate::metrics::{metrics_handler, track_requests};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    arena_common::telemetry::init_tracing("arena-api");

    let registry = Registry::with_config(RegistryConfig {
        heartbeat_timeout_ms: args.heartbeat_timeout_ms,
        degraded_after_ms: args.degraded_after_ms,
        max_utilization_pct: args.max_utilization_pct,
        max_temperature_c: args.max_temperature_c,
    });

    if args.seed_demo {
        seed::seed_demo_nodes(&registry);
    }

    let backend: Arc<dyn ExecutionBackend> = match args.backend_url.as_deref() {
        Some(url) => {
            tracing::info!(url, "using HTTP execution backend");
            Arc::new(HttpBackend::new(url.to_string(), args.backend_token.clone()))
        }
        None => {
            tracing::info!(
                delay_ms = args.simulated_delay_ms,
                "no backend URL configured, using simulated backend"
            );
            Arc::new(SimulatedBackend::new(Duration::from_millis(
                args.simulated_delay_ms,
            )))
        }
    };

    let strategy = parse_strategy(&args.placement_strategy).unwrap_or_else(|e| {
        tracing::error!(error = %e, "invalid placement strategy");
        std::process::exit(1);
    });
    let dispatcher = Dispatcher::with_strategy(registry.clone(), backend, strategy);

    let registry_for_sweep = registry.clone();
    let sweep_interval = Duration::from_millis(args.sweep_interval_ms);
    tokio::spawn(async move {
        sweep_loop(registry_for_sweep, sweep_interval).await;
    });

    let metrics = Arc::new(metrics::Metrics::default());

    let st = AppState {
        registry,
        dispatcher,
        metrics,
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/health", get(healthz))
        .route("/metrics", get(metrics_handler))
        .route("/nodes", get(list_nodes).post(upsert_node))
        .route("/nodes/:id", get(get_node).delete(delete_node))
        .route(
            "/nodes/:id/metrics",
            get(node_metrics).post(report_node_metrics),
        )
        .route("/jobs", get(list_jobs).post(submit_job))
        .route("/jobs/:id", get(get_job))
        .route("/jobs/:id/complete", post(complete_job))
        .route("/jobs/:id/fail", post(fail_job))
        .route("/stats", get(network_stats))
        .layer(middleware::from_fn_with_state(st.clone(), track_requests))
        .with_state(st);

    let listener = tokio::net::TcpListener::bind(&args.listen_addr).await?;
    tracing::info!(listen_addr = %args.listen_addr, "arena api listening");
    axum::serve(listener, app).await?;
    Ok(())
}
