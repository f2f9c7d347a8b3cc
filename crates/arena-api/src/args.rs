use clap::Parser;

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    #[arg(long, default_value = "lowest_utilization")]
    pub placement_strategy: String,

    /// Staleness sweep interval.
    #[arg(long, default_value_t = 3_000)]
    pub sweep_interval_ms: u64,

    /// Heartbeat older than this marks a node offline.
    #[arg(long, default_value_t = 15_000)]
    pub heartbeat_timeout_ms: u64,

    /// Heartbeat older than this (but within the timeout) marks a node degraded.
    #[arg(long, default_value_t = 5_000)]
    pub degraded_after_ms: u64,

    #[arg(long, default_value_t = 95.0)]
    pub max_utilization_pct: f64,

    #[arg(long, default_value_t = 85.0)]
    pub max_temperature_c: f64,

    /// Remote compute-network inference endpoint (e.g. "https://api.example.com").
    /// If not set, jobs run on the simulated backend.
    #[arg(long, env = "ARENA_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Bearer token for the remote backend.
    #[arg(long, env = "ARENA_BACKEND_TOKEN")]
    pub backend_token: Option<String>,

    /// Simulated inference time per job.
    #[arg(long, default_value_t = 2_000)]
    pub simulated_delay_ms: u64,

    /// Register the built-in demo node catalog at startup.
    #[arg(long, default_value_t = false)]
    pub seed_demo: bool,
}
