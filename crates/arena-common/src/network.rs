use serde::{Deserialize, Serialize};

/// Aggregate view over the node fleet and job history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkStats {
    pub total_nodes: usize,
    pub online_nodes: usize,
    pub total_vram_mb: u64,

    /// Mean observed latency across nodes with metrics, if any.
    #[serde(default)]
    pub avg_latency_ms: Option<u64>,

    pub jobs_total: usize,
    pub jobs_completed: usize,
    pub jobs_failed: usize,
}
