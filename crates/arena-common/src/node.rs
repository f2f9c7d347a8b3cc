use serde::{Deserialize, Serialize};

/// Health of a compute node. Derived from heartbeat age and the latest
/// metrics report; clients never set it directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Online,
    Degraded,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpuSpec {
    /// Accelerator model (e.g., "NVIDIA RTX 4090")
    pub model: String,
    pub vram_mb: u64,
    pub compute_units: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoLocation {
    pub city: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodePricing {
    pub hourly_usd: f64,
    pub per_inference_usd: f64,
}

/// Latest metrics report from a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeMetrics {
    pub utilization_pct: f64,
    pub memory_used_pct: f64,
    pub temperature_c: f64,
    pub latency_ms: u64,
}

/// What an operator declares when registering a node. Status, metrics and
/// heartbeat are tracked separately and survive re-registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeSpec {
    pub node_id: String,
    pub name: String,

    #[serde(default)]
    pub location: Option<GeoLocation>,

    pub gpu: GpuSpec,

    #[serde(default)]
    pub pricing: Option<NodePricing>,
}

/// Full node record as stored in the registry and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpuNode {
    pub node_id: String,
    pub name: String,

    #[serde(default)]
    pub location: Option<GeoLocation>,

    pub gpu: GpuSpec,

    #[serde(default)]
    pub pricing: Option<NodePricing>,

    pub status: NodeStatus,

    #[serde(default)]
    pub metrics: Option<NodeMetrics>,

    pub last_heartbeat_ms: u64,
}
