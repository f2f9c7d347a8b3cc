use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    Text,
    Image,
    Video,
}

/// What a caller submits: which model to run, on what kind of workload,
/// and the input payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkloadSpec {
    /// Model name (e.g., "llama-3.2")
    pub model: String,
    pub kind: WorkloadKind,
    pub input: String,

    /// Minimum VRAM the serving node must have, if the caller knows it.
    #[serde(default)]
    pub required_vram_mb: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Resource/cost accounting reported by the execution backend for a
/// finished job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobMetrics {
    pub inference_ms: u64,

    #[serde(default)]
    pub tokens_generated: Option<u64>,

    #[serde(default)]
    pub vram_peak_pct: Option<f64>,

    #[serde(default)]
    pub cost_usd: Option<f64>,
}

/// One inference request and its lifecycle record. `node_id` is assigned at
/// dispatch time and immutable afterward; it is a reference by id only, so
/// removing the node leaves its job history intact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub job_id: String,
    pub node_id: String,
    pub workload: WorkloadSpec,
    pub status: JobStatus,

    /// Present only when `status` is `completed`.
    #[serde(default)]
    pub result: Option<String>,

    /// Present only when `status` is `failed`.
    #[serde(default)]
    pub error: Option<String>,

    /// Present only in terminal states.
    #[serde(default)]
    pub metrics: Option<JobMetrics>,

    pub created_at_ms: u64,

    #[serde(default)]
    pub completed_at_ms: Option<u64>,
}
