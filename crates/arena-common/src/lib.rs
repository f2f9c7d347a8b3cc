pub mod job;
pub mod network;
pub mod node;
pub mod telemetry;

pub use job::{Job, JobMetrics, JobStatus, WorkloadKind, WorkloadSpec};
pub use network::NetworkStats;
pub use node::{GeoLocation, GpuNode, GpuSpec, NodeMetrics, NodePricing, NodeSpec, NodeStatus};
