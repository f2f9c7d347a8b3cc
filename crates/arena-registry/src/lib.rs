use std::sync::Arc;

use dashmap::DashMap;

use arena_common::{GpuNode, NodeMetrics, NodeSpec, NodeStatus};

pub mod sweep;
mod util;

use util::now_ms;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("node '{0}' not found")]
    NotFound(String),
}

/// Bounds that drive status derivation.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Heartbeat older than this → offline.
    pub heartbeat_timeout_ms: u64,
    /// Heartbeat older than this (but within the timeout) → degraded.
    pub degraded_after_ms: u64,
    pub max_utilization_pct: f64,
    pub max_temperature_c: f64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            heartbeat_timeout_ms: 15_000,
            degraded_after_ms: 5_000,
            max_utilization_pct: 95.0,
            max_temperature_c: 85.0,
        }
    }
}

/// Optional constraints for `Registry::list`.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct NodeFilter {
    pub status: Option<NodeStatus>,
    pub min_vram_mb: Option<u64>,
    pub gpu_model: Option<String>,
}

/// The set of known compute nodes with their declared capabilities and
/// live status. Mutations are serialized per node; reads clone a snapshot.
pub struct Registry {
    nodes: DashMap<String, GpuNode>,
    cfg: RegistryConfig,
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(cfg: RegistryConfig) -> Arc<Self> {
        tracing::info!(
            heartbeat_timeout_ms = cfg.heartbeat_timeout_ms,
            degraded_after_ms = cfg.degraded_after_ms,
            "registry initialized"
        );
        Arc::new(Self {
            nodes: DashMap::new(),
            cfg,
        })
    }

    /// Insert or replace a node's declared capabilities. Status, metrics and
    /// heartbeat are owned by the report/sweep path and survive untouched.
    pub fn upsert(&self, spec: NodeSpec) {
        match self.nodes.entry(spec.node_id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(mut e) => {
                let node = e.get_mut();
                node.name = spec.name;
                node.location = spec.location;
                node.gpu = spec.gpu;
                node.pricing = spec.pricing;
                tracing::debug!(node_id = %node.node_id, "node spec replaced");
            }
            dashmap::mapref::entry::Entry::Vacant(v) => {
                tracing::info!(node_id = %spec.node_id, gpu = %spec.gpu.model, "node registered");
                v.insert(GpuNode {
                    node_id: spec.node_id,
                    name: spec.name,
                    location: spec.location,
                    gpu: spec.gpu,
                    pricing: spec.pricing,
                    // Never heartbeated yet.
                    status: NodeStatus::Offline,
                    metrics: None,
                    last_heartbeat_ms: 0,
                });
            }
        }
    }

    /// Record a metrics report, stamp the heartbeat, and recompute status.
    pub fn report_metrics(
        &self,
        node_id: &str,
        metrics: NodeMetrics,
    ) -> Result<NodeStatus, RegistryError> {
        self.report_at(node_id, metrics, now_ms())
    }

    fn report_at(
        &self,
        node_id: &str,
        metrics: NodeMetrics,
        now_ms: u64,
    ) -> Result<NodeStatus, RegistryError> {
        let mut entry = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| RegistryError::NotFound(node_id.to_string()))?;

        entry.metrics = Some(metrics);
        entry.last_heartbeat_ms = now_ms;

        let status = derive_status(&self.cfg, &entry, now_ms);
        if status != entry.status {
            tracing::info!(node_id = %entry.node_id, from = ?entry.status, to = ?status, "node status changed");
        }
        entry.status = status;
        Ok(status)
    }

    pub fn get(&self, node_id: &str) -> Result<GpuNode, RegistryError> {
        self.nodes
            .get(node_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| RegistryError::NotFound(node_id.to_string()))
    }

    /// Nodes matching the filter, ordered by ascending observed latency
    /// (nodes without metrics last), ties broken by node id.
    pub fn list(&self, filter: &NodeFilter) -> Vec<GpuNode> {
        let mut out: Vec<GpuNode> = self
            .nodes
            .iter()
            .filter(|e| {
                let node = e.value();
                if let Some(status) = filter.status {
                    if node.status != status {
                        return false;
                    }
                }
                if let Some(min_vram) = filter.min_vram_mb {
                    if node.gpu.vram_mb < min_vram {
                        return false;
                    }
                }
                if let Some(model) = filter.gpu_model.as_deref() {
                    if node.gpu.model != model {
                        return false;
                    }
                }
                true
            })
            .map(|e| e.value().clone())
            .collect();

        out.sort_by(|a, b| {
            let la = a.metrics.as_ref().map(|m| m.latency_ms).unwrap_or(u64::MAX);
            let lb = b.metrics.as_ref().map(|m| m.latency_ms).unwrap_or(u64::MAX);
            la.cmp(&lb).then_with(|| a.node_id.cmp(&b.node_id))
        });
        out
    }

    /// Drop a node. Historical jobs reference nodes by id only, so this
    /// never touches job records.
    pub fn remove(&self, node_id: &str) -> Result<(), RegistryError> {
        if self.nodes.remove(node_id).is_none() {
            return Err(RegistryError::NotFound(node_id.to_string()));
        }
        tracing::info!(node_id, "node removed");
        Ok(())
    }

    /// Recompute every node's status from its stored state, so a node that
    /// stopped reporting is marked offline without any new input.
    pub fn sweep(&self) {
        self.sweep_at(now_ms())
    }

    fn sweep_at(&self, now_ms: u64) {
        for mut entry in self.nodes.iter_mut() {
            let status = derive_status(&self.cfg, &entry, now_ms);
            if status != entry.status {
                tracing::info!(node_id = %entry.node_id, from = ?entry.status, to = ?status, "node status changed");
                entry.status = status;
            }
        }
    }
}

/// Status is a pure function of the latest metrics and heartbeat age.
fn derive_status(cfg: &RegistryConfig, node: &GpuNode, now_ms: u64) -> NodeStatus {
    let Some(metrics) = node.metrics.as_ref() else {
        return NodeStatus::Offline;
    };

    let age_ms = now_ms.saturating_sub(node.last_heartbeat_ms);
    if age_ms > cfg.heartbeat_timeout_ms {
        return NodeStatus::Offline;
    }
    if age_ms > cfg.degraded_after_ms {
        return NodeStatus::Degraded;
    }
    if metrics.utilization_pct > cfg.max_utilization_pct
        || metrics.temperature_c > cfg.max_temperature_c
    {
        return NodeStatus::Degraded;
    }
    NodeStatus::Online
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_common::GpuSpec;

    const T0: u64 = 1_000_000;

    fn make_spec(id: &str, vram_mb: u64) -> NodeSpec {
        NodeSpec {
            node_id: id.to_string(),
            name: format!("node {id}"),
            location: None,
            gpu: GpuSpec {
                model: "NVIDIA RTX 4090".to_string(),
                vram_mb,
                compute_units: 16384,
            },
            pricing: None,
        }
    }

    fn make_metrics(utilization_pct: f64, temperature_c: f64, latency_ms: u64) -> NodeMetrics {
        NodeMetrics {
            utilization_pct,
            memory_used_pct: 30.0,
            temperature_c,
            latency_ms,
        }
    }

    #[test]
    fn test_upsert_and_get() {
        let reg = Registry::new();
        reg.upsert(make_spec("n1", 24_576));

        let node = reg.get("n1").unwrap();
        assert_eq!(node.node_id, "n1");
        assert_eq!(node.gpu.vram_mb, 24_576);
        assert!(matches!(reg.get("missing"), Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn test_never_reported_node_is_offline() {
        let reg = Registry::new();
        reg.upsert(make_spec("n1", 24_576));

        let node = reg.get("n1").unwrap();
        assert_eq!(node.status, NodeStatus::Offline);
        assert!(node.metrics.is_none());
    }

    #[test]
    fn test_report_metrics_unknown_node() {
        let reg = Registry::new();
        let err = reg.report_metrics("ghost", make_metrics(10.0, 60.0, 45));
        assert!(matches!(err, Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn test_fresh_in_bounds_report_is_online() {
        let reg = Registry::new();
        reg.upsert(make_spec("n1", 24_576));

        let status = reg.report_at("n1", make_metrics(42.0, 65.0, 45), T0).unwrap();
        assert_eq!(status, NodeStatus::Online);
        assert_eq!(reg.get("n1").unwrap().status, NodeStatus::Online);
    }

    #[test]
    fn test_out_of_bounds_metrics_degrade() {
        let reg = Registry::new();
        reg.upsert(make_spec("hot", 24_576));
        reg.upsert(make_spec("busy", 24_576));

        let status = reg.report_at("hot", make_metrics(42.0, 93.0, 45), T0).unwrap();
        assert_eq!(status, NodeStatus::Degraded);

        let status = reg.report_at("busy", make_metrics(99.0, 65.0, 45), T0).unwrap();
        assert_eq!(status, NodeStatus::Degraded);
    }

    #[test]
    fn test_stale_heartbeat_degrades_then_offlines() {
        let reg = Registry::new();
        let cfg = RegistryConfig::default();
        reg.upsert(make_spec("n1", 24_576));
        reg.report_at("n1", make_metrics(10.0, 60.0, 45), T0).unwrap();

        reg.sweep_at(T0 + cfg.degraded_after_ms + 1);
        assert_eq!(reg.get("n1").unwrap().status, NodeStatus::Degraded);

        reg.sweep_at(T0 + cfg.heartbeat_timeout_ms + 1);
        assert_eq!(reg.get("n1").unwrap().status, NodeStatus::Offline);
    }

    #[test]
    fn test_new_report_revives_offline_node() {
        let reg = Registry::new();
        let cfg = RegistryConfig::default();
        reg.upsert(make_spec("n1", 24_576));
        reg.report_at("n1", make_metrics(10.0, 60.0, 45), T0).unwrap();
        reg.sweep_at(T0 + cfg.heartbeat_timeout_ms + 1);
        assert_eq!(reg.get("n1").unwrap().status, NodeStatus::Offline);

        let t1 = T0 + cfg.heartbeat_timeout_ms + 2;
        let status = reg.report_at("n1", make_metrics(10.0, 60.0, 45), t1).unwrap();
        assert_eq!(status, NodeStatus::Online);
    }

    #[test]
    fn test_upsert_preserves_live_state() {
        let reg = Registry::new();
        reg.upsert(make_spec("n1", 24_576));
        reg.report_at("n1", make_metrics(10.0, 60.0, 45), T0).unwrap();

        let mut respec = make_spec("n1", 24_576);
        respec.name = "renamed".to_string();
        reg.upsert(respec);

        let node = reg.get("n1").unwrap();
        assert_eq!(node.name, "renamed");
        assert_eq!(node.status, NodeStatus::Online);
        assert_eq!(node.last_heartbeat_ms, T0);
        assert_eq!(node.metrics.unwrap().latency_ms, 45);
    }

    #[test]
    fn test_list_orders_by_latency_then_id() {
        let reg = Registry::new();
        for id in ["c", "a", "b", "d"] {
            reg.upsert(make_spec(id, 24_576));
        }
        reg.report_at("c", make_metrics(10.0, 60.0, 120), T0).unwrap();
        reg.report_at("a", make_metrics(10.0, 60.0, 45), T0).unwrap();
        reg.report_at("b", make_metrics(10.0, 60.0, 45), T0).unwrap();
        // "d" never reports and sorts last.

        let ids: Vec<String> = reg
            .list(&NodeFilter::default())
            .into_iter()
            .map(|n| n.node_id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_list_filters() {
        let reg = Registry::new();
        reg.upsert(make_spec("small", 16_384));
        let mut big = make_spec("big", 81_920);
        big.gpu.model = "NVIDIA A100".to_string();
        reg.upsert(big);
        reg.report_at("big", make_metrics(10.0, 60.0, 120), T0).unwrap();

        let online = reg.list(&NodeFilter {
            status: Some(NodeStatus::Online),
            ..Default::default()
        });
        assert_eq!(online.len(), 1);
        assert_eq!(online[0].node_id, "big");

        let roomy = reg.list(&NodeFilter {
            min_vram_mb: Some(24_576),
            ..Default::default()
        });
        assert_eq!(roomy.len(), 1);
        assert_eq!(roomy[0].node_id, "big");

        let a100 = reg.list(&NodeFilter {
            gpu_model: Some("NVIDIA A100".to_string()),
            ..Default::default()
        });
        assert_eq!(a100.len(), 1);

        let none = reg.list(&NodeFilter {
            status: Some(NodeStatus::Online),
            min_vram_mb: Some(100_000),
            ..Default::default()
        });
        assert!(none.is_empty());
    }

    #[test]
    fn test_remove() {
        let reg = Registry::new();
        reg.upsert(make_spec("n1", 24_576));
        assert!(reg.remove("n1").is_ok());
        assert!(matches!(reg.remove("n1"), Err(RegistryError::NotFound(_))));
        assert!(matches!(reg.get("n1"), Err(RegistryError::NotFound(_))));
    }
}
