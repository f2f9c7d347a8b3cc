use arena_common::GpuNode;

/// A candidate node presented to the placement strategy. The dispatcher
/// filters for eligibility (online, capability match) before delegating
/// selection to the strategy.
pub struct Candidate<'a> {
    pub node: &'a GpuNode,
}

/// Trait for pluggable placement strategies. Selection must be
/// deterministic for a given candidate slice.
pub trait PlacementStrategy: Send + Sync {
    /// Select one candidate from the list. Returns the index into `candidates`.
    fn select(&self, candidates: &[Candidate]) -> Option<usize>;

    /// Human-readable name for logging / metrics.
    fn name(&self) -> &'static str;
}

fn utilization(c: &Candidate) -> f64 {
    c.node
        .metrics
        .as_ref()
        .map(|m| m.utilization_pct)
        .unwrap_or(f64::MAX)
}

fn latency(c: &Candidate) -> u64 {
    c.node
        .metrics
        .as_ref()
        .map(|m| m.latency_ms)
        .unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// LowestUtilization — pick the least-loaded node; ties fall to lowest
// latency, then lexicographic node id (current default)
// ---------------------------------------------------------------------------

pub struct LowestUtilization;

impl PlacementStrategy for LowestUtilization {
    fn select(&self, candidates: &[Candidate]) -> Option<usize> {
        let mut best: Option<(usize, f64, u64, &str)> = None;

        for (i, c) in candidates.iter().enumerate() {
            let util = utilization(c);
            let lat = latency(c);
            let id = c.node.node_id.as_str();

            let better = match best {
                None => true,
                Some((_, best_util, best_lat, best_id)) => {
                    util < best_util
                        || (util == best_util && lat < best_lat)
                        || (util == best_util && lat == best_lat && id < best_id)
                }
            };
            if better {
                best = Some((i, util, lat, id));
            }
        }

        best.map(|(i, _, _, _)| i)
    }

    fn name(&self) -> &'static str {
        "lowest_utilization"
    }
}

// ---------------------------------------------------------------------------
// LowestLatency — pick the node closest to the caller; ties fall to
// lexicographic node id
// ---------------------------------------------------------------------------

pub struct LowestLatency;

impl PlacementStrategy for LowestLatency {
    fn select(&self, candidates: &[Candidate]) -> Option<usize> {
        let mut best: Option<(usize, u64, &str)> = None;

        for (i, c) in candidates.iter().enumerate() {
            let lat = latency(c);
            let id = c.node.node_id.as_str();

            let better = match best {
                None => true,
                Some((_, best_lat, best_id)) => {
                    lat < best_lat || (lat == best_lat && id < best_id)
                }
            };
            if better {
                best = Some((i, lat, id));
            }
        }

        best.map(|(i, _, _)| i)
    }

    fn name(&self) -> &'static str {
        "lowest_latency"
    }
}

/// Parse a strategy name string into a boxed strategy.
pub fn parse_strategy(name: &str) -> Result<Box<dyn PlacementStrategy>, String> {
    match name {
        "lowest_utilization" => Ok(Box::new(LowestUtilization)),
        "lowest_latency" => Ok(Box::new(LowestLatency)),
        other => Err(format!(
            "unknown placement strategy '{}', available: lowest_utilization, lowest_latency",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_common::{GpuSpec, NodeMetrics, NodeStatus};

    fn make_node(id: &str, utilization_pct: f64, latency_ms: u64) -> GpuNode {
        GpuNode {
            node_id: id.to_string(),
            name: format!("node {id}"),
            location: None,
            gpu: GpuSpec {
                model: "NVIDIA RTX 4090".to_string(),
                vram_mb: 24_576,
                compute_units: 16384,
            },
            pricing: None,
            status: NodeStatus::Online,
            metrics: Some(NodeMetrics {
                utilization_pct,
                memory_used_pct: 30.0,
                temperature_c: 60.0,
                latency_ms,
            }),
            last_heartbeat_ms: 0,
        }
    }

    #[test]
    fn test_lowest_utilization() {
        let n0 = make_node("a", 50.0, 45);
        let n1 = make_node("b", 10.0, 120);

        let candidates = vec![Candidate { node: &n0 }, Candidate { node: &n1 }];
        assert_eq!(LowestUtilization.select(&candidates), Some(1));
    }

    #[test]
    fn test_lowest_utilization_tie_breaks_on_latency() {
        let n0 = make_node("a", 10.0, 120);
        let n1 = make_node("b", 10.0, 45);

        let candidates = vec![Candidate { node: &n0 }, Candidate { node: &n1 }];
        assert_eq!(LowestUtilization.select(&candidates), Some(1));
    }

    #[test]
    fn test_lowest_utilization_full_tie_breaks_on_id() {
        let n0 = make_node("b", 10.0, 45);
        let n1 = make_node("a", 10.0, 45);

        let candidates = vec![Candidate { node: &n0 }, Candidate { node: &n1 }];
        assert_eq!(LowestUtilization.select(&candidates), Some(1));
    }

    #[test]
    fn test_lowest_latency() {
        let n0 = make_node("a", 10.0, 120);
        let n1 = make_node("b", 90.0, 45);

        let candidates = vec![Candidate { node: &n0 }, Candidate { node: &n1 }];
        assert_eq!(LowestLatency.select(&candidates), Some(1));
    }

    #[test]
    fn test_empty_candidates() {
        assert_eq!(LowestUtilization.select(&[]), None);
        assert_eq!(LowestLatency.select(&[]), None);
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!(
            parse_strategy("lowest_utilization").unwrap().name(),
            "lowest_utilization"
        );
        assert_eq!(
            parse_strategy("lowest_latency").unwrap().name(),
            "lowest_latency"
        );
        assert!(parse_strategy("round_robin").is_err());
    }
}
