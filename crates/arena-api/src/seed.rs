use arena_common::{GeoLocation, GpuSpec, NodePricing, NodeSpec};
use arena_registry::Registry;

/// Built-in demo catalog. Nodes register with declared capabilities only
/// and stay offline until metric reports start arriving.
pub fn seed_demo_nodes(registry: &Registry) {
    let specs = vec![
        NodeSpec {
            node_id: "node-us-west".to_string(),
            name: "Arena-US-West".to_string(),
            location: Some(GeoLocation {
                city: "San Francisco".to_string(),
                country: "USA".to_string(),
                lat: 37.77,
                lng: -122.42,
            }),
            gpu: GpuSpec {
                model: "NVIDIA RTX 4090".to_string(),
                vram_mb: 24_576,
                compute_units: 16_384,
            },
            pricing: Some(NodePricing {
                hourly_usd: 0.15,
                per_inference_usd: 0.001,
            }),
        },
        NodeSpec {
            node_id: "node-ap-tokyo".to_string(),
            name: "Arena-AP-Tokyo".to_string(),
            location: Some(GeoLocation {
                city: "Tokyo".to_string(),
                country: "Japan".to_string(),
                lat: 35.68,
                lng: 139.69,
            }),
            gpu: GpuSpec {
                model: "NVIDIA A100".to_string(),
                vram_mb: 81_920,
                compute_units: 6_912,
            },
            pricing: Some(NodePricing {
                hourly_usd: 0.45,
                per_inference_usd: 0.002,
            }),
        },
        NodeSpec {
            node_id: "node-ap-mumbai".to_string(),
            name: "Arena-AP-Mumbai".to_string(),
            location: Some(GeoLocation {
                city: "Mumbai".to_string(),
                country: "India".to_string(),
                lat: 19.08,
                lng: 72.88,
            }),
            gpu: GpuSpec {
                model: "NVIDIA RTX 4080".to_string(),
                vram_mb: 16_384,
                compute_units: 9_728,
            },
            pricing: Some(NodePricing {
                hourly_usd: 0.12,
                per_inference_usd: 0.0008,
            }),
        },
    ];

    let count = specs.len();
    for spec in specs {
        registry.upsert(spec);
    }
    tracing::info!(count, "seeded demo node catalog");
}
