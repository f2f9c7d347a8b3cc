use std::sync::Arc;
use std::time::Duration;

use crate::Registry;

/// Periodic staleness sweep. Runs alongside push-based metric reports so a
/// node that goes silent is marked offline within one interval.
pub async fn sweep_loop(registry: Arc<Registry>, interval: Duration) {
    tracing::info!(interval_ms = interval.as_millis() as u64, "staleness sweep started");
    loop {
        tokio::time::sleep(interval).await;
        registry.sweep();
    }
}
