use std::sync::Arc;

use arena_dispatch::Dispatcher;
use arena_registry::Registry;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub dispatcher: Arc<Dispatcher>,
    pub metrics: Arc<Metrics>,
}
