use crate::config::AppConfig;
use crate::services::enhancer::{Enhancer, SimulatedEnhancer};
use std::sync::Arc;
use tracing::info;

pub fn setup_enhancer(config: &AppConfig) -> Arc<dyn Enhancer> {
    let enhancer = SimulatedEnhancer::new(config.processing_delay());
    info!(
        "✨ Enhancer: {} (delay={}ms)",
        enhancer.name(),
        config.processing_delay_ms
    );
    Arc::new(enhancer)
}
