use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// Image enhancement step applied by the process operation.
#[async_trait]
pub trait Enhancer: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the enhanced payload for `input`.
    async fn enhance(&self, input: Bytes) -> Result<Bytes>;
}

/// Stand-in for a real model: waits for `delay`, then returns the input untouched.
pub struct SimulatedEnhancer {
    delay: Duration,
}

impl SimulatedEnhancer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Enhancer for SimulatedEnhancer {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn enhance(&self, input: Bytes) -> Result<Bytes> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(input)
    }
}
