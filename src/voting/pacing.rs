use async_trait::async_trait;
use tokio::time::Duration;

use crate::models::config::VotingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    // Wait after each server that reached the automation endpoint.
    pub between_servers: Duration,
    // Wait before retrying a server with the next token.
    pub after_rotation: Duration,
}

impl PacingPolicy {
    pub fn from_config(config: &VotingConfig) -> Self {
        Self {
            between_servers: Duration::from_millis(config.server_delay_ms),
            after_rotation: Duration::from_millis(config.rotation_delay_ms),
        }
    }

    pub fn none() -> Self {
        Self {
            between_servers: Duration::ZERO,
            after_rotation: Duration::ZERO,
        }
    }
}

#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        tokio::time::sleep(duration).await;
    }
}
