use async_trait::async_trait;
use std::time::Duration;

use crate::domain::Sleeper;

/// Backoff waits on the tokio timer. Other tasks keep running while it sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
