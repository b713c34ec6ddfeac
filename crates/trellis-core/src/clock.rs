//! Injected time source.
//!
//! Hooks stamp live events with [`Clock::now`] and undo windows count down
//! with [`Clock::sleep`], so tests can substitute a controlled clock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Time source plus scheduled wake-up.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Suspend the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by `chrono` and the tokio timer.
///
/// Under `tokio::time::pause()` the sleeps become virtual, which is how the
/// undo-window tests run without waiting.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
