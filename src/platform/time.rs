use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Current time plus the only suspension point in the retry loop
#[async_trait]
pub trait TimeService: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by tokio's timer
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeService;

impl SystemTimeService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TimeService for SystemTimeService {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock. `sleep` returns at once and moves the clock forward.
#[derive(Debug)]
pub struct MockTimeService {
    start: DateTime<Utc>,
    now: Mutex<DateTime<Utc>>,
}

impl MockTimeService {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            start,
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());
    }

    /// Simulated time that has passed since construction
    pub fn elapsed(&self) -> Duration {
        (self.now() - self.start).to_std().unwrap_or_default()
    }
}

impl Default for MockTimeService {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

#[async_trait]
impl TimeService for MockTimeService {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
