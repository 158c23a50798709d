//! Per-platform send throttle.
//!
//! Every caller reserves the next free send slot under a lock and then sleeps
//! until that slot outside of it, so concurrent senders queue up fairly and at
//! most `messages_per_second` sends start within any one-second window.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

#[derive(Debug)]
pub struct Throttle {
    period: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    /// `messages_per_second` must be positive; zero is clamped to one.
    pub fn new(messages_per_second: u32) -> Self {
        Self {
            period: Duration::from_secs(1) / messages_per_second.max(1),
            next_slot: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Waits for this caller's send slot.
    pub async fn acquire(&self) {
        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(slot) if slot > now => slot,
                _ => now,
            };
            *next_slot = Some(slot + self.period);
            slot
        };
        sleep_until(slot).await;
    }
}
