//! Sliding-window request governor.
//!
//! The ledger API allows on the order of 100 requests per minute per
//! organization. The governor counts requests over a sliding 60-second
//! window and blocks new callers until the window frees a slot, so a burst
//! of page renders cannot push the shared budget into upstream 429s.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

const WINDOW: Duration = Duration::from_secs(60);

/// Governs outgoing request rate across all callers sharing this instance.
#[derive(Debug)]
pub struct RequestGovernor {
    max_per_window: u32,
    window: tokio::sync::Mutex<VecDeque<Instant>>,
}

impl RequestGovernor {
    pub fn new(max_per_window: u32) -> Self {
        Self {
            max_per_window,
            window: tokio::sync::Mutex::new(VecDeque::new()),
        }
    }

    /// Claim a request slot, sleeping until one is available.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let now = Instant::now();
                while window
                    .front()
                    .is_some_and(|&oldest| now.duration_since(oldest) >= WINDOW)
                {
                    window.pop_front();
                }

                if (window.len() as u32) < self.max_per_window {
                    window.push_back(now);
                    return;
                }

                // Window is full; the oldest entry leaving it frees a slot.
                let oldest = *window.front().expect("full window has a front");
                WINDOW - now.duration_since(oldest)
            };

            debug!(wait_ms = wait.as_millis() as u64, "request governor at capacity, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    /// Requests currently counted in the window (test introspection).
    pub async fn window_len(&self) -> usize {
        let mut window = self.window.lock().await;
        let now = Instant::now();
        while window
            .front()
            .is_some_and(|&oldest| now.duration_since(oldest) >= WINDOW)
        {
            window.pop_front();
        }
        window.len()
    }
}
