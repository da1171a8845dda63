//! Per-client submission throttling.
//!
//! One accepted submission per client address per window (five minutes by
//! default, the site's historical block). State is an in-memory map pruned
//! as it is touched — a restart forgets it, which errs on the side of
//! accepting.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

const DEFAULT_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Sliding-window throttle keyed by client address.
#[derive(Debug)]
pub struct Throttle {
    window: Duration,
    recent: Mutex<HashMap<IpAddr, Instant>>,
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self { window, recent: Mutex::new(HashMap::new()) }
    }

    /// How much longer the client has to wait, if it is inside its window.
    pub fn retry_after(&self, client: IpAddr) -> Option<Duration> {
        let recent = self.recent.lock().unwrap_or_else(|poison| poison.into_inner());
        let elapsed = recent.get(&client)?.elapsed();
        let remaining = self.window.checked_sub(elapsed)?;
        debug!(%client, ?remaining, "submission throttled");
        Some(remaining)
    }

    /// Record an accepted submission from this client, starting its window.
    ///
    /// Also prunes expired entries so the map only ever holds addresses that
    /// are still inside a window.
    pub fn note(&self, client: IpAddr) {
        let mut recent = self.recent.lock().unwrap_or_else(|poison| poison.into_inner());
        recent.retain(|_, at| at.elapsed() < self.window);
        recent.insert(client, Instant::now());
    }
}
