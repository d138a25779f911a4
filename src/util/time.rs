//! Time utilities for the session and relay loops

use std::time::{Duration, Instant};

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Default length of the shot correlation window
pub const HIT_WINDOW_MS: u64 = 1_000;
/// Default sleep between shot-report polls
pub const HIT_POLL_MS: u64 = 50;
/// Default bounded accept poll for the relay listener
pub const ACCEPT_POLL_MS: u64 = 1_000;
/// Default wait for a controller confirmation
pub const CONTROLLER_TIMEOUT_MS: u64 = 30_000;
/// Default wait for the evaluation service
pub const EVALUATION_TIMEOUT_MS: u64 = 30_000;

/// Time left until `deadline`, zero once it has passed
pub fn remaining_until(deadline: tokio::time::Instant) -> Duration {
    deadline.saturating_duration_since(tokio::time::Instant::now())
}
