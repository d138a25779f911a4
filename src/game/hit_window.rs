//! Time-boxed correlation of a gun shot with the opponent's vest report.
//!
//! The window polls the shared shot-report stream without blocking, sleeping a
//! short interval between empty polls, until a report for the opponent with
//! `isHit` set arrives or the deadline passes. Reports that do not match the
//! current shot are either discarded or retained for later shots depending on
//! [`MismatchPolicy`]. Reports still queued on the live stream always count,
//! however long the session was busy; only the retained side buffer ages out.

use std::collections::VecDeque;
use std::str::FromStr;
use std::time::Duration;

use tokio::sync::mpsc::{error::TryRecvError, UnboundedReceiver};
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::protocol::StampedShotReport;
use crate::util::time::{remaining_until, HIT_POLL_MS, HIT_WINDOW_MS};

use super::PlayerId;

/// What happens to a report dequeued while looking for a different one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MismatchPolicy {
    /// Consume and discard it
    Drop,
    /// Keep hit reports for a later shot, in arrival order
    #[default]
    Retain,
}

impl FromStr for MismatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(MismatchPolicy::Drop),
            "retain" => Ok(MismatchPolicy::Retain),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HitWindowConfig {
    pub window: Duration,
    pub poll_interval: Duration,
    pub policy: MismatchPolicy,
    /// Retained reports older than this are expired instead of matched
    pub retention: Duration,
}

impl HitWindowConfig {
    pub fn new(window: Duration, poll_interval: Duration, policy: MismatchPolicy) -> Self {
        Self {
            window,
            poll_interval,
            policy,
            retention: window * 2,
        }
    }
}

impl Default for HitWindowConfig {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(HIT_WINDOW_MS),
            Duration::from_millis(HIT_POLL_MS),
            MismatchPolicy::default(),
        )
    }
}

/// Owns the receiving end of the shot-report stream
pub struct HitCorrelationWindow {
    reports: UnboundedReceiver<StampedShotReport>,
    /// Unmatched hit reports with the instant they were set aside
    retained: VecDeque<(Instant, StampedShotReport)>,
    config: HitWindowConfig,
}

impl HitCorrelationWindow {
    pub fn new(reports: UnboundedReceiver<StampedShotReport>, config: HitWindowConfig) -> Self {
        Self {
            reports,
            retained: VecDeque::new(),
            config,
        }
    }

    /// Number of reports held back for later shots
    pub fn retained_len(&self) -> usize {
        self.retained.len()
    }

    /// Wait up to the window for the opponent of `shooter` to report a hit.
    ///
    /// The matching report is consumed. Never waits past the deadline.
    pub async fn await_hit(&mut self, shooter: PlayerId) -> bool {
        let target = shooter.opponent();
        let deadline = Instant::now() + self.config.window;

        self.expire_retained();
        if self.take_retained(target) {
            debug!(shooter = %shooter, target = %target, "Shot matched a retained hit report");
            return true;
        }

        loop {
            if Instant::now() >= deadline {
                break;
            }

            match self.reports.try_recv() {
                Ok(stamped) => {
                    if stamped.report.player_id == target && stamped.report.is_hit {
                        debug!(
                            shooter = %shooter,
                            target = %target,
                            queued_ms = stamped.received_at.elapsed().as_millis() as u64,
                            "Shot correlated with hit report"
                        );
                        return true;
                    }
                    self.on_mismatch(stamped);
                }
                Err(TryRecvError::Empty) => {
                    let wait = self.config.poll_interval.min(remaining_until(deadline));
                    if wait.is_zero() {
                        break;
                    }
                    sleep(wait).await;
                }
                Err(TryRecvError::Disconnected) => {
                    debug!("Shot report stream closed");
                    break;
                }
            }
        }

        false
    }

    fn on_mismatch(&mut self, stamped: StampedShotReport) {
        match self.config.policy {
            MismatchPolicy::Retain if stamped.report.is_hit => {
                trace!(report = ?stamped.report, "Retaining unmatched hit report");
                self.retained.push_back((Instant::now(), stamped));
            }
            _ => {
                debug!(report = ?stamped.report, "Discarding unmatched shot report");
            }
        }
    }

    fn take_retained(&mut self, target: PlayerId) -> bool {
        let position = self
            .retained
            .iter()
            .position(|(_, s)| s.report.player_id == target && s.report.is_hit);
        position.and_then(|i| self.retained.remove(i)).is_some()
    }

    fn expire_retained(&mut self) {
        while let Some((retained_at, front)) = self.retained.front() {
            if retained_at.elapsed() <= self.config.retention {
                break;
            }
            debug!(report = ?front.report, "Retained shot report expired");
            self.retained.pop_front();
        }
    }
}
