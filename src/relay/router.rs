//! Report router - demultiplexes the engine's copy of the relay stream into
//! shot reports and per-player action streams.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::game::{PlayerId, SessionHandle};
use crate::protocol::hardware::ReportError;
use crate::protocol::{HardwareReport, StampedShotReport};
use crate::util::Shutdown;

/// Where a relay message was delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Shot,
    Action(PlayerId),
}

#[derive(Debug, Clone)]
pub struct ReportRoutes {
    p1_actions: UnboundedSender<String>,
    p2_actions: UnboundedSender<String>,
    shots: UnboundedSender<StampedShotReport>,
}

impl ReportRoutes {
    pub fn new(
        p1_actions: UnboundedSender<String>,
        p2_actions: UnboundedSender<String>,
        shots: UnboundedSender<StampedShotReport>,
    ) -> Self {
        Self {
            p1_actions,
            p2_actions,
            shots,
        }
    }

    pub fn from_handle(handle: &SessionHandle) -> Self {
        Self::new(
            handle.p1_actions.clone(),
            handle.p2_actions.clone(),
            handle.shot_reports.clone(),
        )
    }

    /// Classify one relay message and forward it
    pub fn route(&self, raw: &str) -> Result<Route, ReportError> {
        let delivered = match HardwareReport::parse(raw)? {
            HardwareReport::Shot(report) => {
                let sent = self.shots.send(StampedShotReport::now(report)).is_ok();
                (Route::Shot, sent)
            }
            HardwareReport::Action(action) => {
                let tx = match action.player {
                    PlayerId::One => &self.p1_actions,
                    PlayerId::Two => &self.p2_actions,
                };
                let sent = tx.send(raw.trim().to_string()).is_ok();
                (Route::Action(action.player), sent)
            }
        };

        if let (route, false) = delivered {
            debug!(route = ?route, "Session stream closed, report discarded");
        }
        Ok(delivered.0)
    }
}

/// Router task body. Ends on shutdown or when the relay stream closes.
pub async fn run_report_router(
    mut reports: UnboundedReceiver<String>,
    routes: ReportRoutes,
    shutdown: Shutdown,
) {
    info!("Report router started");
    loop {
        let raw = tokio::select! {
            _ = shutdown.wait() => break,
            raw = reports.recv() => match raw {
                Some(raw) => raw,
                None => break,
            },
        };

        match routes.route(&raw) {
            Ok(route) => debug!(route = ?route, report = %raw, "Report routed"),
            Err(e) => warn!(report = %raw, error = %e, "Dropping unroutable relay report"),
        }
    }
    info!("Report router stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn routes_by_content() {
        let (p1_tx, mut p1_rx) = mpsc::unbounded_channel();
        let (p2_tx, mut p2_rx) = mpsc::unbounded_channel();
        let (shot_tx, mut shot_rx) = mpsc::unbounded_channel();
        let routes = ReportRoutes::new(p1_tx, p2_tx, shot_tx);

        assert_eq!(routes.route("gun:1").unwrap(), Route::Action(PlayerId::One));
        assert_eq!(routes.route(" basket:2\n").unwrap(), Route::Action(PlayerId::Two));
        assert_eq!(
            routes.route(r#"{"playerID": 2, "isHit": true}"#).unwrap(),
            Route::Shot
        );

        assert_eq!(p1_rx.try_recv().unwrap(), "gun:1");
        assert_eq!(p2_rx.try_recv().unwrap(), "basket:2");
        let stamped = shot_rx.try_recv().unwrap();
        assert_eq!(stamped.report.player_id, PlayerId::Two);
        assert!(stamped.report.is_hit);
    }

    #[test]
    fn unroutable_reports_are_rejected() {
        let (p1_tx, mut p1_rx) = mpsc::unbounded_channel();
        let (p2_tx, mut p2_rx) = mpsc::unbounded_channel();
        let (shot_tx, mut shot_rx) = mpsc::unbounded_channel();
        let routes = ReportRoutes::new(p1_tx, p2_tx, shot_tx);

        assert!(routes.route("HELLO").is_err());
        assert!(routes.route("gun:3").is_err());
        assert!(routes.route(r#"{"playerID": 1}"#).is_err());

        assert!(p1_rx.try_recv().is_err());
        assert!(p2_rx.try_recv().is_err());
        assert!(shot_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn router_task_stops_when_stream_closes() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (p1_tx, mut p1_rx) = mpsc::unbounded_channel();
        let (p2_tx, _p2_rx) = mpsc::unbounded_channel();
        let (shot_tx, _shot_rx) = mpsc::unbounded_channel();
        let (_trigger, shutdown) = crate::util::shutdown::channel();

        tx.send("reload:1".to_string()).unwrap();
        tx.send("garbage".to_string()).unwrap();
        drop(tx);

        run_report_router(rx, ReportRoutes::new(p1_tx, p2_tx, shot_tx), shutdown).await;
        assert_eq!(p1_rx.recv().await.unwrap(), "reload:1");
        assert!(p1_rx.recv().await.is_none());
    }
}
