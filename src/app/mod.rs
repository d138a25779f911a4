//! Task wiring: builds every channel and spawns the long-running services

pub mod state;

pub use state::AppState;

use std::net::SocketAddr;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::Config;
use crate::game::{GameSnapshot, SessionOrchestrator};
use crate::peers;
use crate::relay::{run_report_router, RelayIngestServer, RelaySinks, ReportRoutes};
use crate::util::ShutdownTrigger;

/// Handles to a running arbiter
pub struct Running {
    /// Address the relay listener actually bound
    pub relay_addr: SocketAddr,
    pub app_state: AppState,
    session: JoinHandle<GameSnapshot>,
    services: Vec<JoinHandle<()>>,
}

impl Running {
    /// Wait for every task to finish. Returns the session's final state.
    pub async fn join(self) -> Option<GameSnapshot> {
        for service in self.services {
            if let Err(e) = service.await {
                warn!(error = %e, "Service task failed");
            }
        }
        match self.session.await {
            Ok(last) => Some(last),
            Err(e) => {
                warn!(error = %e, "Session task failed");
                None
            }
        }
    }
}

/// Bind the relay and spawn the session, router and stand-in peers
pub async fn start(config: Config, shutdown: &ShutdownTrigger) -> std::io::Result<Running> {
    let (session, handle, outputs) =
        SessionOrchestrator::new(config.session(), shutdown.subscribe());

    let (ai_tx, ai_rx) = mpsc::unbounded_channel();
    let (engine_tx, engine_rx) = mpsc::unbounded_channel();
    let relay = RelayIngestServer::bind(
        config.relay_addr,
        RelaySinks::new(ai_tx, engine_tx),
        config.relay(),
        shutdown.subscribe(),
    )
    .await?;
    let relay_addr = relay.local_addr()?;

    let services = vec![
        tokio::spawn(relay.run()),
        tokio::spawn(run_report_router(
            engine_rx,
            ReportRoutes::from_handle(&handle),
            shutdown.subscribe(),
        )),
        tokio::spawn(peers::run_visualizer(
            outputs.visualizer,
            handle.controller_responses.clone(),
            shutdown.subscribe(),
        )),
        tokio::spawn(peers::run_mirror_evaluator(
            outputs.evaluation_requests,
            handle.evaluation_responses.clone(),
            shutdown.subscribe(),
        )),
        tokio::spawn(peers::run_feedback_log(outputs.relay_feedback, shutdown.subscribe())),
        tokio::spawn(peers::run_ai_input_log(ai_rx, shutdown.subscribe())),
    ];
    let session = tokio::spawn(session.run());

    info!(relay_addr = %relay_addr, "Arbiter started");

    Ok(Running {
        relay_addr,
        app_state: AppState::new(config, handle.state.clone()),
        session,
        services,
    })
}
