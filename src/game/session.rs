//! Session orchestrator - the serialized turn pipeline.
//!
//! Each action runs to completion before the next is looked at:
//! resolve locally, publish to the visualizer, wait for the controller's
//! confirmation, apply confirmed AI/rain-bomb effects, round-trip the state
//! through the evaluation service, reconcile, and push status to the relay.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::protocol::controller::salvage_label;
use crate::protocol::evaluation::parse_evaluation_response;
use crate::protocol::{
    Action, ActionKind, ActionLabel, ControllerResponse, EvaluationError, EvaluationRequest,
    RelayFeedback, StampedShotReport,
};
use crate::util::time::{CONTROLLER_TIMEOUT_MS, EVALUATION_TIMEOUT_MS};
use crate::util::Shutdown;

use super::combat::DamageKind;
use super::hit_window::{HitCorrelationWindow, HitWindowConfig};
use super::snapshot::{GameSnapshot, VisualizationRecord};
use super::{PlayerId, PlayerState};

/// Session timing configuration
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub controller_timeout: Duration,
    pub evaluation_timeout: Duration,
    pub hit_window: HitWindowConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            controller_timeout: Duration::from_millis(CONTROLLER_TIMEOUT_MS),
            evaluation_timeout: Duration::from_millis(EVALUATION_TIMEOUT_MS),
            hit_window: HitWindowConfig::default(),
        }
    }
}

/// Senders feeding a running session, plus a view of its latest state
#[derive(Clone)]
pub struct SessionHandle {
    pub p1_actions: UnboundedSender<String>,
    pub p2_actions: UnboundedSender<String>,
    pub shot_reports: UnboundedSender<StampedShotReport>,
    pub controller_responses: UnboundedSender<String>,
    pub evaluation_responses: UnboundedSender<String>,
    pub state: watch::Receiver<GameSnapshot>,
}

impl SessionHandle {
    /// Action stream of one player
    pub fn actions(&self, id: PlayerId) -> &UnboundedSender<String> {
        match id {
            PlayerId::One => &self.p1_actions,
            PlayerId::Two => &self.p2_actions,
        }
    }
}

/// Everything the session publishes
pub struct SessionOutputs {
    pub visualizer: UnboundedReceiver<VisualizationRecord>,
    pub evaluation_requests: UnboundedReceiver<EvaluationRequest>,
    pub relay_feedback: UnboundedReceiver<RelayFeedback>,
}

struct Inputs {
    p1_actions: UnboundedReceiver<String>,
    p2_actions: UnboundedReceiver<String>,
    controller_responses: UnboundedReceiver<String>,
    evaluation_responses: UnboundedReceiver<String>,
}

struct Outputs {
    visualizer: UnboundedSender<VisualizationRecord>,
    evaluation_requests: UnboundedSender<EvaluationRequest>,
    relay_feedback: UnboundedSender<RelayFeedback>,
    state: watch::Sender<GameSnapshot>,
}

/// Per-slot labels resolved during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TickLabels {
    p1: ActionLabel,
    p2: ActionLabel,
}

impl TickLabels {
    fn both(label: ActionLabel) -> Self {
        Self { p1: label, p2: label }
    }

    fn only(id: PlayerId, label: ActionLabel) -> Self {
        let mut labels = Self::default();
        match id {
            PlayerId::One => labels.p1 = label,
            PlayerId::Two => labels.p2 = label,
        }
        labels
    }

    fn get(&self, id: PlayerId) -> ActionLabel {
        match id {
            PlayerId::One => self.p1,
            PlayerId::Two => self.p2,
        }
    }
}

/// Result of a bounded wait on a response channel
enum Wait<T> {
    Ready(T),
    TimedOut,
    Closed,
    Shutdown,
}

async fn wait_for<T>(
    rx: &mut UnboundedReceiver<T>,
    limit: Duration,
    shutdown: &Shutdown,
) -> Wait<T> {
    tokio::select! {
        _ = shutdown.wait() => Wait::Shutdown,
        res = tokio::time::timeout(limit, rx.recv()) => match res {
            Ok(Some(value)) => Wait::Ready(value),
            Ok(None) => Wait::Closed,
            Err(_) => Wait::TimedOut,
        },
    }
}

/// The orchestrator task. Owns both players exclusively.
pub struct SessionOrchestrator {
    players: [PlayerState; 2],
    hit_window: HitCorrelationWindow,
    inputs: Inputs,
    outputs: Outputs,
    config: SessionConfig,
    shutdown: Shutdown,
    ticks: u64,
}

impl SessionOrchestrator {
    /// Create a session with fresh players
    pub fn new(config: SessionConfig, shutdown: Shutdown) -> (Self, SessionHandle, SessionOutputs) {
        let (p1_tx, p1_rx) = mpsc::unbounded_channel();
        let (p2_tx, p2_rx) = mpsc::unbounded_channel();
        let (shot_tx, shot_rx) = mpsc::unbounded_channel();
        let (controller_tx, controller_rx) = mpsc::unbounded_channel();
        let (eval_resp_tx, eval_resp_rx) = mpsc::unbounded_channel();
        let (viz_tx, viz_rx) = mpsc::unbounded_channel();
        let (eval_req_tx, eval_req_rx) = mpsc::unbounded_channel();
        let (feedback_tx, feedback_rx) = mpsc::unbounded_channel();

        let players = [PlayerState::new(PlayerId::One), PlayerState::new(PlayerId::Two)];
        let (state_tx, state_rx) = watch::channel(GameSnapshot {
            p1: players[0].snapshot(),
            p2: players[1].snapshot(),
        });

        let session = Self {
            players,
            hit_window: HitCorrelationWindow::new(shot_rx, config.hit_window),
            inputs: Inputs {
                p1_actions: p1_rx,
                p2_actions: p2_rx,
                controller_responses: controller_rx,
                evaluation_responses: eval_resp_rx,
            },
            outputs: Outputs {
                visualizer: viz_tx,
                evaluation_requests: eval_req_tx,
                relay_feedback: feedback_tx,
                state: state_tx,
            },
            config,
            shutdown,
            ticks: 0,
        };

        let handle = SessionHandle {
            p1_actions: p1_tx,
            p2_actions: p2_tx,
            shot_reports: shot_tx,
            controller_responses: controller_tx,
            evaluation_responses: eval_resp_tx,
            state: state_rx,
        };

        let outputs = SessionOutputs {
            visualizer: viz_rx,
            evaluation_requests: eval_req_rx,
            relay_feedback: feedback_rx,
        };

        (session, handle, outputs)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            p1: self.player(PlayerId::One).snapshot(),
            p2: self.player(PlayerId::Two).snapshot(),
        }
    }

    pub fn player(&self, id: PlayerId) -> &PlayerState {
        &self.players[id.index()]
    }

    fn player_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        &mut self.players[id.index()]
    }

    /// Run until shutdown or until both action streams close. Returns the final state.
    pub async fn run(mut self) -> GameSnapshot {
        info!(
            hit_window_ms = self.config.hit_window.window.as_millis() as u64,
            policy = ?self.config.hit_window.policy,
            "Session orchestrator started"
        );

        'session: loop {
            if self.shutdown.is_triggered() {
                break;
            }

            // Both streams are checked every pass; player 1 first.
            let mut serviced = false;
            for id in PlayerId::ALL {
                if let Some(raw) = self.try_next_action(id) {
                    serviced = true;
                    if self.run_tick(id, raw).await.is_break() {
                        break 'session;
                    }
                }
            }
            if serviced {
                continue;
            }

            let next = tokio::select! {
                biased;
                _ = self.shutdown.wait() => None,
                Some(raw) = self.inputs.p1_actions.recv() => Some((PlayerId::One, raw)),
                Some(raw) = self.inputs.p2_actions.recv() => Some((PlayerId::Two, raw)),
                else => {
                    info!("All action streams closed");
                    None
                }
            };

            let Some((id, raw)) = next else {
                break;
            };
            if self.run_tick(id, raw).await.is_break() {
                break;
            }
        }

        info!(ticks = self.ticks, "Session orchestrator stopped");
        self.snapshot()
    }

    fn try_next_action(&mut self, id: PlayerId) -> Option<String> {
        let rx = match id {
            PlayerId::One => &mut self.inputs.p1_actions,
            PlayerId::Two => &mut self.inputs.p2_actions,
        };
        rx.try_recv().ok()
    }

    /// One full pipeline pass. Breaks only on shutdown.
    async fn run_tick(&mut self, source: PlayerId, raw: String) -> ControlFlow<()> {
        debug!(stream = %source, action = %raw, "Action dequeued");

        let action = match Action::parse(&raw) {
            Ok(action) => action,
            Err(e) => {
                warn!(stream = %source, action = %raw, error = %e, "Discarding malformed action");
                return ControlFlow::Continue(());
            }
        };
        if action.player != source {
            warn!(
                stream = %source,
                player = %action.player,
                "Action arrived on the other player's stream"
            );
        }
        let actor = action.player;

        let labels = self.resolve_action(&action).await;
        self.publish_visualization(VisualizationRecord::new(self.snapshot(), labels.p1, labels.p2));

        let tick_label = labels.get(actor);
        let previous_action = match wait_for(
            &mut self.inputs.controller_responses,
            self.config.controller_timeout,
            &self.shutdown,
        )
        .await
        {
            Wait::Ready(response) => self.apply_controller_response(actor, &response, tick_label),
            Wait::TimedOut => {
                warn!(
                    player = %actor,
                    timeout_ms = self.config.controller_timeout.as_millis() as u64,
                    "No controller response, continuing unconfirmed"
                );
                tick_label.to_string()
            }
            Wait::Closed => {
                warn!(player = %actor, "Controller response channel closed");
                tick_label.to_string()
            }
            Wait::Shutdown => return ControlFlow::Break(()),
        };

        let request = EvaluationRequest {
            player_id: actor,
            action: previous_action,
            game_state: self.snapshot(),
        };
        let outcome = if self.outputs.evaluation_requests.send(request).is_err() {
            Err(EvaluationError::Closed)
        } else {
            match wait_for(
                &mut self.inputs.evaluation_responses,
                self.config.evaluation_timeout,
                &self.shutdown,
            )
            .await
            {
                Wait::Ready(response) => parse_evaluation_response(&response),
                Wait::TimedOut => Err(EvaluationError::Timeout(self.config.evaluation_timeout)),
                Wait::Closed => Err(EvaluationError::Closed),
                Wait::Shutdown => return ControlFlow::Break(()),
            }
        };
        self.reconcile(outcome);

        self.publish_status();
        self.ticks += 1;
        self.outputs.state.send_replace(self.snapshot());
        ControlFlow::Continue(())
    }

    /// Apply the local effect of an action and label both slots
    async fn resolve_action(&mut self, action: &Action) -> TickLabels {
        let actor = action.player;
        let label = match &action.kind {
            ActionKind::Gun => {
                if self.player_mut(actor).shoot() {
                    self.correlate_shot(actor).await;
                    ActionLabel::Gun
                } else {
                    ActionLabel::GunFail
                }
            }
            ActionKind::Reload => {
                pick(self.player_mut(actor).reload(), ActionLabel::Reload, ActionLabel::ReloadFail)
            }
            ActionKind::Bomb => {
                pick(self.player_mut(actor).use_bomb(), ActionLabel::Bomb, ActionLabel::BombFail)
            }
            ActionKind::Activity(activity) => ActionLabel::Activity(*activity),
            ActionKind::AiDamage => {
                self.damage(actor, DamageKind::Ai);
                ActionLabel::AiDamage
            }
            ActionKind::BulletDamage => {
                self.damage(actor, DamageKind::Bullet);
                ActionLabel::BulletDamage
            }
            ActionKind::RainBombDamage => {
                self.damage(actor, DamageKind::Bomb);
                ActionLabel::RainBombDamage
            }
            ActionKind::Shield => pick(
                self.player_mut(actor).charge_shield(),
                ActionLabel::Shield,
                ActionLabel::ShieldFail,
            ),
            ActionKind::UpdateUi => {
                debug!("UI refresh requested for both players");
                return TickLabels::both(ActionLabel::UpdateUi);
            }
            ActionKind::Unknown(kind) => {
                warn!(player = %actor, kind = %kind, "Ignoring unknown action type");
                return TickLabels::default();
            }
        };

        info!(player = %actor, label = %label, "Action resolved");
        TickLabels::only(actor, label)
    }

    async fn correlate_shot(&mut self, shooter: PlayerId) {
        let target = shooter.opponent();
        if self.hit_window.await_hit(shooter).await {
            info!(shooter = %shooter, target = %target, "Shot hit");
            self.damage(target, DamageKind::Bullet);
            self.send_feedback(RelayFeedback::hit(target));
        } else {
            info!(shooter = %shooter, target = %target, "Shot missed");
        }
    }

    /// Apply confirmed effects and return the label to report for evaluation
    fn apply_controller_response(
        &mut self,
        actor: PlayerId,
        raw: &str,
        tick_label: ActionLabel,
    ) -> String {
        let response = match ControllerResponse::parse(raw) {
            Ok(response) => response.normalized(),
            Err(e) => {
                warn!(player = %actor, response = %raw, error = %e, "Malformed controller response");
                return salvage_label(raw).unwrap_or_else(|| tick_label.to_string());
            }
        };

        if response.player != actor {
            warn!(
                acting = %actor,
                responding = %response.player,
                "Controller response from the other player"
            );
        }

        let target = response.player.opponent();
        if response.is_ai_action {
            if response.is_hit {
                let kind = if response.previous_action == "bomb" {
                    DamageKind::Bomb
                } else {
                    DamageKind::Ai
                };
                info!(
                    player = %response.player,
                    target = %target,
                    action = %response.previous_action,
                    "AI action hit"
                );
                self.damage(target, kind);
            } else {
                info!(player = %response.player, action = %response.previous_action, "AI action missed");
            }
        }

        if response.rain_bomb_hits > 0 {
            info!(
                player = %response.player,
                target = %target,
                hits = response.rain_bomb_hits,
                "Rain bomb hits confirmed"
            );
            for _ in 0..response.rain_bomb_hits {
                self.damage(target, DamageKind::Bomb);
            }
        }

        response.previous_action
    }

    /// Adopt the evaluation service's snapshot when it disagrees with ours
    fn reconcile(&mut self, outcome: Result<GameSnapshot, EvaluationError>) {
        match outcome {
            Ok(authoritative) => {
                let Some(diff) = self.snapshot().first_difference(&authoritative) else {
                    debug!("Local state matches evaluation");
                    return;
                };
                info!(
                    player = %diff.player,
                    field = diff.field,
                    local = diff.local,
                    authoritative = diff.authoritative,
                    "State diverged from evaluation, reconciling"
                );
                for id in PlayerId::ALL {
                    self.player_mut(id).overwrite(authoritative.player(id));
                }
                self.publish_visualization(VisualizationRecord::update_ui(self.snapshot()));
            }
            Err(e @ (EvaluationError::Malformed(_) | EvaluationError::OutOfRange { .. })) => {
                error!(error = %e, "Rejected evaluation response, holding local state");
                self.publish_visualization(VisualizationRecord::update_ui(self.snapshot()));
            }
            Err(e) => {
                warn!(error = %e, "Evaluation unavailable, holding local state");
            }
        }
    }

    fn damage(&mut self, id: PlayerId, kind: DamageKind) {
        if self.player_mut(id).apply_damage(kind) {
            info!(player = %id, cause = ?kind, "Player killed");
        }
    }

    fn publish_visualization(&self, record: VisualizationRecord) {
        debug!(record = %record, "Publishing visualization record");
        if self.outputs.visualizer.send(record).is_err() {
            debug!("Visualizer channel closed");
        }
    }

    fn publish_status(&self) {
        for id in PlayerId::ALL {
            let player = self.player(id);
            self.send_feedback(RelayFeedback::StatusUpdate {
                id,
                hp: player.hp(),
                bullets: player.bullets(),
            });
        }
    }

    fn send_feedback(&self, packet: RelayFeedback) {
        if self.outputs.relay_feedback.send(packet).is_err() {
            debug!("Relay feedback channel closed");
        }
    }
}

fn pick(succeeded: bool, success: ActionLabel, failure: ActionLabel) -> ActionLabel {
    if succeeded {
        success
    } else {
        failure
    }
}
