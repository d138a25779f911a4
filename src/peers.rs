//! Stand-in peers so the binary runs end-to-end without the visualizer,
//! controllers, evaluation service or AI pipeline attached.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::game::{PlayerId, VisualizationRecord};
use crate::protocol::{ActionLabel, EvaluationRequest, RelayFeedback};
use crate::util::Shutdown;

/// Confirmation a controller would send for a record, if any.
///
/// Resync records are not actions and get no confirmation.
pub fn confirmation_for(record: &VisualizationRecord) -> Option<String> {
    if record.resync {
        return None;
    }

    let is_action = |label: &ActionLabel| !matches!(label, ActionLabel::None);

    let actor = PlayerId::ALL
        .into_iter()
        .find(|id| is_action(record.action(*id)))
        .unwrap_or(PlayerId::One);
    Some(format!("{}:0:0:{}:0", actor, record.action(actor)))
}

/// Evaluation response that agrees with the request's state
pub fn mirror_response(request: &EvaluationRequest) -> serde_json::Result<String> {
    serde_json::to_string(&request.game_state)
}

/// Run `handle` on each item until the stream closes or shutdown fires
async fn drain<T, F>(mut rx: UnboundedReceiver<T>, shutdown: Shutdown, mut handle: F)
where
    F: FnMut(T),
{
    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            item = rx.recv() => match item {
                Some(item) => handle(item),
                None => break,
            },
        }
    }
}

/// Log visualization records and auto-confirm each action to the session
pub async fn run_visualizer(
    records: UnboundedReceiver<VisualizationRecord>,
    controller: UnboundedSender<String>,
    shutdown: Shutdown,
) {
    drain(records, shutdown, |record| {
        info!(record = %record, "Visualizer");
        if let Some(confirmation) = confirmation_for(&record) {
            debug!(response = %confirmation, "Controller confirming");
            if controller.send(confirmation).is_err() {
                debug!("Controller response stream closed");
            }
        }
    })
    .await;
}

/// Answer every evaluation request with the state it carried
pub async fn run_mirror_evaluator(
    requests: UnboundedReceiver<EvaluationRequest>,
    responses: UnboundedSender<String>,
    shutdown: Shutdown,
) {
    drain(requests, shutdown, |request| {
        debug!(player = %request.player_id, action = %request.action, "Evaluation request");
        match mirror_response(&request) {
            Ok(response) => {
                if responses.send(response).is_err() {
                    debug!("Evaluation response stream closed");
                }
            }
            Err(e) => debug!(error = %e, "Failed to encode evaluation response"),
        }
    })
    .await;
}

/// Log packets destined for the relay clients
pub async fn run_feedback_log(feedback: UnboundedReceiver<RelayFeedback>, shutdown: Shutdown) {
    drain(feedback, shutdown, |packet| {
        match serde_json::to_string(&packet) {
            Ok(json) => info!(packet = %json, "Relay feedback"),
            Err(e) => debug!(error = %e, "Failed to encode relay feedback"),
        }
    })
    .await;
}

/// Log the AI-input copy of every relay message
pub async fn run_ai_input_log(messages: UnboundedReceiver<String>, shutdown: Shutdown) {
    drain(messages, shutdown, |message| {
        debug!(message = %message, "AI input");
    })
    .await;
}
