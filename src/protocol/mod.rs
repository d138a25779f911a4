//! Wire records exchanged with the relay, controllers, evaluation service and visualizer.
//! Every string mini-protocol is parsed once here into a typed structure.

pub mod action;
pub mod controller;
pub mod evaluation;
pub mod hardware;

pub use action::{Action, ActionKind, ActionLabel, ActionParseError, Activity};
pub use controller::{ControllerResponse, ControllerResponseError};
pub use evaluation::{EvaluationError, EvaluationRequest};
pub use hardware::{HardwareReport, RelayFeedback, ShotReport, StampedShotReport};
