//! Game rules and the session pipeline

pub mod combat;
pub mod hit_window;
pub mod player;
pub mod session;
pub mod snapshot;

pub use hit_window::{HitCorrelationWindow, HitWindowConfig, MismatchPolicy};
pub use player::{InvalidPlayerId, PlayerId, PlayerState};
pub use session::{SessionConfig, SessionHandle, SessionOrchestrator, SessionOutputs};
pub use snapshot::{GameSnapshot, PlayerSnapshot, VisualizationRecord};
