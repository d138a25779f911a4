//! Shared utilities

pub mod rate_limit;
pub mod shutdown;
pub mod time;

pub use shutdown::{Shutdown, ShutdownTrigger};
