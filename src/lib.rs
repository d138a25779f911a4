//! Laser-tag session arbiter.
//!
//! Ingests hardware relay traffic, runs the serialized two-player turn
//! pipeline, and reconciles local state against an external evaluation
//! service.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod peers;
pub mod protocol;
pub mod relay;
pub mod util;
