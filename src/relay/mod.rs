//! Hardware relay ingestion: framing, the TCP listener, and report routing

pub mod framing;
pub mod router;
pub mod server;

pub use framing::{encode_frame, read_frame, FrameError, FrameRead};
pub use router::{run_report_router, ReportRoutes, Route};
pub use server::{RelayIngestServer, RelayServerConfig, RelaySinks};
