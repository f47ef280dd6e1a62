//! Tracing initialization
//!
//! The server and the CLI share one subscriber setup so log output looks the same
//! wherever the portal runs.

mod init_basic;

pub use init_basic::{init_telemetry, LogFormat, DEFAULT_FILTER};
