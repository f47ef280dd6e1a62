//! Portal Infrastructure Library
//!
//! Shared infrastructure used by the portal server and CLI:
//! - Middleware (request ID, security headers)
//! - Tracing initialization

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "middleware")]
pub use middleware::{
    get_request_id, request_id_middleware, security_headers_middleware, RequestId,
    SecurityHeaders,
};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, LogFormat, DEFAULT_FILTER};
