//! Portal API Library
//!
//! HTTP surface of the compliance document portal: handlers, session guards and
//! application setup.

pub mod api_doc;
pub mod auth;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod utils;

// Re-exports
pub use error::ErrorResponse;
pub use state::AppState;
