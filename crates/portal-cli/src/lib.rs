//! Command-line client for the compliance document portal.
//!
//! The binary keeps a session file and a local checklist view-model; everything that
//! touches remote state goes through `portal-api-client`.

pub mod render;
pub mod session;

/// Initialize tracing for the CLI. Logs go to stderr so command output stays clean.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
