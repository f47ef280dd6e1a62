//! Constants shared across the portal crates.

/// Message returned for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Message returned when an account form is missing a field.
pub const ALL_FIELDS_REQUIRED_MESSAGE: &str = "All fields are required.";

/// Default lifetime of a signed download URL.
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 60 * 60;

/// API prefix for versioned routes.
pub const API_PREFIX: &str = "/api/v1";
