//! Authentication: signed session tokens, the route guards that check them and the
//! login failure limiter.

pub mod limiter;
pub mod middleware;
pub mod models;
pub mod session;

pub use limiter::AuthFailureLimiter;
pub use models::{AdminContext, CompanyContext, SessionClaims, SessionRole};
pub use session::{IssuedSession, SessionKeys};
