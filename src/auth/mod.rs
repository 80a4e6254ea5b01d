//! Authentication: token issuance, the login endpoint, and the bearer gate.

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::JwtHandler;
pub use middleware::{require_auth, AuthError};
pub use models::AuthUser;
