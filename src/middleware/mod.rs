mod auth;
mod error_handler;
mod rate_limit;

pub use auth::{Actor, auth_middleware, resolve_actor};
pub use error_handler::log_errors;
pub use rate_limit::{RateLimiter, rate_limit};
