mod handler;
pub mod model;

pub use handler::{login, profile, register};
