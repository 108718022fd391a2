mod handler;
pub mod model;

pub use handler::{participate, participation_status};
