mod handler;
pub mod model;

pub use handler::{add, list, remove_event, remove_organizer};
