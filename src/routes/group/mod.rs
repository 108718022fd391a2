mod handler;
pub mod model;

pub use handler::{join, list_for_guest, list_for_organizer};
