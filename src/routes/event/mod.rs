pub mod filter;
mod handler;
pub mod model;

pub use handler::{
    categories, cities, create, find_by_id, home, list_mine, list_public, search_by_name,
};
