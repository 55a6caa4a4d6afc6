//! HTTP route handlers.

pub mod bulk;
pub mod common;
pub mod health;
pub mod movies;

pub use bulk::{movies_bulk_create, movies_queue_clear, movies_queue_status};
pub use health::health;
pub use movies::{
    movies_create, movies_delete, movies_get, movies_list, movies_search, movies_sorted,
    movies_update,
};
