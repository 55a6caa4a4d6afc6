pub mod config;
pub mod error;
pub mod movie;

pub use config::Config;
pub use error::*;
pub use movie::*;
