mod connection;
pub mod migrations;
pub mod repositories;
pub mod seed;

pub use connection::{connect_with_settings, DbPool};
