pub mod client;
pub mod knowledge;
