pub mod encode;
pub mod sanitize;
pub mod tags;
