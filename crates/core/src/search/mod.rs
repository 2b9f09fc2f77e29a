pub mod filter;
pub mod range;

pub use filter::{search, SearchCriteria};
pub use range::{parse_range, IntRange};
