pub mod chatbot;
pub mod config;
pub mod domain;
pub mod errors;
pub mod search;

pub use chatbot::encode::{encode, join_blocks, FieldValue};
pub use chatbot::sanitize::{is_empty_or_zero, sanitize};
pub use domain::client::{BotReply, Client, ClientId, ClientPatch, ConversationEntry};
pub use domain::knowledge::{Categoria, Finitura, KnowledgeId, KnowledgeItem};
pub use errors::DomainError;
pub use search::filter::{search, SearchCriteria};
pub use search::range::{parse_range, IntRange};
