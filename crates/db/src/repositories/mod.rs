use async_trait::async_trait;
use thiserror::Error;

use arreda_core::domain::client::{Client, ClientId, ClientPatch, ConversationEntry};
use arreda_core::domain::knowledge::{KnowledgeId, KnowledgeItem};

pub mod client;
pub mod knowledge;
pub mod memory;

pub use client::SqlClientRepository;
pub use knowledge::SqlKnowledgeRepository;
pub use memory::{InMemoryClientRepository, InMemoryKnowledgeRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("external identifier already registered: {0}")]
    DuplicateExternalId(String),
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Client>, RepositoryError>;

    /// Lookup by internal id, falling back to the external identifier; the
    /// operator UI passes either interchangeably.
    async fn find_by_id(&self, id: &ClientId) -> Result<Option<Client>, RepositoryError>;

    async fn find_by_external_id(
        &self,
        id_voiceflow: &str,
    ) -> Result<Option<Client>, RepositoryError>;

    /// Insert a new client. Fails with `DuplicateExternalId` when the
    /// external identifier is already registered; no partial write occurs.
    async fn insert(&self, client: Client) -> Result<(), RepositoryError>;

    async fn update(&self, client: Client) -> Result<bool, RepositoryError>;

    /// Create-or-update keyed on the external identifier, applying the
    /// patch's field-preserving semantics. Returns the stored record.
    async fn upsert_by_external_id(
        &self,
        id_voiceflow: &str,
        patch: ClientPatch,
    ) -> Result<Client, RepositoryError>;

    /// Append one conversation entry. Returns `false` when no client with
    /// that external identifier exists.
    async fn append_conversation(
        &self,
        id_voiceflow: &str,
        entry: ConversationEntry,
    ) -> Result<bool, RepositoryError>;

    async fn delete(&self, id: &ClientId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait KnowledgeRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<KnowledgeItem>, RepositoryError>;
    async fn find_by_id(&self, id: &KnowledgeId) -> Result<Option<KnowledgeItem>, RepositoryError>;
    async fn insert(&self, item: KnowledgeItem) -> Result<(), RepositoryError>;
    async fn update(&self, item: KnowledgeItem) -> Result<bool, RepositoryError>;
    async fn delete(&self, id: &KnowledgeId) -> Result<bool, RepositoryError>;
}
