use std::collections::HashMap;

use tokio::sync::RwLock;

use arreda_core::domain::client::{Client, ClientId, ClientPatch, ConversationEntry};
use arreda_core::domain::knowledge::{KnowledgeId, KnowledgeItem};

use super::{ClientRepository, KnowledgeRepository, RepositoryError};

/// Keyed by internal id; external-id lookups scan. Test-only scale.
#[derive(Default)]
pub struct InMemoryClientRepository {
    clients: RwLock<HashMap<String, Client>>,
}

#[async_trait::async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn list(&self) -> Result<Vec<Client>, RepositoryError> {
        let clients = self.clients.read().await;
        Ok(clients.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &ClientId) -> Result<Option<Client>, RepositoryError> {
        let clients = self.clients.read().await;
        Ok(clients
            .values()
            .find(|c| c.id == *id || c.id_voiceflow == id.0)
            .cloned())
    }

    async fn find_by_external_id(
        &self,
        id_voiceflow: &str,
    ) -> Result<Option<Client>, RepositoryError> {
        let clients = self.clients.read().await;
        Ok(clients.values().find(|c| c.id_voiceflow == id_voiceflow).cloned())
    }

    async fn insert(&self, client: Client) -> Result<(), RepositoryError> {
        let mut clients = self.clients.write().await;
        if clients.values().any(|c| c.id_voiceflow == client.id_voiceflow) {
            return Err(RepositoryError::DuplicateExternalId(client.id_voiceflow));
        }
        clients.insert(client.id.0.clone(), client);
        Ok(())
    }

    async fn update(&self, client: Client) -> Result<bool, RepositoryError> {
        let mut clients = self.clients.write().await;
        match clients.get_mut(&client.id.0) {
            Some(stored) => {
                *stored = client;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn upsert_by_external_id(
        &self,
        id_voiceflow: &str,
        patch: ClientPatch,
    ) -> Result<Client, RepositoryError> {
        let mut clients = self.clients.write().await;
        let existing_key = clients
            .values()
            .find(|c| c.id_voiceflow == id_voiceflow)
            .map(|c| c.id.0.clone());

        let mut client = match &existing_key {
            Some(key) => clients.get(key).cloned().unwrap_or_else(|| Client::new(id_voiceflow)),
            None => Client::new(id_voiceflow),
        };
        client.apply_patch(&patch);
        clients.insert(client.id.0.clone(), client.clone());
        Ok(client)
    }

    async fn append_conversation(
        &self,
        id_voiceflow: &str,
        entry: ConversationEntry,
    ) -> Result<bool, RepositoryError> {
        let mut clients = self.clients.write().await;
        match clients.values_mut().find(|c| c.id_voiceflow == id_voiceflow) {
            Some(client) => {
                client.append_conversation(entry);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &ClientId) -> Result<bool, RepositoryError> {
        let mut clients = self.clients.write().await;
        Ok(clients.remove(&id.0).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryKnowledgeRepository {
    items: RwLock<HashMap<String, KnowledgeItem>>,
}

impl InMemoryKnowledgeRepository {
    pub async fn with_items(items: Vec<KnowledgeItem>) -> Self {
        let repo = Self::default();
        {
            let mut stored = repo.items.write().await;
            for item in items {
                stored.insert(item.id.0.clone(), item);
            }
        }
        repo
    }
}

#[async_trait::async_trait]
impl KnowledgeRepository for InMemoryKnowledgeRepository {
    async fn list(&self) -> Result<Vec<KnowledgeItem>, RepositoryError> {
        let items = self.items.read().await;
        let mut all: Vec<KnowledgeItem> = items.values().cloned().collect();
        all.sort_by(|a, b| a.nome.cmp(&b.nome));
        Ok(all)
    }

    async fn find_by_id(
        &self,
        id: &KnowledgeId,
    ) -> Result<Option<KnowledgeItem>, RepositoryError> {
        let items = self.items.read().await;
        Ok(items.get(&id.0).cloned())
    }

    async fn insert(&self, item: KnowledgeItem) -> Result<(), RepositoryError> {
        let mut items = self.items.write().await;
        items.insert(item.id.0.clone(), item);
        Ok(())
    }

    async fn update(&self, item: KnowledgeItem) -> Result<bool, RepositoryError> {
        let mut items = self.items.write().await;
        match items.get_mut(&item.id.0) {
            Some(stored) => {
                *stored = item;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &KnowledgeId) -> Result<bool, RepositoryError> {
        let mut items = self.items.write().await;
        Ok(items.remove(&id.0).is_some())
    }
}
