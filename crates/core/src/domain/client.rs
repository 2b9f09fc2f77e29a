use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// A bot turn in the conversation log. The agent platform sends either a
/// single message or an ordered batch, so the JSON shape is untagged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BotReply {
    Single(String),
    Many(Vec<String>),
}

impl BotReply {
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Single(text) => vec![text.clone()],
            Self::Many(texts) => texts.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub data: DateTime<Utc>,
    pub user: String,
    pub bot: BotReply,
}

/// CRM client record. `id_voiceflow` is the agent platform's stable
/// identifier and must be unique across all clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub id_voiceflow: String,
    pub nome: Option<String>,
    pub numero: Option<String>,
    pub summary: Option<String>,
    pub data_modifica: DateTime<Utc>,
    pub conversazioni: Vec<ConversationEntry>,
}

/// Partial update coming from the agent platform. The upsert policy is
/// field-preserving: an empty or zero-equivalent incoming value leaves the
/// stored field as it was.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientPatch {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub numero: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl Client {
    /// Fresh record for a first contact: only the external identifier is
    /// known, everything else starts empty.
    pub fn new(id_voiceflow: impl Into<String>) -> Self {
        Self {
            id: ClientId::generate(),
            id_voiceflow: id_voiceflow.into(),
            nome: None,
            numero: None,
            summary: None,
            data_modifica: Utc::now(),
            conversazioni: Vec::new(),
        }
    }

    /// Append a conversation turn. The log is append-only; entries are never
    /// mutated or removed.
    pub fn append_conversation(&mut self, entry: ConversationEntry) {
        self.conversazioni.push(entry);
    }

    /// Apply a partial update and refresh `data_modifica`. Empty incoming
    /// values are skipped per the upsert policy.
    pub fn apply_patch(&mut self, patch: &ClientPatch) {
        if !crate::chatbot::sanitize::is_empty_or_zero(patch.nome.as_deref()) {
            self.nome = patch.nome.clone();
        }
        if !crate::chatbot::sanitize::is_empty_or_zero(patch.numero.as_deref()) {
            self.numero = patch.numero.clone();
        }
        if !crate::chatbot::sanitize::is_empty_or_zero(patch.summary.as_deref()) {
            self.summary = patch.summary.clone();
        }
        self.data_modifica = Utc::now();
    }
}
