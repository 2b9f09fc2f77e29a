use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// Category whose records carry the `categorie` sub-fields.
pub const TIPO_ARREDO: &str = "arredo";
/// Category whose records carry the `finiture` sub-fields.
pub const TIPO_COMPLEMENTO: &str = "complemento d'arredo";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KnowledgeId(pub String);

impl KnowledgeId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categoria {
    pub titolo: String,
    #[serde(default)]
    pub descrizione: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finitura {
    pub titolo: String,
    #[serde(default)]
    pub descrizione: String,
    #[serde(default)]
    pub prezzo: String,
}

/// Knowledge-base record consumed by both the operator UI and the chatbot.
///
/// `prezzo` and `consegna` are deliberately free text: operators enter values
/// like `"100-500€"` or `"45 giorni"` and the search engine parses them as
/// numeric ranges on demand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub id: KnowledgeId,
    pub tipo: String,
    pub nome: String,
    #[serde(default)]
    pub descrizione: Option<String>,
    #[serde(default)]
    pub prezzo: String,
    #[serde(default)]
    pub consegna: String,
    #[serde(default)]
    pub domande: Vec<String>,
    #[serde(default)]
    pub domande_finali: Vec<String>,
    #[serde(default)]
    pub categorie: Vec<Categoria>,
    #[serde(default)]
    pub domande_categorie: Vec<String>,
    #[serde(default)]
    pub finiture: Vec<Finitura>,
    #[serde(default)]
    pub domande_finiture: Vec<String>,
}

impl KnowledgeItem {
    /// Validate the insert contract and enforce the sub-field invariant.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.tipo.trim().is_empty() {
            return Err(DomainError::MissingField("tipo"));
        }
        if self.nome.trim().is_empty() {
            return Err(DomainError::MissingField("nome"));
        }
        match &self.descrizione {
            Some(text) if !text.trim().is_empty() => Ok(()),
            _ => Err(DomainError::MissingField("descrizione")),
        }
    }

    /// Sub-fields only make sense for their owning category; anything else is
    /// stored as empty sequences regardless of what the caller sent.
    pub fn normalize_sub_fields(&mut self) {
        let tipo = self.tipo.to_lowercase();
        if tipo != TIPO_ARREDO {
            self.categorie.clear();
            self.domande_categorie.clear();
        }
        if tipo != TIPO_COMPLEMENTO {
            self.finiture.clear();
            self.domande_finiture.clear();
        }
    }
}
