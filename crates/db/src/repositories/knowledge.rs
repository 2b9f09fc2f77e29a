use async_trait::async_trait;
use sqlx::Row;

use arreda_core::domain::knowledge::{Categoria, Finitura, KnowledgeId, KnowledgeItem};

use super::{KnowledgeRepository, RepositoryError};
use crate::DbPool;

pub struct SqlKnowledgeRepository {
    pool: DbPool,
}

impl SqlKnowledgeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const KNOWLEDGE_COLUMNS: &str = "id, tipo, nome, descrizione, prezzo, consegna, domande, \
     domande_finali, categorie, domande_categorie, finiture, domande_finiture";

fn json_column<T: serde::de::DeserializeOwned>(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<T, RepositoryError> {
    let raw: String =
        row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn to_json<T: serde::Serialize>(column: &str, value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<KnowledgeItem, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tipo: String = row.try_get("tipo").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let nome: String = row.try_get("nome").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let descrizione: Option<String> =
        row.try_get("descrizione").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let prezzo: String =
        row.try_get("prezzo").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let consegna: String =
        row.try_get("consegna").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let domande: Vec<String> = json_column(row, "domande")?;
    let domande_finali: Vec<String> = json_column(row, "domande_finali")?;
    let categorie: Vec<Categoria> = json_column(row, "categorie")?;
    let domande_categorie: Vec<String> = json_column(row, "domande_categorie")?;
    let finiture: Vec<Finitura> = json_column(row, "finiture")?;
    let domande_finiture: Vec<String> = json_column(row, "domande_finiture")?;

    Ok(KnowledgeItem {
        id: KnowledgeId(id),
        tipo,
        nome,
        descrizione,
        prezzo,
        consegna,
        domande,
        domande_finali,
        categorie,
        domande_categorie,
        finiture,
        domande_finiture,
    })
}

#[async_trait]
impl KnowledgeRepository for SqlKnowledgeRepository {
    async fn list(&self) -> Result<Vec<KnowledgeItem>, RepositoryError> {
        let rows =
            sqlx::query(&format!("SELECT {KNOWLEDGE_COLUMNS} FROM knowledge ORDER BY nome"))
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(row_to_item).collect()
    }

    async fn find_by_id(
        &self,
        id: &KnowledgeId,
    ) -> Result<Option<KnowledgeItem>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {KNOWLEDGE_COLUMNS} FROM knowledge WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn insert(&self, item: KnowledgeItem) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO knowledge
                (id, tipo, nome, descrizione, prezzo, consegna, domande, domande_finali,
                 categorie, domande_categorie, finiture, domande_finiture)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&item.id.0)
        .bind(&item.tipo)
        .bind(&item.nome)
        .bind(&item.descrizione)
        .bind(&item.prezzo)
        .bind(&item.consegna)
        .bind(to_json("domande", &item.domande)?)
        .bind(to_json("domande_finali", &item.domande_finali)?)
        .bind(to_json("categorie", &item.categorie)?)
        .bind(to_json("domande_categorie", &item.domande_categorie)?)
        .bind(to_json("finiture", &item.finiture)?)
        .bind(to_json("domande_finiture", &item.domande_finiture)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, item: KnowledgeItem) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE knowledge
             SET tipo = ?, nome = ?, descrizione = ?, prezzo = ?, consegna = ?, domande = ?,
                 domande_finali = ?, categorie = ?, domande_categorie = ?, finiture = ?,
                 domande_finiture = ?
             WHERE id = ?",
        )
        .bind(&item.tipo)
        .bind(&item.nome)
        .bind(&item.descrizione)
        .bind(&item.prezzo)
        .bind(&item.consegna)
        .bind(to_json("domande", &item.domande)?)
        .bind(to_json("domande_finali", &item.domande_finali)?)
        .bind(to_json("categorie", &item.categorie)?)
        .bind(to_json("domande_categorie", &item.domande_categorie)?)
        .bind(to_json("finiture", &item.finiture)?)
        .bind(to_json("domande_finiture", &item.domande_finiture)?)
        .bind(&item.id.0)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &KnowledgeId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM knowledge WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
