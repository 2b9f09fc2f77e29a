use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use arreda_core::domain::client::{Client, ClientId, ClientPatch, ConversationEntry};

use super::{ClientRepository, RepositoryError};
use crate::DbPool;

pub struct SqlClientRepository {
    pool: DbPool,
}

impl SqlClientRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const CLIENT_COLUMNS: &str =
    "id, id_voiceflow, nome, numero, summary, data_modifica, conversazioni";

fn row_to_client(row: &sqlx::sqlite::SqliteRow) -> Result<Client, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let id_voiceflow: String =
        row.try_get("id_voiceflow").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let nome: Option<String> =
        row.try_get("nome").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let numero: Option<String> =
        row.try_get("numero").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let summary: Option<String> =
        row.try_get("summary").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let data_modifica_str: String =
        row.try_get("data_modifica").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let conversazioni_str: String =
        row.try_get("conversazioni").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let data_modifica = DateTime::parse_from_rfc3339(&data_modifica_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("data_modifica: {e}")))?;

    let conversazioni: Vec<ConversationEntry> = serde_json::from_str(&conversazioni_str)
        .map_err(|e| RepositoryError::Decode(format!("conversazioni: {e}")))?;

    Ok(Client {
        id: ClientId(id),
        id_voiceflow,
        nome,
        numero,
        summary,
        data_modifica,
        conversazioni,
    })
}

fn conversazioni_json(entries: &[ConversationEntry]) -> Result<String, RepositoryError> {
    serde_json::to_string(entries)
        .map_err(|e| RepositoryError::Decode(format!("conversazioni: {e}")))
}

#[async_trait]
impl ClientRepository for SqlClientRepository {
    async fn list(&self) -> Result<Vec<Client>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY data_modifica DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_client).collect()
    }

    async fn find_by_id(&self, id: &ClientId) -> Result<Option<Client>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ? OR id_voiceflow = ?"
        ))
        .bind(&id.0)
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_client).transpose()
    }

    async fn find_by_external_id(
        &self,
        id_voiceflow: &str,
    ) -> Result<Option<Client>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id_voiceflow = ?"
        ))
        .bind(id_voiceflow)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_client).transpose()
    }

    async fn insert(&self, client: Client) -> Result<(), RepositoryError> {
        let conversazioni = conversazioni_json(&client.conversazioni)?;
        let result = sqlx::query(
            "INSERT INTO clients
                (id, id_voiceflow, nome, numero, summary, data_modifica, conversazioni)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&client.id.0)
        .bind(&client.id_voiceflow)
        .bind(&client.nome)
        .bind(&client.numero)
        .bind(&client.summary)
        .bind(client.data_modifica.to_rfc3339())
        .bind(&conversazioni)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) => {
                let unique = error
                    .as_database_error()
                    .is_some_and(|db_error| db_error.is_unique_violation());
                if unique {
                    Err(RepositoryError::DuplicateExternalId(client.id_voiceflow))
                } else {
                    Err(RepositoryError::Database(error))
                }
            }
        }
    }

    async fn update(&self, client: Client) -> Result<bool, RepositoryError> {
        let conversazioni = conversazioni_json(&client.conversazioni)?;
        let result = sqlx::query(
            "UPDATE clients
             SET nome = ?, numero = ?, summary = ?, data_modifica = ?, conversazioni = ?
             WHERE id = ?",
        )
        .bind(&client.nome)
        .bind(&client.numero)
        .bind(&client.summary)
        .bind(client.data_modifica.to_rfc3339())
        .bind(&conversazioni)
        .bind(&client.id.0)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert_by_external_id(
        &self,
        id_voiceflow: &str,
        patch: ClientPatch,
    ) -> Result<Client, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id_voiceflow = ?"
        ))
        .bind(id_voiceflow)
        .fetch_optional(&mut *tx)
        .await?;

        let mut client = match row.as_ref().map(row_to_client).transpose()? {
            Some(existing) => existing,
            None => Client::new(id_voiceflow),
        };
        let is_new = row.is_none();
        client.apply_patch(&patch);

        let conversazioni = conversazioni_json(&client.conversazioni)?;
        if is_new {
            sqlx::query(
                "INSERT INTO clients
                    (id, id_voiceflow, nome, numero, summary, data_modifica, conversazioni)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&client.id.0)
            .bind(&client.id_voiceflow)
            .bind(&client.nome)
            .bind(&client.numero)
            .bind(&client.summary)
            .bind(client.data_modifica.to_rfc3339())
            .bind(&conversazioni)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                "UPDATE clients
                 SET nome = ?, numero = ?, summary = ?, data_modifica = ?
                 WHERE id_voiceflow = ?",
            )
            .bind(&client.nome)
            .bind(&client.numero)
            .bind(&client.summary)
            .bind(client.data_modifica.to_rfc3339())
            .bind(id_voiceflow)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(client)
    }

    async fn append_conversation(
        &self,
        id_voiceflow: &str,
        entry: ConversationEntry,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT conversazioni FROM clients WHERE id_voiceflow = ?")
            .bind(id_voiceflow)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            return Ok(false);
        };

        let existing: String =
            row.try_get("conversazioni").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let mut entries: Vec<ConversationEntry> = serde_json::from_str(&existing)
            .map_err(|e| RepositoryError::Decode(format!("conversazioni: {e}")))?;
        entries.push(entry);

        sqlx::query(
            "UPDATE clients SET conversazioni = ?, data_modifica = ? WHERE id_voiceflow = ?",
        )
        .bind(conversazioni_json(&entries)?)
        .bind(Utc::now().to_rfc3339())
        .bind(id_voiceflow)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn delete(&self, id: &ClientId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use arreda_core::domain::client::{BotReply, Client, ClientPatch, ConversationEntry};

    use super::SqlClientRepository;
    use crate::repositories::{ClientRepository, RepositoryError};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlClientRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlClientRepository::new(pool)
    }

    fn entry(user: &str) -> ConversationEntry {
        ConversationEntry {
            data: Utc::now(),
            user: user.to_string(),
            bot: BotReply::Many(vec!["ciao".to_string(), "come posso aiutarti?".to_string()]),
        }
    }

    #[tokio::test]
    async fn insert_and_find_round_trip() {
        let repo = setup().await;
        let mut client = Client::new("vf-1");
        client.nome = Some("Mario".to_string());
        client.append_conversation(entry("buongiorno"));

        repo.insert(client.clone()).await.expect("insert");

        let found =
            repo.find_by_external_id("vf-1").await.expect("find").expect("client exists");
        assert_eq!(found.id, client.id);
        assert_eq!(found.nome.as_deref(), Some("Mario"));
        assert_eq!(found.conversazioni.len(), 1);
    }

    #[tokio::test]
    async fn find_by_id_also_matches_external_identifier() {
        let repo = setup().await;
        let client = Client::new("vf-1");
        repo.insert(client.clone()).await.expect("insert");

        let by_internal = repo
            .find_by_id(&client.id)
            .await
            .expect("find by internal")
            .expect("internal id matches");
        assert_eq!(by_internal.id_voiceflow, "vf-1");

        let by_external = repo
            .find_by_id(&arreda_core::domain::client::ClientId("vf-1".to_string()))
            .await
            .expect("find by external")
            .expect("external id matches");
        assert_eq!(by_external.id, client.id);
    }

    #[tokio::test]
    async fn duplicate_external_id_is_rejected_without_partial_write() {
        let repo = setup().await;
        let mut first = Client::new("vf-1");
        first.nome = Some("Mario".to_string());
        repo.insert(first.clone()).await.expect("insert first");

        let second = Client::new("vf-1");
        let error = repo.insert(second).await.expect_err("duplicate should fail");
        assert!(matches!(error, RepositoryError::DuplicateExternalId(id) if id == "vf-1"));

        let stored =
            repo.find_by_external_id("vf-1").await.expect("find").expect("still there");
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.nome.as_deref(), Some("Mario"));
    }

    #[tokio::test]
    async fn upsert_creates_then_preserves_fields_on_empty_patch() {
        let repo = setup().await;

        let patch = ClientPatch {
            nome: Some("Mario".to_string()),
            numero: Some("3331234567".to_string()),
            summary: None,
        };
        let created = repo.upsert_by_external_id("vf-1", patch.clone()).await.expect("create");
        assert_eq!(created.nome.as_deref(), Some("Mario"));

        let updated = repo
            .upsert_by_external_id(
                "vf-1",
                ClientPatch {
                    nome: Some("".to_string()),
                    numero: None,
                    summary: Some("Cerca un tavolo".to_string()),
                },
            )
            .await
            .expect("update");

        assert_eq!(updated.id, created.id, "no duplicate record for the same external id");
        assert_eq!(updated.nome.as_deref(), Some("Mario"));
        assert_eq!(updated.numero.as_deref(), Some("3331234567"));
        assert_eq!(updated.summary.as_deref(), Some("Cerca un tavolo"));

        let all = repo.list().await.expect("list");
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn upsert_twice_with_identical_fields_is_idempotent() {
        let repo = setup().await;
        let patch = ClientPatch {
            nome: Some("Mario".to_string()),
            numero: Some("3331234567".to_string()),
            summary: Some("Interessato a sedie".to_string()),
        };

        let first = repo.upsert_by_external_id("vf-1", patch.clone()).await.expect("first");
        let second = repo.upsert_by_external_id("vf-1", patch).await.expect("second");

        assert_eq!(first.id, second.id);
        assert_eq!(first.nome, second.nome);
        assert_eq!(first.numero, second.numero);
        assert_eq!(first.summary, second.summary);
        assert_eq!(repo.list().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn conversation_append_is_monotonic() {
        let repo = setup().await;
        repo.insert(Client::new("vf-1")).await.expect("insert");

        for i in 0..3 {
            let appended = repo
                .append_conversation("vf-1", entry(&format!("messaggio {i}")))
                .await
                .expect("append");
            assert!(appended);
        }

        let stored =
            repo.find_by_external_id("vf-1").await.expect("find").expect("client exists");
        assert_eq!(stored.conversazioni.len(), 3);
        assert_eq!(stored.conversazioni[0].user, "messaggio 0");
        assert_eq!(stored.conversazioni[2].user, "messaggio 2");
    }

    #[tokio::test]
    async fn append_to_unknown_client_reports_not_found() {
        let repo = setup().await;
        let appended =
            repo.append_conversation("vf-missing", entry("ciao")).await.expect("append");
        assert!(!appended);
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let repo = setup().await;
        let client = Client::new("vf-1");
        repo.insert(client.clone()).await.expect("insert");

        assert!(repo.delete(&client.id).await.expect("delete"));
        assert!(!repo.delete(&client.id).await.expect("second delete"));
        assert!(repo.find_by_external_id("vf-1").await.expect("find").is_none());
    }
}
