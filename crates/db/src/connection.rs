//! Shared SQLite pool. The operator API and the chatbot API write to the
//! same database file, so every connection runs in WAL mode (readers never
//! block the single writer) and carries a busy timeout sized from the
//! configured acquire timeout.

use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

pub type DbPool = sqlx::SqlitePool;

const MAX_BUSY_TIMEOUT_MS: u128 = 30_000;

pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    let acquire_timeout = Duration::from_secs(timeout_secs.max(1));
    let busy_timeout_ms = acquire_timeout.as_millis().min(MAX_BUSY_TIMEOUT_MS);

    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(acquire_timeout)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA synchronous = NORMAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query(&format!("PRAGMA busy_timeout = {busy_timeout_ms}"))
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::connect_with_settings;

    #[tokio::test]
    async fn connections_enforce_foreign_keys() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");

        let row = sqlx::query("PRAGMA foreign_keys").fetch_one(&pool).await.expect("pragma");
        assert_eq!(row.get::<i64, _>(0), 1);

        pool.close().await;
    }

    #[tokio::test]
    async fn busy_timeout_follows_the_acquire_timeout() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");

        let row = sqlx::query("PRAGMA busy_timeout").fetch_one(&pool).await.expect("pragma");
        assert_eq!(row.get::<i64, _>(0), 5_000);

        pool.close().await;
    }
}
