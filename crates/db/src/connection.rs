use std::str::FromStr;
use std::time::Duration;

use casevalue_core::config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub type DbPool = sqlx::SqlitePool;

pub async fn connect_with_config(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&config.url, config.max_connections, config.timeout_secs).await
}

/// Opens a pool, creating the database file when it does not exist yet.
pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect_with(options)
        .await
}

#[cfg(test)]
mod tests {
    use casevalue_core::config::DatabaseConfig;
    use tempfile::TempDir;

    use super::connect_with_config;

    #[tokio::test]
    async fn connecting_creates_a_missing_database_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("fresh.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections: 1,
            timeout_secs: 5,
        };

        let pool = connect_with_config(&config).await.expect("connect");
        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await.expect("query");

        assert_eq!(one, 1);
        assert!(path.exists());
    }
}
