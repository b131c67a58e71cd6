use anyhow::Result;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// The schema, embedded at compile time. Applied versions are recorded in
/// `_sqlx_migrations`, so running it again is a no-op.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Creates a PostgreSQL connection pool and brings the schema up to date.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    MIGRATOR.run(&pool).await?;

    info!("PostgreSQL connection pool established, migrations applied");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::testing::database;

    #[test]
    fn test_schema_is_embedded() {
        let versions: Vec<i64> = MIGRATOR.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![1]);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let Some(pool) = database().await else {
            return;
        };
        // `database()` already applied them once.
        MIGRATOR.run(&pool).await.unwrap();
        let applied: i64 = sqlx::query_scalar("SELECT count(*) FROM _sqlx_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(applied, 1);
    }
}
