use std::time::Duration;

use anyhow::Context;
use sqlx::{
    pool::PoolConnection,
    sqlite::{SqlitePool, SqlitePoolOptions},
    Sqlite,
};

/// Open the pool backing the meal catalog.
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .with_context(|| format!("connect to database {}", database_url))
}

pub async fn migrate(db: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    Ok(())
}

/// Scoped connection for one unit of work. Goes back to the pool when dropped,
/// on the error path as well.
pub async fn acquire(db: &SqlitePool) -> Result<PoolConnection<Sqlite>, sqlx::Error> {
    db.acquire().await
}

/// In-memory database with the real schema. Single connection, never recycled,
/// since every `:memory:` connection is its own database.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory sqlite");
    migrate(&db).await.expect("migrations apply");
    db
}
