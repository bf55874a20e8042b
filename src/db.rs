use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::Path;
use tracing::info;

pub type DbPool = SqlitePool;

/// Open (creating if needed) the database file and run migrations
pub async fn initialize_db(db_path: &Path) -> Result<DbPool, Box<dyn std::error::Error>> {
  if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent)?;
  }
  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

  info!(path = %db_path.display(), "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized");

  Ok(pool)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_initialize_db_creates_file_and_schema() {
    let dir = std::env::temp_dir().join(format!("planner-db-{}", uuid::Uuid::new_v4()));
    let path = dir.join("nested").join("planner.db");

    let pool = initialize_db(&path).await.expect("Should initialize database");

    let tables: Vec<(String,)> =
      sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name='kv_store'")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(tables.len(), 1);
    assert!(path.exists());

    pool.close().await;
    let _ = fs::remove_dir_all(dir);
  }
}
