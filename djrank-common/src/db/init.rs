//! Database initialization
//!
//! Creates the database file on first run, applies connection pragmas and
//! brings the schema up to date.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Busy timeout applied to every pooled connection
pub const BUSY_TIMEOUT_MS: u32 = 5000;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .min_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    // WAL lets list requests read while a write is in flight
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query(&format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS))
        .execute(&pool)
        .await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create all tables and run pending migrations on an open pool
///
/// Idempotent; also used by tests that bring their own pool.
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_performers_table(pool).await?;

    // Legacy tables predate the rubric flags and event columns
    crate::db::migrations::run_migrations(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the performers table
///
/// `criteria`, `photos` and `videos` hold JSON text.
async fn create_performers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS performers (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            bio TEXT,
            image TEXT,
            soundcloud_url TEXT,
            spotify_url TEXT,
            apple_music_url TEXT,
            tier TEXT CHECK (tier IS NULL OR tier IN ('S', 'A', 'B', 'C', 'D', 'E', 'F')),
            criteria TEXT NOT NULL DEFAULT '{"flow":0,"vibes":0,"visuals":0,"creativity":0}',
            notes TEXT,
            photos TEXT NOT NULL DEFAULT '[]',
            videos TEXT NOT NULL DEFAULT '[]',
            bonus_crowd_control INTEGER NOT NULL DEFAULT 0,
            bonus_signature_moment INTEGER NOT NULL DEFAULT 0,
            bonus_bold_risks INTEGER NOT NULL DEFAULT 0,
            penalty_cliche_tracks INTEGER NOT NULL DEFAULT 0,
            penalty_overreliance INTEGER NOT NULL DEFAULT 0,
            penalty_poor_energy INTEGER NOT NULL DEFAULT 0,
            event_venue TEXT,
            event_city TEXT,
            event_date TEXT,
            event_type TEXT,
            event_slot TEXT,
            set_duration TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_performers_created_at ON performers(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_creates_file_and_tables() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("djrank.db");

        let pool = init_database(&db_path).await.unwrap();
        assert!(db_path.exists());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM performers")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);

        let journal: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(journal.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("djrank.db");

        let pool = init_database(&db_path).await.unwrap();
        sqlx::query("INSERT INTO performers (id, name) VALUES ('1', 'Keep me')")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;

        let pool = init_database(&db_path).await.unwrap();
        let name: String = sqlx::query_scalar("SELECT name FROM performers WHERE id = '1'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(name, "Keep me");
    }

    #[tokio::test]
    async fn test_tier_check_constraint() {
        let dir = tempfile::tempdir().unwrap();
        let pool = init_database(&dir.path().join("djrank.db")).await.unwrap();

        let result = sqlx::query("INSERT INTO performers (id, name, tier) VALUES ('1', 'x', 'G')")
            .execute(&pool)
            .await;
        assert!(result.is_err());
    }
}
