//! Database schema migrations
//!
//! Versioned, idempotent upgrades for databases created by older releases.
//! Every migration checks the current shape before changing it, so running
//! the whole chain twice is harmless.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - users upgrade from any older version
//! 2. **Always add new migrations** - one function per schema change
//! 3. **Use ALTER TABLE** - preserve data, never DROP/CREATE

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Columns added by v1: rubric flags and event context
const V1_COLUMNS: &[(&str, &str)] = &[
    ("bonus_crowd_control", "INTEGER NOT NULL DEFAULT 0"),
    ("bonus_signature_moment", "INTEGER NOT NULL DEFAULT 0"),
    ("bonus_bold_risks", "INTEGER NOT NULL DEFAULT 0"),
    ("penalty_cliche_tracks", "INTEGER NOT NULL DEFAULT 0"),
    ("penalty_overreliance", "INTEGER NOT NULL DEFAULT 0"),
    ("penalty_poor_energy", "INTEGER NOT NULL DEFAULT 0"),
    ("event_venue", "TEXT"),
    ("event_city", "TEXT"),
    ("event_date", "TEXT"),
    ("event_type", "TEXT"),
    ("event_slot", "TEXT"),
    ("set_duration", "TEXT"),
];

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

async fn table_exists(pool: &SqlitePool, table: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name = ?)",
    )
    .bind(table)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

async fn column_exists(pool: &SqlitePool, table: &str, column: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("Migration v2 completed");
    }

    Ok(())
}

// ============================================================================
// v1: rubric flags and event context columns
// ============================================================================

async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    if !table_exists(pool, "performers").await? {
        info!("Migration v1: performers table doesn't exist yet, skipping");
        return Ok(());
    }

    for (column, definition) in V1_COLUMNS {
        if column_exists(pool, "performers", column).await? {
            continue;
        }
        sqlx::query(&format!(
            "ALTER TABLE performers ADD COLUMN {} {}",
            column, definition
        ))
        .execute(pool)
        .await?;
        info!("Migration v1: Added {} to performers table", column);
    }

    Ok(())
}

// ============================================================================
// v2: legacy `guests` criterion becomes `creativity`
// ============================================================================

async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    if !table_exists(pool, "performers").await? {
        return Ok(());
    }

    // An explicit creativity score wins over the legacy key
    let result = sqlx::query(
        r#"
        UPDATE performers
        SET criteria = json_set(
            json_remove(criteria, '$.guests'),
            '$.creativity',
            COALESCE(
                json_extract(criteria, '$.creativity'),
                json_extract(criteria, '$.guests'),
                0
            )
        )
        WHERE json_valid(criteria) AND json_extract(criteria, '$.guests') IS NOT NULL
        "#,
    )
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        info!(
            "Migration v2: Renamed guests -> creativity in {} performer(s)",
            result.rows_affected()
        );
    }

    Ok(())
}
