//! SQLite gateway backend

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::{debug, warn};

use super::Gateway;
use crate::performer::{EventContext, NewPerformer, Performer, PerformerPatch, SocialLinks};
use crate::rubric::{Bonuses, Criteria, Penalties, Rubric};
use crate::tier::Tier;
use crate::{ids, time, Error, Result};

const COLUMNS: &str = "id, name, bio, image, soundcloud_url, spotify_url, apple_music_url, \
    tier, criteria, notes, photos, videos, \
    bonus_crowd_control, bonus_signature_moment, bonus_bold_risks, \
    penalty_cliche_tracks, penalty_overreliance, penalty_poor_energy, \
    event_venue, event_city, event_date, event_type, event_slot, set_duration, \
    created_at, updated_at";

#[derive(Debug, Clone)]
pub struct SqliteGateway {
    pool: SqlitePool,
}

impl SqliteGateway {
    /// Wrap a pool whose schema is already initialized
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

/// Decode a JSON list column; bad data reads as an empty list
fn decode_list(raw: Option<String>, id: &str, column: &str) -> Vec<String> {
    match raw {
        None => Vec::new(),
        Some(text) => serde_json::from_str::<Option<Vec<String>>>(&text)
            .unwrap_or_else(|e| {
                warn!(id, column, "Unreadable JSON list, treating as empty: {}", e);
                None
            })
            .unwrap_or_default(),
    }
}

fn decode_tier(raw: Option<String>, id: &str) -> Option<Tier> {
    let raw = raw.filter(|s| !s.trim().is_empty())?;
    match raw.parse() {
        Ok(tier) => Some(tier),
        Err(e) => {
            warn!(id, "Unknown stored tier {:?}, treating as queue: {}", raw, e);
            None
        }
    }
}

fn performer_from_row(row: &SqliteRow) -> Result<Performer> {
    let id: String = row.try_get("id")?;

    let criteria = match row.try_get::<Option<String>, _>("criteria")? {
        Some(text) => {
            let value: serde_json::Value = serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(id = %id, "Unreadable criteria JSON, treating as zero: {}", e);
                serde_json::Value::Null
            });
            Criteria::from_json(&value)
        }
        None => Criteria::default(),
    };

    let rubric = Rubric {
        criteria,
        bonuses: Bonuses {
            crowd_control: row.try_get("bonus_crowd_control")?,
            signature_moment: row.try_get("bonus_signature_moment")?,
            bold_risks: row.try_get("bonus_bold_risks")?,
        },
        penalties: Penalties {
            cliche_tracks: row.try_get("penalty_cliche_tracks")?,
            overreliance: row.try_get("penalty_overreliance")?,
            poor_energy: row.try_get("penalty_poor_energy")?,
        },
    };

    let tier = decode_tier(row.try_get("tier")?, &id);
    let photos = decode_list(row.try_get("photos")?, &id, "photos");
    let videos = decode_list(row.try_get("videos")?, &id, "videos");

    Ok(Performer {
        name: row.try_get("name")?,
        bio: row.try_get("bio")?,
        image: row.try_get("image")?,
        links: SocialLinks {
            soundcloud_url: row.try_get("soundcloud_url")?,
            spotify_url: row.try_get("spotify_url")?,
            apple_music_url: row.try_get("apple_music_url")?,
        },
        tier,
        rubric,
        notes: row.try_get("notes")?,
        photos,
        videos,
        event: EventContext {
            venue: row.try_get("event_venue")?,
            city: row.try_get("event_city")?,
            date: row.try_get::<Option<NaiveDate>, _>("event_date")?,
            kind: row.try_get("event_type")?,
            slot: row.try_get("event_slot")?,
            set_duration: row.try_get("set_duration")?,
        },
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        id,
    })
}

#[async_trait]
impl Gateway for SqliteGateway {
    async fn list(&self) -> Result<Vec<Performer>> {
        // rowid breaks ties between records created in the same instant
        let rows = sqlx::query(&format!(
            "SELECT {} FROM performers ORDER BY created_at DESC, rowid DESC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(performer_from_row).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Performer>> {
        let row = sqlx::query(&format!("SELECT {} FROM performers WHERE id = ?", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(performer_from_row).transpose()
    }

    async fn create(&self, new: NewPerformer) -> Result<Performer> {
        new.validate()?;

        let id = ids::normalize(new.id.as_deref()).unwrap_or_else(ids::generate);
        let now = time::now();
        let criteria = serde_json::to_string(&new.rubric.criteria)?;
        let photos = serde_json::to_string(&new.photos)?;
        let videos = serde_json::to_string(&new.videos)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO performers ({})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            COLUMNS, COLUMNS
        ))
        .bind(&id)
        .bind(&new.name)
        .bind(&new.bio)
        .bind(&new.image)
        .bind(&new.links.soundcloud_url)
        .bind(&new.links.spotify_url)
        .bind(&new.links.apple_music_url)
        .bind(new.tier.map(|t| t.as_str()))
        .bind(criteria)
        .bind(&new.notes)
        .bind(photos)
        .bind(videos)
        .bind(new.rubric.bonuses.crowd_control)
        .bind(new.rubric.bonuses.signature_moment)
        .bind(new.rubric.bonuses.bold_risks)
        .bind(new.rubric.penalties.cliche_tracks)
        .bind(new.rubric.penalties.overreliance)
        .bind(new.rubric.penalties.poor_energy)
        .bind(&new.event.venue)
        .bind(&new.event.city)
        .bind(new.event.date)
        .bind(&new.event.kind)
        .bind(&new.event.slot)
        .bind(&new.event.set_duration)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Conflict(format!("Performer {} already exists", id))
            } else {
                Error::Database(e)
            }
        })?;

        debug!(id = %id, "sqlite gateway: created");
        performer_from_row(&row)
    }

    async fn update(&self, id: &str, patch: PerformerPatch) -> Result<Option<Performer>> {
        patch.validate()?;

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE performers SET ");
        let mut set = builder.separated(", ");

        macro_rules! assign {
            ($column:literal, $value:expr) => {
                if let Some(value) = $value {
                    set.push(concat!($column, " = "));
                    set.push_bind_unseparated(value);
                }
            };
        }

        assign!("name", patch.name.clone());
        assign!("bio", patch.bio.clone());
        assign!("image", patch.image.clone());
        assign!("soundcloud_url", patch.soundcloud_url.clone());
        assign!("spotify_url", patch.spotify_url.clone());
        assign!("apple_music_url", patch.apple_music_url.clone());
        assign!("tier", patch.tier.map(|t| t.map(|t| t.as_str())));
        if let Some(criteria) = &patch.criteria {
            set.push("criteria = ");
            set.push_bind_unseparated(serde_json::to_string(criteria)?);
        }
        assign!("bonus_crowd_control", patch.bonus_crowd_control);
        assign!("bonus_signature_moment", patch.bonus_signature_moment);
        assign!("bonus_bold_risks", patch.bonus_bold_risks);
        assign!("penalty_cliche_tracks", patch.penalty_cliche_tracks);
        assign!("penalty_overreliance", patch.penalty_overreliance);
        assign!("penalty_poor_energy", patch.penalty_poor_energy);
        assign!("notes", patch.notes.clone());
        if let Some(photos) = &patch.photos {
            set.push("photos = ");
            set.push_bind_unseparated(serde_json::to_string(&photos.clone().unwrap_or_default())?);
        }
        if let Some(videos) = &patch.videos {
            set.push("videos = ");
            set.push_bind_unseparated(serde_json::to_string(&videos.clone().unwrap_or_default())?);
        }
        assign!("event_venue", patch.event_venue.clone());
        assign!("event_city", patch.event_city.clone());
        assign!("event_date", patch.event_date);
        assign!("event_type", patch.event_type.clone());
        assign!("event_slot", patch.event_slot.clone());
        assign!("set_duration", patch.set_duration.clone());
        set.push("updated_at = ");
        set.push_bind_unseparated(time::now());

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING ");
        builder.push(COLUMNS);

        let row = builder.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(performer_from_row).transpose()
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM performers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
