//! Performer records
//!
//! `Performer` is the persisted record, `NewPerformer` the create payload and
//! `PerformerPatch` the partial update. All three share the flat wire shape
//! used by the HTTP API:
//!
//! ```json
//! {
//!   "id": "1730000000000", "name": "...", "bio": null, "image": null,
//!   "soundcloud_url": null, "spotify_url": null, "apple_music_url": null,
//!   "tier": "A",
//!   "criteria": { "flow": 3, "vibes": 3, "visuals": 2, "creativity": 3 },
//!   "bonus_crowd_control": true, "penalty_poor_energy": false, ...,
//!   "notes": null, "photos": [], "videos": [],
//!   "event_venue": null, "event_date": "2024-12-31", ...,
//!   "created_at": "...", "updated_at": "..."
//! }
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::rubric::{coerce_flag, Bonuses, Criteria, Penalties, Rubric};
use crate::scoring::Score;
use crate::tier::{Bucket, Tier};
use crate::{Error, Result};

/// Treat an explicit `null` list as empty
fn deserialize_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Distinguish "field present" from "field absent" for nullable patch fields
fn deserialize_some<'de, T, D>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Present rubric flag, coerced like the create path (`null` counts as false)
fn deserialize_flag_some<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(Some(coerce_flag(&value)))
}

/// External profile links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLinks {
    pub soundcloud_url: Option<String>,
    pub spotify_url: Option<String>,
    pub apple_music_url: Option<String>,
}

/// Optional context of the event where the set was seen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventContext {
    #[serde(rename = "event_venue")]
    pub venue: Option<String>,
    #[serde(rename = "event_city")]
    pub city: Option<String>,
    #[serde(rename = "event_date")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "event_type")]
    pub kind: Option<String>,
    #[serde(rename = "event_slot")]
    pub slot: Option<String>,
    pub set_duration: Option<String>,
}

/// Persisted performer record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(flatten)]
    pub links: SocialLinks,
    #[serde(default)]
    pub tier: Option<Tier>,
    #[serde(flatten)]
    pub rubric: Rubric,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub photos: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_list")]
    pub videos: Vec<String>,
    #[serde(flatten)]
    pub event: EventContext,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Performer {
    /// Materialize a create payload into a record
    pub fn from_new(new: NewPerformer, id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            bio: new.bio,
            image: new.image,
            links: new.links,
            tier: new.tier,
            rubric: new.rubric,
            notes: new.notes,
            photos: new.photos,
            videos: new.videos,
            event: new.event,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bucket this record places the performer in
    pub fn bucket(&self) -> Bucket {
        Bucket::from(self.tier)
    }

    pub fn score(&self) -> Score {
        self.rubric.score()
    }

    /// Tier the scoring engine suggests for the current rubric
    pub fn suggested_tier(&self) -> Tier {
        self.rubric.suggested_tier()
    }
}

/// Create payload
///
/// `id` is optional: the store derives one when absent. Tier defaults to
/// `None` (queue) and the rubric to all zeros.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewPerformer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    #[serde(flatten)]
    pub links: SocialLinks,
    pub tier: Option<Tier>,
    #[serde(flatten)]
    pub rubric: Rubric,
    pub notes: Option<String>,
    #[serde(deserialize_with = "deserialize_list")]
    pub photos: Vec<String>,
    #[serde(deserialize_with = "deserialize_list")]
    pub videos: Vec<String>,
    #[serde(flatten)]
    pub event: EventContext,
}

impl NewPerformer {
    /// Manual entry with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_tier(mut self, tier: Option<Tier>) -> Self {
        self.tier = tier;
        self
    }

    /// Reject payloads the store cannot accept
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("Performer name is required".to_string()));
        }
        Ok(())
    }
}

/// Partial update
///
/// Absent fields are left unchanged. Nullable fields are tri-state: absent,
/// `null` (clear) or a value. For `tier`, `null` moves the performer back to
/// the queue. The record id is never patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub bio: Option<Option<String>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub image: Option<Option<String>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub soundcloud_url: Option<Option<String>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub spotify_url: Option<Option<String>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub apple_music_url: Option<Option<String>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub tier: Option<Option<Tier>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Criteria>,
    #[serde(deserialize_with = "deserialize_flag_some", skip_serializing_if = "Option::is_none")]
    pub bonus_crowd_control: Option<bool>,
    #[serde(deserialize_with = "deserialize_flag_some", skip_serializing_if = "Option::is_none")]
    pub bonus_signature_moment: Option<bool>,
    #[serde(deserialize_with = "deserialize_flag_some", skip_serializing_if = "Option::is_none")]
    pub bonus_bold_risks: Option<bool>,
    #[serde(deserialize_with = "deserialize_flag_some", skip_serializing_if = "Option::is_none")]
    pub penalty_cliche_tracks: Option<bool>,
    #[serde(deserialize_with = "deserialize_flag_some", skip_serializing_if = "Option::is_none")]
    pub penalty_overreliance: Option<bool>,
    #[serde(deserialize_with = "deserialize_flag_some", skip_serializing_if = "Option::is_none")]
    pub penalty_poor_energy: Option<bool>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub photos: Option<Option<Vec<String>>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub videos: Option<Option<Vec<String>>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub event_venue: Option<Option<String>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub event_city: Option<Option<String>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub event_date: Option<Option<NaiveDate>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<Option<String>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub event_slot: Option<Option<String>>,
    #[serde(deserialize_with = "deserialize_some", skip_serializing_if = "Option::is_none")]
    pub set_duration: Option<Option<String>>,
}

impl PerformerPatch {
    /// Single-field tier update (`None` = back to queue)
    pub fn tier(tier: Option<Tier>) -> Self {
        Self {
            tier: Some(tier),
            ..Self::default()
        }
    }

    pub fn notes(notes: Option<String>) -> Self {
        Self {
            notes: Some(notes),
            ..Self::default()
        }
    }

    /// Replace the whole rubric (criteria and all six flags)
    pub fn rubric(rubric: &Rubric) -> Self {
        let Rubric {
            criteria,
            bonuses,
            penalties,
        } = *rubric;
        Self {
            criteria: Some(criteria),
            bonus_crowd_control: Some(bonuses.crowd_control),
            bonus_signature_moment: Some(bonuses.signature_moment),
            bonus_bold_risks: Some(bonuses.bold_risks),
            penalty_cliche_tracks: Some(penalties.cliche_tracks),
            penalty_overreliance: Some(penalties.overreliance),
            penalty_poor_energy: Some(penalties.poor_energy),
            ..Self::default()
        }
    }

    pub fn photos(photos: Vec<String>) -> Self {
        Self {
            photos: Some(Some(photos)),
            ..Self::default()
        }
    }

    pub fn videos(videos: Vec<String>) -> Self {
        Self {
            videos: Some(Some(videos)),
            ..Self::default()
        }
    }

    /// True when the patch would change nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reject patches the store cannot apply
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::InvalidInput("No fields to update".to_string()));
        }
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::InvalidInput("Performer name cannot be empty".to_string()));
            }
        }
        Ok(())
    }

    /// Apply the patch in place and stamp `updated_at`
    pub fn apply_to(&self, performer: &mut Performer, now: DateTime<Utc>) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        set(&mut performer.name, &self.name);
        set(&mut performer.bio, &self.bio);
        set(&mut performer.image, &self.image);
        set(&mut performer.links.soundcloud_url, &self.soundcloud_url);
        set(&mut performer.links.spotify_url, &self.spotify_url);
        set(&mut performer.links.apple_music_url, &self.apple_music_url);
        set(&mut performer.tier, &self.tier);
        set(&mut performer.rubric.criteria, &self.criteria);

        let Bonuses {
            crowd_control,
            signature_moment,
            bold_risks,
        } = &mut performer.rubric.bonuses;
        set(crowd_control, &self.bonus_crowd_control);
        set(signature_moment, &self.bonus_signature_moment);
        set(bold_risks, &self.bonus_bold_risks);

        let Penalties {
            cliche_tracks,
            overreliance,
            poor_energy,
        } = &mut performer.rubric.penalties;
        set(cliche_tracks, &self.penalty_cliche_tracks);
        set(overreliance, &self.penalty_overreliance);
        set(poor_energy, &self.penalty_poor_energy);

        set(&mut performer.notes, &self.notes);
        if let Some(photos) = &self.photos {
            performer.photos = photos.clone().unwrap_or_default();
        }
        if let Some(videos) = &self.videos {
            performer.videos = videos.clone().unwrap_or_default();
        }

        set(&mut performer.event.venue, &self.event_venue);
        set(&mut performer.event.city, &self.event_city);
        set(&mut performer.event.date, &self.event_date);
        set(&mut performer.event.kind, &self.event_type);
        set(&mut performer.event.slot, &self.event_slot);
        set(&mut performer.event.set_duration, &self.set_duration);

        performer.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Performer {
        let now = crate::time::now();
        Performer::from_new(NewPerformer::named("Demo DJ 1"), "demo-1".to_string(), now)
    }

    #[test]
    fn test_new_performer_defaults_to_queue_and_zero_rubric() {
        let performer = sample();
        assert_eq!(performer.tier, None);
        assert_eq!(performer.bucket(), Bucket::Queue);
        assert_eq!(performer.rubric, Rubric::default());
        assert!(performer.photos.is_empty());
        assert_eq!(performer.created_at, performer.updated_at);
    }

    #[test]
    fn test_new_performer_requires_name() {
        assert!(NewPerformer::named("  ").validate().is_err());
        assert!(NewPerformer::named("Solomun").validate().is_ok());
    }

    #[test]
    fn test_record_wire_shape_is_flat() {
        let mut performer = sample();
        performer.tier = Some(Tier::B);
        performer.rubric.bonuses.crowd_control = true;
        performer.event.kind = Some("festival".to_string());

        let value = serde_json::to_value(&performer).unwrap();
        assert_eq!(value["tier"], json!("B"));
        assert_eq!(value["criteria"]["flow"], json!(0));
        assert_eq!(value["bonus_crowd_control"], json!(true));
        assert_eq!(value["event_type"], json!("festival"));
        assert_eq!(value["soundcloud_url"], json!(null));

        let back: Performer = serde_json::from_value(value).unwrap();
        assert_eq!(back, performer);
    }

    #[test]
    fn test_record_tolerates_null_lists_and_legacy_criteria() {
        let performer: Performer = serde_json::from_value(json!({
            "id": "42",
            "name": "Legacy",
            "tier": null,
            "criteria": { "flow": 2, "vibes": 1, "visuals": 0, "guests": 3 },
            "photos": null,
            "created_at": "2024-12-31T00:00:00Z",
            "updated_at": "2024-12-31T00:00:00Z"
        }))
        .unwrap();

        assert!(performer.photos.is_empty());
        assert!(performer.videos.is_empty());
        assert_eq!(performer.rubric.criteria.creativity, 3);
        assert_eq!(performer.score().core, 6);
    }

    #[test]
    fn test_patch_tier_is_tri_state() {
        let absent: PerformerPatch = serde_json::from_value(json!({ "notes": "x" })).unwrap();
        assert_eq!(absent.tier, None);

        let cleared: PerformerPatch = serde_json::from_value(json!({ "tier": null })).unwrap();
        assert_eq!(cleared.tier, Some(None));
        assert!(!cleared.is_empty());

        let set: PerformerPatch = serde_json::from_value(json!({ "tier": "S" })).unwrap();
        assert_eq!(set.tier, Some(Some(Tier::S)));

        // Serialization keeps the distinction
        assert_eq!(serde_json::to_value(&cleared).unwrap(), json!({ "tier": null }));
        assert_eq!(serde_json::to_value(PerformerPatch::default()).unwrap(), json!({}));
    }

    #[test]
    fn test_patch_flags_are_coerced() {
        let patch: PerformerPatch = serde_json::from_value(json!({
            "bonus_crowd_control": 1,
            "bonus_bold_risks": "true",
            "penalty_poor_energy": null,
            "penalty_overreliance": 0
        }))
        .unwrap();

        assert_eq!(patch.bonus_crowd_control, Some(true));
        assert_eq!(patch.bonus_bold_risks, Some(true));
        assert_eq!(patch.penalty_poor_energy, Some(false));
        assert_eq!(patch.penalty_overreliance, Some(false));
        assert_eq!(patch.bonus_signature_moment, None);
    }

    #[test]
    fn test_empty_patch_rejected() {
        let err = PerformerPatch::default().validate().unwrap_err();
        assert!(err.to_string().contains("No fields to update"));
    }

    #[test]
    fn test_patch_ignores_id_field() {
        let patch: PerformerPatch = serde_json::from_value(json!({ "id": "other" })).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_apply_patch_updates_only_present_fields() {
        let mut performer = sample();
        performer.notes = Some("keep?".to_string());
        performer.bio = Some("bio".to_string());
        let later = performer.updated_at + chrono::Duration::seconds(5);

        let patch: PerformerPatch = serde_json::from_value(json!({
            "tier": "A",
            "bio": null,
            "criteria": { "flow": 9 },
            "bonus_bold_risks": true,
            "photos": ["a.jpg"],
            "event_date": "2024-12-31"
        }))
        .unwrap();
        patch.apply_to(&mut performer, later);

        assert_eq!(performer.tier, Some(Tier::A));
        assert_eq!(performer.bio, None);
        assert_eq!(performer.notes.as_deref(), Some("keep?"));
        assert_eq!(performer.rubric.criteria.flow, 3);
        assert!(performer.rubric.bonuses.bold_risks);
        assert_eq!(performer.photos, vec!["a.jpg".to_string()]);
        assert_eq!(performer.event.date, NaiveDate::from_ymd_opt(2024, 12, 31));
        assert_eq!(performer.updated_at, later);
    }

    #[test]
    fn test_rubric_patch_sets_every_flag() {
        let rubric = Rubric {
            criteria: Criteria::new(1, 2, 3, 1),
            bonuses: Bonuses { crowd_control: true, ..Bonuses::default() },
            penalties: Penalties { poor_energy: true, ..Penalties::default() },
        };
        let mut performer = sample();
        performer.rubric.bonuses.bold_risks = true;
        PerformerPatch::rubric(&rubric).apply_to(&mut performer, crate::time::now());
        assert_eq!(performer.rubric, rubric);
    }
}
