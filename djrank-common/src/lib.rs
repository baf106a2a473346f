//! # DJ Rank Common Library
//!
//! Shared code for the DJ Rank server and CLI client including:
//! - Performer records, rubric and tier types
//! - Scoring engine (rubric → score → tier)
//! - Placement state machine (queue/tier buckets, board session, drag gestures)
//! - Gateway trait with SQLite, in-memory and HTTP backends
//! - Database initialization and migrations
//! - Admin credential checks and failed-attempt rate limiting
//! - Event types, EventBus and SSE helpers
//! - Configuration loading

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod gateway;
pub mod ids;
pub mod performer;
pub mod placement;
pub mod rubric;
pub mod scoring;
pub mod search;
pub mod sse;
pub mod tier;
pub mod time;

pub use error::{Error, Result};
pub use gateway::Gateway;
pub use performer::{NewPerformer, Performer, PerformerPatch};
pub use placement::{Board, Capability};
pub use rubric::{Bonuses, Criteria, Penalties, Rubric};
pub use scoring::{compute_score, tier_for_score, Score};
pub use tier::{Bucket, Tier};
