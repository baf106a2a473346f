//! Shared API request/response types
//!
//! Used by the server handlers and by clients decoding server responses.

use serde::{Deserialize, Serialize};

use crate::performer::Performer;
use crate::scoring::Score;
use crate::tier::Tier;

// ========================================
// Generic Responses
// ========================================

/// Error body for every non-success response
///
/// # Examples
///
/// ```
/// use djrank_common::api::types::ErrorResponse;
///
/// let body = serde_json::to_string(&ErrorResponse::new("DJ not found")).unwrap();
/// assert_eq!(body, r#"{"error":"DJ not found"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Body of a successful delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub backend: String,
}

// ========================================
// Scoring
// ========================================

/// Score breakdown for one performer
#[derive(Debug, Clone, Serialize)]
pub struct ScoreResponse {
    pub id: String,
    pub name: String,
    pub score: Score,
    pub suggested_tier: Tier,
    /// Tier currently assigned (`null` = queue)
    pub tier: Option<Tier>,
}

impl From<&Performer> for ScoreResponse {
    fn from(performer: &Performer) -> Self {
        let score = performer.score();
        Self {
            id: performer.id.clone(),
            name: performer.name.clone(),
            suggested_tier: score.tier(),
            score,
            tier: performer.tier,
        }
    }
}
