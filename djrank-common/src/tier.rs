//! Tier labels and placement buckets
//!
//! Tiers are ordered from most to least exclusive: `S, A, B, C, D, E, F`.
//! A performer with no tier sits in the unranked queue.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Tier label
///
/// Accepts labels in either case on input, like [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Tier {
    S,
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Tier {
    /// All tiers, most exclusive first
    pub const ALL: [Tier; 7] = [Tier::S, Tier::A, Tier::B, Tier::C, Tier::D, Tier::E, Tier::F];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::S => "S",
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
            Tier::D => "D",
            Tier::E => "E",
            Tier::F => "F",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S" => Ok(Tier::S),
            "A" => Ok(Tier::A),
            "B" => Ok(Tier::B),
            "C" => Ok(Tier::C),
            "D" => Ok(Tier::D),
            "E" => Ok(Tier::E),
            "F" => Ok(Tier::F),
            other => Err(Error::InvalidInput(format!("Unknown tier: {}", other))),
        }
    }
}

impl TryFrom<String> for Tier {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Placement bucket: the unranked queue or one tier
///
/// Serialized as `"queue"` or the tier label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Bucket {
    Queue,
    Tier(Tier),
}

impl Bucket {
    /// The tier this bucket stands for (`None` for the queue)
    pub fn tier(&self) -> Option<Tier> {
        match self {
            Bucket::Queue => None,
            Bucket::Tier(tier) => Some(*tier),
        }
    }

    /// Queue first, then tiers most exclusive first
    pub fn all() -> impl Iterator<Item = Bucket> {
        std::iter::once(Bucket::Queue).chain(Tier::ALL.into_iter().map(Bucket::Tier))
    }
}

impl From<Option<Tier>> for Bucket {
    fn from(tier: Option<Tier>) -> Self {
        match tier {
            Some(tier) => Bucket::Tier(tier),
            None => Bucket::Queue,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Queue => f.write_str("queue"),
            Bucket::Tier(tier) => f.write_str(tier.as_str()),
        }
    }
}

impl FromStr for Bucket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("queue") || trimmed.is_empty() {
            return Ok(Bucket::Queue);
        }
        trimmed.parse::<Tier>().map(Bucket::Tier)
    }
}

impl TryFrom<String> for Bucket {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Bucket> for String {
    fn from(bucket: Bucket) -> Self {
        bucket.to_string()
    }
}
