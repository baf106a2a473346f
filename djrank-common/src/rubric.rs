//! Scoring rubric
//!
//! Fixed-shape rubric: four criteria rated 0–3, three bonus flags and three
//! penalty flags. Input is coerced, never rejected:
//! - criterion values are truncated to integers and clamped to [0, 3]
//! - missing, null or non-numeric values count as 0 / false
//! - the legacy criterion key `guests` is read as `creativity`

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Highest rating a single criterion can carry
pub const MAX_CRITERION: u8 = 3;

/// Clamp a raw criterion rating into [0, 3]
pub fn clamp_criterion(value: i64) -> u8 {
    value.clamp(0, MAX_CRITERION as i64) as u8
}

/// Coerce an arbitrary JSON value into a criterion rating
fn coerce_criterion(value: &Value) -> u8 {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                clamp_criterion(i)
            } else if let Some(f) = n.as_f64() {
                coerce_float(f)
            } else {
                // u64 beyond i64 range
                MAX_CRITERION
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                clamp_criterion(i)
            } else if let Ok(f) = s.parse::<f64>() {
                coerce_float(f)
            } else {
                0
            }
        }
        _ => 0,
    }
}

fn coerce_float(f: f64) -> u8 {
    if f.is_nan() {
        0
    } else {
        f.trunc().clamp(0.0, MAX_CRITERION as f64) as u8
    }
}

/// Coerce an arbitrary JSON value into a flag (null, false, 0 and "" are false)
pub(crate) fn coerce_flag(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty() && s != "false" && s != "0",
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_flag(&value))
}

/// Criterion name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    Flow,
    Vibes,
    Visuals,
    Creativity,
}

impl Criterion {
    pub const ALL: [Criterion; 4] = [
        Criterion::Flow,
        Criterion::Vibes,
        Criterion::Visuals,
        Criterion::Creativity,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Criterion::Flow => "flow",
            Criterion::Vibes => "vibes",
            Criterion::Visuals => "visuals",
            Criterion::Creativity => "creativity",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Criterion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flow" => Ok(Criterion::Flow),
            "vibes" => Ok(Criterion::Vibes),
            "visuals" => Ok(Criterion::Visuals),
            "creativity" | "guests" => Ok(Criterion::Creativity),
            other => Err(Error::InvalidInput(format!("Unknown criterion: {}", other))),
        }
    }
}

/// The four rated criteria, each in [0, 3]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Criteria {
    pub flow: u8,
    pub vibes: u8,
    pub visuals: u8,
    pub creativity: u8,
}

impl Criteria {
    /// Build criteria from raw ratings, clamping each into [0, 3]
    pub fn new(flow: i64, vibes: i64, visuals: i64, creativity: i64) -> Self {
        Self {
            flow: clamp_criterion(flow),
            vibes: clamp_criterion(vibes),
            visuals: clamp_criterion(visuals),
            creativity: clamp_criterion(creativity),
        }
    }

    pub fn get(&self, criterion: Criterion) -> u8 {
        match criterion {
            Criterion::Flow => self.flow,
            Criterion::Vibes => self.vibes,
            Criterion::Visuals => self.visuals,
            Criterion::Creativity => self.creativity,
        }
    }

    /// Set one criterion, clamping the raw rating
    pub fn set(&mut self, criterion: Criterion, value: i64) {
        let value = clamp_criterion(value);
        match criterion {
            Criterion::Flow => self.flow = value,
            Criterion::Vibes => self.vibes = value,
            Criterion::Visuals => self.visuals = value,
            Criterion::Creativity => self.creativity = value,
        }
    }

    /// Read criteria from a JSON object, coercing every value
    pub fn from_json(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        let read = |key: &str| map.get(key).map(coerce_criterion).unwrap_or(0);
        let creativity = map
            .get("creativity")
            .or_else(|| map.get("guests"))
            .map(coerce_criterion)
            .unwrap_or(0);

        Self {
            flow: read("flow"),
            vibes: read("vibes"),
            visuals: read("visuals"),
            creativity,
        }
    }
}

impl<'de> Deserialize<'de> for Criteria {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Criteria::from_json(&value))
    }
}

/// Bonus flags, worth +0.5 each
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bonuses {
    #[serde(rename = "bonus_crowd_control", deserialize_with = "deserialize_flag")]
    pub crowd_control: bool,
    #[serde(rename = "bonus_signature_moment", deserialize_with = "deserialize_flag")]
    pub signature_moment: bool,
    #[serde(rename = "bonus_bold_risks", deserialize_with = "deserialize_flag")]
    pub bold_risks: bool,
}

impl Bonuses {
    pub fn count(&self) -> u8 {
        [self.crowd_control, self.signature_moment, self.bold_risks]
            .iter()
            .filter(|flag| **flag)
            .count() as u8
    }
}

/// Penalty flags, worth -0.5 each
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Penalties {
    #[serde(rename = "penalty_cliche_tracks", deserialize_with = "deserialize_flag")]
    pub cliche_tracks: bool,
    #[serde(rename = "penalty_overreliance", deserialize_with = "deserialize_flag")]
    pub overreliance: bool,
    #[serde(rename = "penalty_poor_energy", deserialize_with = "deserialize_flag")]
    pub poor_energy: bool,
}

impl Penalties {
    pub fn count(&self) -> u8 {
        [self.cliche_tracks, self.overreliance, self.poor_energy]
            .iter()
            .filter(|flag| **flag)
            .count() as u8
    }
}

/// Bonus flag name (CLI and patch helpers)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BonusFlag {
    CrowdControl,
    SignatureMoment,
    BoldRisks,
}

impl FromStr for BonusFlag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "crowd-control" => Ok(BonusFlag::CrowdControl),
            "signature-moment" => Ok(BonusFlag::SignatureMoment),
            "bold-risks" => Ok(BonusFlag::BoldRisks),
            other => Err(Error::InvalidInput(format!("Unknown bonus: {}", other))),
        }
    }
}

/// Penalty flag name (CLI and patch helpers)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyFlag {
    ClicheTracks,
    Overreliance,
    PoorEnergy,
}

impl FromStr for PenaltyFlag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "cliche-tracks" => Ok(PenaltyFlag::ClicheTracks),
            "overreliance" => Ok(PenaltyFlag::Overreliance),
            "poor-energy" => Ok(PenaltyFlag::PoorEnergy),
            other => Err(Error::InvalidInput(format!("Unknown penalty: {}", other))),
        }
    }
}

impl Bonuses {
    pub fn set(&mut self, flag: BonusFlag, on: bool) {
        match flag {
            BonusFlag::CrowdControl => self.crowd_control = on,
            BonusFlag::SignatureMoment => self.signature_moment = on,
            BonusFlag::BoldRisks => self.bold_risks = on,
        }
    }
}

impl Penalties {
    pub fn set(&mut self, flag: PenaltyFlag, on: bool) {
        match flag {
            PenaltyFlag::ClicheTracks => self.cliche_tracks = on,
            PenaltyFlag::Overreliance => self.overreliance = on,
            PenaltyFlag::PoorEnergy => self.poor_energy = on,
        }
    }
}

/// Complete rubric as stored on a performer record
///
/// On the wire the criteria sit under `criteria` while the flags are flat
/// `bonus_*` / `penalty_*` fields of the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubric {
    #[serde(default)]
    pub criteria: Criteria,
    #[serde(flatten)]
    pub bonuses: Bonuses,
    #[serde(flatten)]
    pub penalties: Penalties,
}
