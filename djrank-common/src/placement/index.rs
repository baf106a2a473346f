//! Placement index
//!
//! Which performer id sits in which bucket. Pure state: no I/O, no events.
//! Every id appears in exactly one bucket; order within a bucket is display
//! order.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::performer::Performer;
use crate::tier::{Bucket, Tier};

/// One way the index disagrees with the confirmed records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexViolation {
    #[error("performer {id} is listed {count} times")]
    Duplicate { id: String, count: usize },

    #[error("performer {id} is missing from the index")]
    Missing { id: String },

    #[error("index lists unknown performer {id}")]
    Unknown { id: String },

    #[error("performer {id} is in {actual} but its record says {expected}")]
    Misplaced {
        id: String,
        expected: Bucket,
        actual: Bucket,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementIndex {
    queue: Vec<String>,
    tiers: BTreeMap<Tier, Vec<String>>,
}

impl Default for PlacementIndex {
    fn default() -> Self {
        Self {
            queue: Vec::new(),
            tiers: Tier::ALL.into_iter().map(|t| (t, Vec::new())).collect(),
        }
    }
}

impl PlacementIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the index from records, keeping their order within each bucket
    pub fn from_performers<'a>(performers: impl IntoIterator<Item = &'a Performer>) -> Self {
        let mut index = Self::new();
        for performer in performers {
            index.place(&performer.id, performer.bucket());
        }
        index
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<String> {
        match bucket {
            Bucket::Queue => &mut self.queue,
            Bucket::Tier(tier) => self.tiers.entry(tier).or_default(),
        }
    }

    /// Ids in a bucket, in display order
    pub fn bucket(&self, bucket: Bucket) -> &[String] {
        match bucket {
            Bucket::Queue => &self.queue,
            Bucket::Tier(tier) => self.tiers.get(&tier).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    pub fn queue(&self) -> &[String] {
        &self.queue
    }

    pub fn tier(&self, tier: Tier) -> &[String] {
        self.bucket(Bucket::Tier(tier))
    }

    /// Bucket currently holding `id`
    pub fn locate(&self, id: &str) -> Option<Bucket> {
        Bucket::all().find(|&bucket| self.bucket(bucket).iter().any(|x| x == id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.locate(id).is_some()
    }

    /// Move (or insert) `id` to the end of `target`
    ///
    /// Returns the bucket it was removed from, if any.
    pub fn place(&mut self, id: &str, target: Bucket) -> Option<Bucket> {
        let previous = self.remove(id);
        self.bucket_mut(target).push(id.to_string());
        previous
    }

    /// Remove `id` from whichever bucket holds it
    pub fn remove(&mut self, id: &str) -> Option<Bucket> {
        let mut found = None;
        for bucket in Bucket::all() {
            let ids = self.bucket_mut(bucket);
            let before = ids.len();
            ids.retain(|x| x != id);
            if ids.len() != before && found.is_none() {
                found = Some(bucket);
            }
        }
        found
    }

    /// Total ids across all buckets
    pub fn len(&self) -> usize {
        self.queue.len() + self.tiers.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check the index against the confirmed `(id, bucket)` pairs
    ///
    /// Valid when every id appears exactly once, in the bucket its record
    /// names, and nothing else is listed.
    pub fn validate<'a>(
        &self,
        expected: impl IntoIterator<Item = (&'a str, Bucket)>,
    ) -> Result<(), Vec<IndexViolation>> {
        let mut seen: HashMap<&str, (Bucket, usize)> = HashMap::new();
        for bucket in Bucket::all() {
            for id in self.bucket(bucket) {
                seen.entry(id.as_str())
                    .and_modify(|(_, count)| *count += 1)
                    .or_insert((bucket, 1));
            }
        }

        let mut violations = Vec::new();
        for (id, expected_bucket) in expected {
            match seen.remove(id) {
                None => violations.push(IndexViolation::Missing { id: id.to_string() }),
                Some((_, count)) if count > 1 => violations.push(IndexViolation::Duplicate {
                    id: id.to_string(),
                    count,
                }),
                Some((actual, _)) if actual != expected_bucket => {
                    violations.push(IndexViolation::Misplaced {
                        id: id.to_string(),
                        expected: expected_bucket,
                        actual,
                    })
                }
                Some(_) => {}
            }
        }
        violations.extend(
            seen.into_keys()
                .map(|id| IndexViolation::Unknown { id: id.to_string() }),
        );

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Validate against records
    pub fn validate_against(&self, performers: &[Performer]) -> Result<(), Vec<IndexViolation>> {
        self.validate(performers.iter().map(|p| (p.id.as_str(), p.bucket())))
    }
}
