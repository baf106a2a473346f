//! Board session
//!
//! Client-side cache of performer records plus their placement index, kept
//! in step with a [`Gateway`]. Every mutation follows the same path:
//!
//! 1. refuse without the admin capability (no gateway call)
//! 2. reconcile an unknown id through `Gateway::get`
//! 3. write through the gateway
//! 4. on success, replace the cached record with the one the gateway
//!    returned and re-place it in the index from that record's tier
//! 5. validate the index, repairing it from the records if needed
//! 6. emit a [`RankEvent`] naming the buckets that changed
//!
//! A failed gateway call returns early, before step 4, so the cache and the
//! index never hold a state the store did not confirm.
//!
//! Gateway updates run on their own task. When the caller stops waiting
//! (timeout, navigation), the write still completes and its confirmed record
//! is queued; the next transition, or an explicit [`Board::sync_pending`],
//! applies it.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::drag::DropIntent;
use super::index::PlacementIndex;
use crate::events::{EventBus, RankEvent};
use crate::gateway::Gateway;
use crate::performer::{NewPerformer, Performer, PerformerPatch};
use crate::scoring::Score;
use crate::search::ArtistSearchResult;
use crate::tier::{Bucket, Tier};
use crate::{time, Error, Result};

/// What the session is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Read and mutate
    Admin,
    /// Read only
    ReadOnly,
}

impl Capability {
    /// Admin when a non-blank credential is present
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some(t) if !t.trim().is_empty() => Capability::Admin,
            _ => Capability::ReadOnly,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Capability::Admin)
    }
}

pub struct Board {
    gateway: Arc<dyn Gateway>,
    capability: Capability,
    /// Newest first, like `Gateway::list`
    performers: Vec<Performer>,
    index: PlacementIndex,
    events: Arc<EventBus>,
    /// Records confirmed by gateway writes, not yet applied to the cache
    confirmed_tx: mpsc::UnboundedSender<Performer>,
    confirmed_rx: mpsc::UnboundedReceiver<Performer>,
}

impl Board {
    /// Empty session; call [`Board::reload`] to fill it
    pub fn new(gateway: Arc<dyn Gateway>, capability: Capability) -> Self {
        Self::with_events(gateway, capability, Arc::new(EventBus::default()))
    }

    pub fn with_events(
        gateway: Arc<dyn Gateway>,
        capability: Capability,
        events: Arc<EventBus>,
    ) -> Self {
        let (confirmed_tx, confirmed_rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            capability,
            performers: Vec::new(),
            index: PlacementIndex::new(),
            events,
            confirmed_tx,
            confirmed_rx,
        }
    }

    /// New session loaded from the gateway
    pub async fn load(gateway: Arc<dyn Gateway>, capability: Capability) -> Result<Self> {
        let mut board = Self::new(gateway, capability);
        board.reload().await?;
        Ok(board)
    }

    // ========================================
    // Read access
    // ========================================

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn performers(&self) -> &[Performer] {
        &self.performers
    }

    pub fn performer(&self, id: &str) -> Option<&Performer> {
        self.performers.iter().find(|p| p.id == id)
    }

    pub fn index(&self) -> &PlacementIndex {
        &self.index
    }

    /// Current bucket of a performer
    ///
    /// An id the cache has lost is fetched from the gateway and reconciled
    /// before answering; `NotFound` only when the gateway has no record.
    pub async fn locate(&mut self, id: &str) -> Result<Bucket> {
        Ok(self.resolve(id).await?.bucket())
    }

    /// Records in one bucket, in display order
    pub fn bucket(&self, bucket: Bucket) -> Vec<&Performer> {
        self.index
            .bucket(bucket)
            .iter()
            .filter_map(|id| self.performer(id))
            .collect()
    }

    /// Unranked performers whose name contains `query` (case-insensitive)
    ///
    /// A blank query returns the whole queue.
    pub fn queue_matching(&self, query: &str) -> Vec<&Performer> {
        let needle = query.trim().to_lowercase();
        self.bucket(Bucket::Queue)
            .into_iter()
            .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Score of a cached performer
    pub fn score(&self, id: &str) -> Result<Score> {
        self.performer(id)
            .map(Performer::score)
            .ok_or_else(|| not_found(id))
    }

    // ========================================
    // Transitions
    // ========================================

    /// Apply records confirmed by writes whose callers stopped waiting
    ///
    /// Returns how many records were applied.
    pub fn sync_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(record) = self.confirmed_rx.try_recv() {
            debug!(id = %record.id, "Applying confirmed write");
            self.apply_confirmed(record);
            applied += 1;
        }
        applied
    }

    /// Replace the cache and index with the gateway's records
    pub async fn reload(&mut self) -> Result<usize> {
        // The listing already reflects finished writes
        while self.confirmed_rx.try_recv().is_ok() {}
        let performers = self.gateway.list().await?;

        self.index = PlacementIndex::from_performers(&performers);
        self.performers = performers;
        self.check_index();

        let count = self.performers.len();
        info!(count, backend = self.gateway.backend_name(), "Board loaded");
        self.events.emit_lossy(RankEvent::BoardReloaded {
            performer_count: count,
            timestamp: time::now(),
        });
        Ok(count)
    }

    /// Move a performer into `tier` (`None` = back to the queue)
    pub async fn place_in_tier(&mut self, id: &str, tier: Option<Tier>) -> Result<Performer> {
        self.require_admin("place")?;
        self.resolve(id).await?;
        self.write_update(id, PerformerPatch::tier(tier)).await
    }

    pub async fn remove_from_tier(&mut self, id: &str) -> Result<Performer> {
        self.place_in_tier(id, None).await
    }

    /// Apply a completed drag gesture
    pub async fn apply_drop(&mut self, intent: &DropIntent) -> Result<Performer> {
        self.place_in_tier(&intent.id, intent.to.tier()).await
    }

    /// Place a performer in the tier its rubric scores
    pub async fn apply_calculated_tier(&mut self, id: &str) -> Result<Performer> {
        self.require_admin("apply calculated tier")?;
        let suggested = self.resolve(id).await?.suggested_tier();
        debug!(id, tier = %suggested, "Applying calculated tier");
        self.write_update(id, PerformerPatch::tier(Some(suggested))).await
    }

    /// Rubric, notes, links or event context edits
    ///
    /// A patch carrying `tier` also moves the performer.
    pub async fn update_details(&mut self, id: &str, patch: PerformerPatch) -> Result<Performer> {
        self.require_admin("update")?;
        patch.validate()?;
        self.resolve(id).await?;
        self.write_update(id, patch).await
    }

    pub async fn attach_photo(&mut self, id: &str, reference: &str) -> Result<Performer> {
        self.require_admin("attach photo")?;
        let reference = media_reference(reference)?;
        let mut photos = self.resolve(id).await?.photos.clone();
        photos.push(reference);
        self.write_update(id, PerformerPatch::photos(photos)).await
    }

    pub async fn attach_video(&mut self, id: &str, reference: &str) -> Result<Performer> {
        self.require_admin("attach video")?;
        let reference = media_reference(reference)?;
        let mut videos = self.resolve(id).await?.videos.clone();
        videos.push(reference);
        self.write_update(id, PerformerPatch::videos(videos)).await
    }

    /// Create a performer; it lands in the queue unless `new.tier` is set
    pub async fn add(&mut self, new: NewPerformer) -> Result<Performer> {
        self.require_admin("add")?;
        new.validate()?;
        self.sync_pending();

        let record = self.gateway.create(new).await?;

        let bucket = record.bucket();
        self.performers.retain(|p| p.id != record.id);
        self.performers.insert(0, record.clone());
        self.index.place(&record.id, bucket);
        self.check_index();

        info!(id = %record.id, name = %record.name, %bucket, "Performer added");
        self.events.emit_lossy(RankEvent::PerformerCreated {
            performer_id: record.id.clone(),
            name: record.name.clone(),
            bucket,
            timestamp: time::now(),
        });
        Ok(record)
    }

    /// Create a performer from an external search hit
    pub async fn import_search_result(&mut self, result: ArtistSearchResult) -> Result<Performer> {
        self.add(result.into_new_performer()).await
    }

    /// Delete a performer and drop it from its bucket
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        self.require_admin("delete")?;
        self.resolve(id).await?;

        if !self.gateway.delete(id).await? {
            warn!(id, "Gateway no longer knows performer, dropping stale entry");
            self.forget(id);
            return Err(not_found(id));
        }

        self.forget(id);
        info!(id, "Performer deleted");
        Ok(())
    }

    // ========================================
    // Internals
    // ========================================

    fn require_admin(&self, operation: &str) -> Result<()> {
        if self.capability.is_admin() {
            Ok(())
        } else {
            warn!(operation, "Refusing mutation without admin capability");
            Err(Error::Forbidden(format!(
                "{} requires admin access",
                operation
            )))
        }
    }

    /// Cached record for `id`, fetching it from the gateway when the cache
    /// does not have it
    async fn resolve(&mut self, id: &str) -> Result<&Performer> {
        self.sync_pending();
        if let Some(pos) = self.performers.iter().position(|p| p.id == id) {
            return Ok(&self.performers[pos]);
        }

        let Some(record) = self.gateway.get(id).await? else {
            return Err(not_found(id));
        };

        debug!(id, "Reconciled performer missing from cache");
        let bucket = record.bucket();
        let pos = self
            .performers
            .iter()
            .position(|p| p.created_at < record.created_at)
            .unwrap_or(self.performers.len());
        self.performers.insert(pos, record);
        self.index.place(id, bucket);
        self.check_index();
        self.events.emit_lossy(RankEvent::PerformerUpdated {
            performer_id: id.to_string(),
            bucket,
            timestamp: time::now(),
        });

        Ok(&self.performers[pos])
    }

    /// Gateway-first update of a cached performer
    ///
    /// The gateway call runs on a spawned task that queues the confirmed
    /// record, so dropping this future does not lose a completed write.
    async fn write_update(&mut self, id: &str, patch: PerformerPatch) -> Result<Performer> {
        self.sync_pending();

        let gateway = Arc::clone(&self.gateway);
        let confirmed = self.confirmed_tx.clone();
        let target = id.to_string();
        let task = tokio::spawn(async move {
            let outcome = gateway.update(&target, patch).await;
            if let Ok(Some(record)) = &outcome {
                // Receiver lives as long as the board
                let _ = confirmed.send(record.clone());
            }
            outcome
        });

        let outcome = task
            .await
            .map_err(|e| Error::Internal(format!("Gateway update task failed: {}", e)))?;
        self.sync_pending();

        match outcome? {
            Some(record) => Ok(record),
            None => {
                warn!(id, "Gateway no longer knows performer, dropping stale entry");
                self.forget(id);
                Err(not_found(id))
            }
        }
    }

    /// Put a gateway-confirmed record into the cache and index
    fn apply_confirmed(&mut self, record: Performer) {
        let id = record.id.clone();
        let from = self.index.locate(&id);
        let to = record.bucket();
        match self.performers.iter_mut().find(|p| p.id == id) {
            Some(cached) => *cached = record,
            None => self.performers.insert(0, record),
        }
        self.index.place(&id, to);
        self.check_index();

        let timestamp = time::now();
        let event = match from {
            Some(from) if from != to => {
                info!(id, %from, %to, "Performer placed");
                RankEvent::PerformerPlaced {
                    performer_id: id,
                    from,
                    to,
                    timestamp,
                }
            }
            _ => {
                debug!(id, bucket = %to, "Performer updated");
                RankEvent::PerformerUpdated {
                    performer_id: id,
                    bucket: to,
                    timestamp,
                }
            }
        };
        self.events.emit_lossy(event);
    }

    /// Drop a performer from cache and index
    fn forget(&mut self, id: &str) {
        self.performers.retain(|p| p.id != id);
        let from = self.index.remove(id);
        self.check_index();

        if let Some(from) = from {
            self.events.emit_lossy(RankEvent::PerformerDeleted {
                performer_id: id.to_string(),
                from,
                timestamp: time::now(),
            });
        }
    }

    /// Validate the index against the cache; rebuild it on any violation
    fn check_index(&mut self) {
        if let Err(violations) = self.index.validate_against(&self.performers) {
            for violation in &violations {
                warn!("Placement index violation: {}", violation);
            }
            self.index = PlacementIndex::from_performers(&self.performers);
            warn!(
                count = violations.len(),
                "Placement index rebuilt from confirmed records"
            );
        }
    }
}

fn not_found(id: &str) -> Error {
    Error::NotFound(format!("Performer {} not found", id))
}

fn media_reference(reference: &str) -> Result<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(Error::InvalidInput("Media reference cannot be empty".to_string()));
    }
    Ok(reference.to_string())
}
