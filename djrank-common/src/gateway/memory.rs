//! In-memory gateway backend

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::Gateway;
use crate::performer::{NewPerformer, Performer, PerformerPatch};
use crate::{ids, time, Error, Result};

/// Performers held in a `Vec`, newest first
#[derive(Debug, Default)]
pub struct MemoryGateway {
    performers: RwLock<Vec<Performer>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing records (given newest first)
    pub fn with_performers(performers: Vec<Performer>) -> Self {
        Self {
            performers: RwLock::new(performers),
        }
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn list(&self) -> Result<Vec<Performer>> {
        Ok(self.performers.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Performer>> {
        Ok(self
            .performers
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn create(&self, new: NewPerformer) -> Result<Performer> {
        new.validate()?;

        let mut performers = self.performers.write().await;
        let id = ids::normalize(new.id.as_deref()).unwrap_or_else(ids::generate);
        if performers.iter().any(|p| p.id == id) {
            return Err(Error::Conflict(format!("Performer {} already exists", id)));
        }

        let performer = Performer::from_new(new, id, time::now());
        performers.insert(0, performer.clone());
        debug!(id = %performer.id, "memory gateway: created");
        Ok(performer)
    }

    async fn update(&self, id: &str, patch: PerformerPatch) -> Result<Option<Performer>> {
        patch.validate()?;

        let mut performers = self.performers.write().await;
        let Some(performer) = performers.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        patch.apply_to(performer, time::now());
        Ok(Some(performer.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut performers = self.performers.write().await;
        let before = performers.len();
        performers.retain(|p| p.id != id);
        Ok(performers.len() < before)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::Tier;

    #[tokio::test]
    async fn test_create_assigns_id_and_lists_newest_first() {
        let gateway = MemoryGateway::new();
        let first = gateway.create(NewPerformer::named("First")).await.unwrap();
        let second = gateway.create(NewPerformer::named("Second")).await.unwrap();

        assert!(!first.id.is_empty());
        assert_ne!(first.id, second.id);

        let names: Vec<String> = gateway.list().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let gateway = MemoryGateway::new();
        gateway.create(NewPerformer::named("A").with_id("demo-1")).await.unwrap();
        let err = gateway
            .create(NewPerformer::named("B").with_id("demo-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_id() {
        let gateway = MemoryGateway::new();
        assert!(gateway
            .update("missing", PerformerPatch::tier(Some(Tier::A)))
            .await
            .unwrap()
            .is_none());
        assert!(!gateway.delete("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_returns_confirmed_record() {
        let gateway = MemoryGateway::new();
        let created = gateway.create(NewPerformer::named("DJ")).await.unwrap();

        let updated = gateway
            .update(&created.id, PerformerPatch::tier(Some(Tier::B)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.tier, Some(Tier::B));
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(gateway.get(&created.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_empty_patch_rejected() {
        let gateway = MemoryGateway::new();
        let created = gateway.create(NewPerformer::named("DJ")).await.unwrap();
        let err = gateway
            .update(&created.id, PerformerPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
