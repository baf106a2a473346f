//! Persistence gateway
//!
//! One async trait over durable performer storage with three backends:
//! - [`SqliteGateway`]: local SQLite file (server default)
//! - [`MemoryGateway`]: process-local, for tests and throwaway servers
//! - [`HttpGateway`]: remote djrank-server over its JSON API (CLI sessions)
//!
//! Every method may fail with a storage or transport error. A failed call
//! means the store did not change.

use async_trait::async_trait;

use crate::performer::{NewPerformer, Performer, PerformerPatch};
use crate::Result;

pub mod http;
pub mod memory;
pub mod sqlite;

pub use http::HttpGateway;
pub use memory::MemoryGateway;
pub use sqlite::SqliteGateway;

#[async_trait]
pub trait Gateway: Send + Sync {
    /// All performers, newest first
    async fn list(&self) -> Result<Vec<Performer>>;

    /// One performer by id
    async fn get(&self, id: &str) -> Result<Option<Performer>> {
        Ok(self.list().await?.into_iter().find(|p| p.id == id))
    }

    /// Persist a new performer
    ///
    /// The store assigns the id when none is supplied and sets both
    /// timestamps. A duplicate id is a `Conflict`.
    async fn create(&self, new: NewPerformer) -> Result<Performer>;

    /// Apply a partial update; `None` when the id is unknown
    async fn update(&self, id: &str, patch: PerformerPatch) -> Result<Option<Performer>>;

    /// Remove a performer; `false` when the id is unknown
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Short backend name for logs and the health endpoint
    fn backend_name(&self) -> &'static str;
}
