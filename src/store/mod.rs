pub mod json_file;
pub mod sqlite;

use std::collections::HashSet;

use anyhow::Result;
use tracing::info;

use crate::config::{StoreBackend, StoreConfig};
use crate::platform::MessageId;

pub use json_file::JsonFileStore;
pub use sqlite::SqliteStore;

/// Ids of messages that have already been forwarded
pub type ForwardedIds = HashSet<MessageId>;

/// Persistent set of forwarded message ids.
///
/// Ids are never removed. Single writer: the running process.
pub trait ForwardedStore: Send + Sync {
    /// Read the persisted set. Missing or unreadable data yields an empty set.
    fn load(&self) -> ForwardedIds;

    /// Insert `id` into `ids` and persist immediately.
    fn add(&self, ids: &mut ForwardedIds, id: MessageId) -> Result<()>;
}

/// Open the backend selected by the configuration
pub fn open(config: &StoreConfig) -> Result<Box<dyn ForwardedStore>> {
    info!(
        "Forwarded-message store: {} at {}",
        config.backend,
        config.path.display()
    );
    match config.backend {
        StoreBackend::Json => Ok(Box::new(JsonFileStore::new(&config.path))),
        StoreBackend::Sqlite => Ok(Box::new(SqliteStore::open(&config.path)?)),
    }
}
