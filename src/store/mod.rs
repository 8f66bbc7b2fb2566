// Persistence Gateway - load/save contract over swappable backends
//
// Each backend stores the whole BudgetState: the registry, the budget map
// and the ledger. A save either lands completely or not at all.

pub mod json_file;
pub mod memory;
pub mod sqlite;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, DEFAULT_CATEGORIES};

use crate::config::{StoreConfig, StoreKind};
use crate::error::StorageError;
use crate::state::BudgetState;

pub type StoreResult<T> = std::result::Result<T, StorageError>;

pub trait Store: Send + Sync {
    /// Read a full snapshot of the persisted state
    fn load(&self) -> StoreResult<BudgetState>;

    /// Replace the persisted state with `state`
    fn save(&self, state: &BudgetState) -> StoreResult<()>;

    /// Short backend name for logs and the health endpoint
    fn backend(&self) -> &'static str;
}

/// Build the configured backend.
pub fn open_store(config: &StoreConfig) -> StoreResult<Box<dyn Store>> {
    let store: Box<dyn Store> = match config.kind {
        StoreKind::Memory => Box::new(MemoryStore::new()),
        StoreKind::Json => Box::new(JsonFileStore::new(&config.path)),
        StoreKind::Sqlite => {
            let store = SqliteStore::open(&config.path)?;
            if config.seed_defaults {
                store.seed_defaults()?;
            }
            Box::new(store)
        }
    };

    tracing::info!(backend = store.backend(), path = %config.path.display(), "store opened");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_open_store_variants() {
        let dir = tempfile::tempdir().unwrap();

        let memory = open_store(&StoreConfig {
            kind: StoreKind::Memory,
            path: PathBuf::new(),
            seed_defaults: true,
        })
        .unwrap();
        assert_eq!(memory.backend(), "memory");
        assert_eq!(memory.load().unwrap(), BudgetState::default());

        let json = open_store(&StoreConfig {
            kind: StoreKind::Json,
            path: dir.path().join("state.json"),
            seed_defaults: true,
        })
        .unwrap();
        assert_eq!(json.backend(), "json");

        let sqlite = open_store(&StoreConfig {
            kind: StoreKind::Sqlite,
            path: dir.path().join("budget.db"),
            seed_defaults: true,
        })
        .unwrap();
        assert_eq!(sqlite.backend(), "sqlite");
        assert_eq!(sqlite.load().unwrap().categories.len(), DEFAULT_CATEGORIES.len());
    }
}
