use super::{Store, StoreResult};
use crate::error::StorageError;
use crate::state::BudgetState;
use std::sync::Mutex;

/// Non-durable store: state lives as long as the process.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<BudgetState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: BudgetState) -> Self {
        MemoryStore {
            state: Mutex::new(state),
        }
    }
}

impl Store for MemoryStore {
    fn load(&self) -> StoreResult<BudgetState> {
        let state = self.state.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(state.clone())
    }

    fn save(&self, state: &BudgetState) -> StoreResult<()> {
        let mut current = self.state.lock().map_err(|_| StorageError::Poisoned)?;
        *current = state.clone();
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
