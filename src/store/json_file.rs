// JSON snapshot store - the whole state as one document
//
// Layout: {"budget": {category: number}, "expenses": [...], "categories": [...]}

use super::{Store, StoreResult};
use crate::state::BudgetState;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonFileStore {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Store for JsonFileStore {
    /// A missing file is an empty state, not an error.
    fn load(&self) -> StoreResult<BudgetState> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no state file yet");
                return Ok(BudgetState::default());
            }
            Err(e) => return Err(e.into()),
        };

        let state = serde_json::from_slice(&bytes)?;
        tracing::debug!(path = %self.path.display(), "state loaded");
        Ok(state)
    }

    /// Write to a temp file in the same directory, then rename it over the
    /// target. The temp file is removed if any step fails.
    fn save(&self, state: &BudgetState) -> StoreResult<()> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };

        let json = serde_json::to_vec_pretty(state)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        tracing::debug!(path = %self.path.display(), bytes = json.len(), "state saved");
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "json"
    }
}
