// Budget Tracker - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod service;
pub mod state;
pub mod store;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::{Config, LogFormat, StoreConfig, StoreKind};
pub use error::{BudgetError, ConfigError, ErrorKind, StorageError};
pub use report::{generate_report, BudgetStatus, Report, ReportRow};
pub use service::BudgetService;
pub use state::{normalize_category, parse_amount, BudgetState, Expense};
pub use store::{open_store, JsonFileStore, MemoryStore, SqliteStore, Store, DEFAULT_CATEGORIES};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
