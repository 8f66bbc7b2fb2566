// Error types - validation failures, storage failures, configuration failures
//
// Every failure the library can produce carries an explicit ErrorKind so
// callers (the HTTP layer, the CLI) never pattern-match on message text.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BudgetError>;

// ============================================================================
// ERROR KIND
// ============================================================================

/// Coarse classification of a failure, used to pick the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or rejected input (400)
    Validation,
    /// Input collides with existing state (409)
    Conflict,
    /// Referenced record does not exist (404)
    NotFound,
    /// Storage or other server-side failure (500)
    Internal,
}

// ============================================================================
// BUDGET ERROR
// ============================================================================

#[derive(Error, Debug)]
pub enum BudgetError {
    #[error("Category name cannot be empty")]
    EmptyCategory,

    #[error("Category '{0}' already exists")]
    DuplicateCategory(String),

    #[error("Category '{0}' not found")]
    CategoryNotFound(String),

    #[error("Category '{0}' is not registered")]
    UnknownCategory(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Expense '{0}' not found")]
    ExpenseNotFound(String),

    #[error("Unsupported action '{0}'")]
    UnsupportedAction(String),

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl BudgetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BudgetError::EmptyCategory
            | BudgetError::UnknownCategory(_)
            | BudgetError::InvalidAmount(_)
            | BudgetError::UnsupportedAction(_)
            | BudgetError::InvalidRequest(_) => ErrorKind::Validation,
            BudgetError::DuplicateCategory(_) => ErrorKind::Conflict,
            BudgetError::CategoryNotFound(_) | BudgetError::ExpenseNotFound(_) => {
                ErrorKind::NotFound
            }
            BudgetError::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Stable snake_case identifier exposed to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            BudgetError::EmptyCategory => "empty_category",
            BudgetError::DuplicateCategory(_) => "duplicate_category",
            BudgetError::CategoryNotFound(_) => "category_not_found",
            BudgetError::UnknownCategory(_) => "unknown_category",
            BudgetError::InvalidAmount(_) => "invalid_amount",
            BudgetError::ExpenseNotFound(_) => "expense_not_found",
            BudgetError::UnsupportedAction(_) => "unsupported_action",
            BudgetError::InvalidRequest(_) => "invalid_request",
            BudgetError::Storage(_) => "storage",
        }
    }
}

// ============================================================================
// STORAGE ERROR
// ============================================================================

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Stored record is corrupt: {0}")]
    Corrupt(String),

    #[error("Store lock poisoned")]
    Poisoned,
}

// ============================================================================
// CONFIG ERROR
// ============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(BudgetError::EmptyCategory.kind(), ErrorKind::Validation);
        assert_eq!(
            BudgetError::DuplicateCategory("Food".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            BudgetError::CategoryNotFound("Food".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            BudgetError::ExpenseNotFound("abc".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            BudgetError::InvalidRequest("bad".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            BudgetError::from(StorageError::Poisoned).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_error_messages() {
        let err = BudgetError::DuplicateCategory("Food".into());
        assert_eq!(err.to_string(), "Category 'Food' already exists");
        assert_eq!(err.code(), "duplicate_category");
    }
}
