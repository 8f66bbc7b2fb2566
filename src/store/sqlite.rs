// SQLite store - three tables, one transaction per save
//
// categories(name PK), budget(category PK, limit_amount),
// expenses(id PK, category, amount, date, description)

use super::{Store, StoreResult};
use crate::error::StorageError;
use crate::state::{BudgetState, Expense};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Starter categories inserted when the categories table is empty
pub const DEFAULT_CATEGORIES: [&str; 5] = ["Food", "Transport", "Utilities", "Entertainment", "Health"];

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file with WAL journaling and the schema in place.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        // journal_mode returns a row, so it goes through query_row
        conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        setup_schema(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Insert DEFAULT_CATEGORIES with zero budgets, only if no category exists yet.
    ///
    /// Returns the number of categories inserted.
    pub fn seed_defaults(&self) -> StoreResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let count: i64 = tx.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(0);
        }

        for name in DEFAULT_CATEGORIES {
            tx.execute("INSERT INTO categories (name) VALUES (?1)", params![name])?;
            tx.execute(
                "INSERT OR IGNORE INTO budget (category, limit_amount) VALUES (?1, 0)",
                params![name],
            )?;
        }
        tx.commit()?;

        tracing::info!(count = DEFAULT_CATEGORIES.len(), "seeded default categories");
        Ok(DEFAULT_CATEGORIES.len())
    }
}

/// Idempotent schema creation.
pub fn setup_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS categories (
            name TEXT PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS budget (
            category TEXT PRIMARY KEY,
            limit_amount REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS expenses (
            id TEXT PRIMARY KEY,
            category TEXT NOT NULL,
            amount REAL NOT NULL,
            date TEXT NOT NULL,
            description TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category);",
    )
}

fn load_state(conn: &Connection) -> StoreResult<BudgetState> {
    let mut stmt = conn.prepare("SELECT name FROM categories ORDER BY rowid")?;
    let categories = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    let mut stmt = conn.prepare("SELECT category, limit_amount FROM budget")?;
    let budget = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT id, category, amount, date, description
         FROM expenses
         ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut expenses = Vec::with_capacity(rows.len());
    for (id, category, amount, date, description) in rows {
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| StorageError::Corrupt(format!("expense {} has bad date '{}': {}", id, date, e)))?;
        expenses.push(Expense {
            id,
            category,
            amount,
            date,
            description,
        });
    }

    Ok(BudgetState {
        budget,
        expenses,
        categories,
    })
}

impl Store for SqliteStore {
    fn load(&self) -> StoreResult<BudgetState> {
        let conn = self.lock()?;
        let state = load_state(&conn)?;
        tracing::debug!(
            categories = state.categories.len(),
            expenses = state.expenses.len(),
            "state loaded"
        );
        Ok(state)
    }

    /// Rewrite all three tables inside one transaction.
    fn save(&self, state: &BudgetState) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM expenses", [])?;
        tx.execute("DELETE FROM budget", [])?;
        tx.execute("DELETE FROM categories", [])?;

        {
            let mut insert_category = tx.prepare("INSERT INTO categories (name) VALUES (?1)")?;
            for name in &state.categories {
                insert_category.execute(params![name])?;
            }

            let mut insert_budget =
                tx.prepare("INSERT INTO budget (category, limit_amount) VALUES (?1, ?2)")?;
            for (category, limit) in &state.budget {
                insert_budget.execute(params![category, limit])?;
            }

            let mut insert_expense = tx.prepare(
                "INSERT INTO expenses (id, category, amount, date, description)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for e in &state.expenses {
                insert_expense.execute(params![
                    e.id,
                    e.category,
                    e.amount,
                    e.date.format("%Y-%m-%d").to_string(),
                    e.description,
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!(expenses = state.expenses.len(), "state saved");
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_state() -> BudgetState {
        let mut state = BudgetState::new();
        state.add_category("Travel").unwrap();
        state.add_category("Food").unwrap();
        state
            .set_budgets(json!({"Food": 100, "Travel": 50.5}).as_object().unwrap())
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 12, 29).unwrap();
        state.add_expense("Food", &json!(30), Some("groceries"), day).unwrap();
        state.add_expense("Travel", &json!(12.75), None, day).unwrap();
        state.add_expense("Food", &json!(80), None, day).unwrap();
        state
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_schema(&conn).unwrap();
        setup_schema(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('categories', 'budget', 'expenses')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }

    #[test]
    fn test_seed_only_when_empty() {
        let store = SqliteStore::open_in_memory().unwrap();

        assert_eq!(store.seed_defaults().unwrap(), DEFAULT_CATEGORIES.len());
        assert_eq!(store.seed_defaults().unwrap(), 0);

        let state = store.load().unwrap();
        assert_eq!(state.categories, DEFAULT_CATEGORIES.to_vec());
        assert!(state.budget.values().all(|limit| *limit == 0.0));
        assert_eq!(state.budget.len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn test_seed_skipped_for_existing_data() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut state = BudgetState::new();
        state.add_category("Books").unwrap();
        store.save(&state).unwrap();

        assert_eq!(store.seed_defaults().unwrap(), 0);
        assert_eq!(store.load().unwrap().categories, vec!["Books"]);
    }

    #[test]
    fn test_save_load_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let state = sample_state();

        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn test_save_replaces_previous_state() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut state = sample_state();
        store.save(&state).unwrap();

        state.remove_category("Food").unwrap();
        store.save(&state).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.categories, vec!["Travel"]);
        assert!(!loaded.budget.contains_key("Food"));
        assert_eq!(loaded.expenses.len(), 1);
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        let good = sample_state();
        store.save(&good).unwrap();

        // Duplicate expense ids violate the primary key half way through the save
        let mut bad = good.clone();
        let dup = bad.expenses[0].clone();
        bad.expenses.push(dup);
        assert!(matches!(store.save(&bad), Err(StorageError::Sqlite(_))));

        assert_eq!(store.load().unwrap(), good);
    }

    #[test]
    fn test_corrupt_date_is_reported() {
        let store = SqliteStore::open_in_memory().unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute(
                "INSERT INTO expenses (id, category, amount, date) VALUES ('x', 'Food', 1.0, 'yesterday')",
                [],
            )
            .unwrap();
        }

        assert!(matches!(store.load(), Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budget.db");
        let state = sample_state();

        SqliteStore::open(&path).unwrap().save(&state).unwrap();
        let reopened = SqliteStore::open(&path).unwrap();

        assert_eq!(reopened.load().unwrap(), state);
    }
}
