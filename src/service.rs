// Budget Service - the single owner of the persistence gateway
//
// Every mutation runs the same cycle under one lock:
//   load -> validate + mutate -> save -> reload
// so callers always receive a snapshot of what is actually persisted.

use crate::error::{BudgetError, Result, StorageError};
use crate::report::{generate_report, Report};
use crate::state::{BudgetState, Expense};
use crate::store::Store;
use chrono::{Local, NaiveDate};
use serde_json::Value;
use std::sync::Mutex;

pub struct BudgetService {
    store: Box<dyn Store>,
    guard: Mutex<()>,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl BudgetService {
    pub fn new(store: Box<dyn Store>) -> Self {
        BudgetService {
            store,
            guard: Mutex::new(()),
            today: local_today,
        }
    }

    /// Use a fixed clock for expense dates
    pub fn with_clock(store: Box<dyn Store>, today: fn() -> NaiveDate) -> Self {
        BudgetService {
            store,
            guard: Mutex::new(()),
            today,
        }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    fn load(&self) -> Result<BudgetState> {
        let mut state = self.store.load()?;
        if state.repair() {
            tracing::warn!(backend = self.store.backend(), "repaired budget map on load");
        }
        Ok(state)
    }

    fn mutate<T, F>(&self, op: F) -> Result<(T, BudgetState)>
    where
        F: FnOnce(&mut BudgetState) -> Result<T>,
    {
        let _guard = self.guard.lock().map_err(|_| StorageError::Poisoned)?;

        let mut state = self.load()?;
        let out = op(&mut state)?;
        self.store.save(&state)?;
        let fresh = self.load()?;

        Ok((out, fresh))
    }

    /// Current snapshot of the whole state
    pub fn state(&self) -> Result<BudgetState> {
        let _guard = self.guard.lock().map_err(|_| StorageError::Poisoned)?;
        self.load()
    }

    pub fn report(&self) -> Result<Report> {
        Ok(generate_report(&self.state()?))
    }

    pub fn add_category(&self, name: &str) -> Result<BudgetState> {
        let (name, state) = self.mutate(|s| s.add_category(name))?;
        tracing::info!(category = %name, "category added");
        Ok(state)
    }

    pub fn remove_category(&self, name: &str) -> Result<BudgetState> {
        let (deleted, state) = self.mutate(|s| s.remove_category(name))?;
        tracing::info!(category = %name.trim(), expenses_deleted = deleted, "category removed");
        Ok(state)
    }

    pub fn replace_categories(&self, names: &[String]) -> Result<BudgetState> {
        let (removed, state) = self.mutate(|s| Ok(s.replace_categories(names)))?;
        tracing::info!(
            categories = state.categories.len(),
            removed = removed.len(),
            "categories replaced"
        );
        Ok(state)
    }

    pub fn set_budgets(&self, mapping: &serde_json::Map<String, Value>) -> Result<BudgetState> {
        let ((), state) = self.mutate(|s| s.set_budgets(mapping))?;
        tracing::info!(entries = mapping.len(), "budget updated");
        Ok(state)
    }

    pub fn add_expense(
        &self,
        category: &str,
        amount: &Value,
        description: Option<&str>,
    ) -> Result<Expense> {
        let today = (self.today)();
        let (expense, _) = self.mutate(|s| s.add_expense(category, amount, description, today))?;
        tracing::info!(
            id = %expense.id,
            category = %expense.category,
            amount = expense.amount,
            "expense added"
        );
        Ok(expense)
    }

    pub fn remove_expense(&self, id: &str) -> Result<Expense> {
        let (expense, _) = self.mutate(|s| s.remove_expense(id))?;
        tracing::info!(id = %expense.id, "expense removed");
        Ok(expense)
    }
}

/// Log storage failures with their cause before they are collapsed into a
/// generic response.
pub fn log_failure(err: &BudgetError) {
    match err {
        BudgetError::Storage(cause) => tracing::error!(error = %cause, "storage failure"),
        other => tracing::debug!(error = %other, "request rejected"),
    }
}
