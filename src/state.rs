// Budget state - Category Registry + Budget Map + Expense Ledger
//
// The three sub-stores are folded into one value so every operation can
// enforce the cross-cutting invariants in one place:
// - every budget key is a registered category
// - every registered category has exactly one budget entry
// - every expense references a registered category (no orphans)

use crate::error::{BudgetError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Trim and title-case a category name.
///
/// Each run of alphabetic characters gets its first letter upper-cased and
/// the rest lower-cased: "food & dining" -> "Food & Dining".
pub fn normalize_category(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;

    for ch in name.trim().chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }

    out
}

/// Largest accepted budget limit or expense amount
pub const MAX_AMOUNT: f64 = 1e12;

/// Parse a monetary amount supplied as a JSON number or numeric string.
///
/// Returns None for anything that is not a finite number with magnitude
/// at most MAX_AMOUNT.
pub fn parse_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    (amount.is_finite() && amount.abs() <= MAX_AMOUNT).then_some(amount)
}

// ============================================================================
// EXPENSE
// ============================================================================

/// A single logged transaction against a category. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Stable identity (UUID v4)
    pub id: String,
    pub category: String,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
}

// ============================================================================
// BUDGET STATE
// ============================================================================

/// Full application state, serialized as `{budget, expenses, categories}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BudgetState {
    #[serde(default)]
    pub budget: BTreeMap<String, f64>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl BudgetState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c == name)
    }

    /// Budget limit for a category (implicit 0 when absent)
    pub fn limit_for(&self, category: &str) -> f64 {
        self.budget.get(category).copied().unwrap_or(0.0)
    }

    // ========================================================================
    // CATEGORY REGISTRY
    // ========================================================================

    /// Register a category with a zero budget. Returns the normalized name.
    pub fn add_category(&mut self, name: &str) -> Result<String> {
        let name = normalize_category(name);
        if name.is_empty() {
            return Err(BudgetError::EmptyCategory);
        }
        if self.has_category(&name) {
            return Err(BudgetError::DuplicateCategory(name));
        }

        self.categories.push(name.clone());
        self.budget.insert(name.clone(), 0.0);
        Ok(name)
    }

    /// Remove a category, its budget entry and every expense logged against it.
    ///
    /// Returns the number of expenses deleted by the cascade.
    pub fn remove_category(&mut self, name: &str) -> Result<usize> {
        let name = normalize_category(name);
        if name.is_empty() {
            return Err(BudgetError::EmptyCategory);
        }
        if !self.has_category(&name) {
            return Err(BudgetError::CategoryNotFound(name));
        }

        self.categories.retain(|c| c != &name);
        self.budget.remove(&name);

        let before = self.expenses.len();
        self.expenses.retain(|e| e.category != name);
        Ok(before - self.expenses.len())
    }

    /// Replace the whole registry with a de-duplicated, order-preserving list.
    ///
    /// Categories that disappear cascade exactly like `remove_category`;
    /// survivors keep their budget and expenses; new ones start at zero.
    pub fn replace_categories<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        let next: Vec<String> = names
            .iter()
            .map(|n| normalize_category(n.as_ref()))
            .filter(|n| !n.is_empty())
            .filter(|n| seen.insert(n.clone()))
            .collect();

        let removed: Vec<String> = self
            .categories
            .iter()
            .filter(|c| !seen.contains(*c))
            .cloned()
            .collect();

        for name in &removed {
            self.budget.remove(name);
        }
        self.expenses.retain(|e| seen.contains(&e.category));

        for name in &next {
            self.budget.entry(name.clone()).or_insert(0.0);
        }
        self.categories = next;

        removed
    }

    // ========================================================================
    // BUDGET MAP
    // ========================================================================

    /// Apply a partial `{category: amount}` update.
    ///
    /// Registered categories missing from `mapping` keep their stored limit.
    /// Keys naming unregistered categories are ignored. The update is
    /// validated completely before anything is applied.
    pub fn set_budgets(&mut self, mapping: &serde_json::Map<String, Value>) -> Result<()> {
        let supplied: BTreeMap<String, &Value> = mapping
            .iter()
            .map(|(k, v)| (normalize_category(k), v))
            .collect();

        let mut next = BTreeMap::new();
        for category in &self.categories {
            let limit = match supplied.get(category) {
                Some(value) => match parse_amount(value) {
                    Some(amount) if amount >= 0.0 => amount,
                    _ => {
                        return Err(BudgetError::InvalidAmount(format!(
                            "budget for '{}' must be a non-negative number, got {}",
                            category, value
                        )))
                    }
                },
                None => self.limit_for(category),
            };
            next.insert(category.clone(), limit);
        }

        self.budget = next;
        Ok(())
    }

    /// Restore the budget-map invariants after loading hand-edited storage.
    ///
    /// Returns true if anything changed.
    pub fn repair(&mut self) -> bool {
        let registered: HashSet<&String> = self.categories.iter().collect();
        let before = self.budget.len();
        self.budget.retain(|k, _| registered.contains(k));
        let mut changed = self.budget.len() != before;

        for category in &self.categories {
            if !self.budget.contains_key(category) {
                self.budget.insert(category.clone(), 0.0);
                changed = true;
            }
        }

        changed
    }

    // ========================================================================
    // EXPENSE LEDGER
    // ========================================================================

    /// Append an expense dated `date`. Returns the created record.
    pub fn add_expense(
        &mut self,
        category: &str,
        amount: &Value,
        description: Option<&str>,
        date: NaiveDate,
    ) -> Result<Expense> {
        let category = normalize_category(category);
        if !self.has_category(&category) {
            return Err(BudgetError::UnknownCategory(category));
        }

        let amount = match parse_amount(amount) {
            Some(a) if a > 0.0 => a,
            _ => {
                return Err(BudgetError::InvalidAmount(format!(
                    "expense amount must be a positive number, got {}",
                    amount
                )))
            }
        };

        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from);

        let expense = Expense {
            id: uuid::Uuid::new_v4().to_string(),
            category,
            amount,
            date,
            description,
        };
        self.expenses.push(expense.clone());
        Ok(expense)
    }

    /// Delete an expense by id. Returns the removed record.
    pub fn remove_expense(&mut self, id: &str) -> Result<Expense> {
        let idx = self
            .expenses
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| BudgetError::ExpenseNotFound(id.to_string()))?;

        Ok(self.expenses.remove(idx))
    }
}
