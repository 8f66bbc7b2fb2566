// Report Generator - spent vs budget per category
//
// Pure read-side projection over BudgetState. Nothing here is persisted.

use crate::state::{BudgetState, Expense};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetStatus {
    #[serde(rename = "Within Budget")]
    WithinBudget,
    #[serde(rename = "Over Budget")]
    OverBudget,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::WithinBudget => "Within Budget",
            BudgetStatus::OverBudget => "Over Budget",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub category: String,
    pub spent: f64,
    pub budget: f64,
    pub difference: f64,
    pub status: BudgetStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub report: Vec<ReportRow>,
    pub total_spent: f64,
    pub total_budget: f64,
    pub expenses_log: Vec<Expense>,
}

/// Round to cents, leaving values too large to scale untouched.
fn round_cents(value: f64) -> f64 {
    let scaled = value * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        value
    }
}

/// Build the report. Rows are ordered alphabetically by category.
pub fn generate_report(state: &BudgetState) -> Report {
    let mut spent_by_category: HashMap<&str, f64> = HashMap::new();
    for expense in &state.expenses {
        *spent_by_category.entry(expense.category.as_str()).or_insert(0.0) += expense.amount;
    }

    let mut categories: Vec<&String> = state.categories.iter().collect();
    categories.sort();

    let mut total_spent = 0.0;
    let mut total_budget = 0.0;

    let report: Vec<ReportRow> = categories
        .into_iter()
        .map(|category| {
            let spent = round_cents(
                spent_by_category
                    .get(category.as_str())
                    .copied()
                    .unwrap_or(0.0),
            );
            let budget = round_cents(state.limit_for(category));
            let difference = round_cents(spent - budget);

            total_spent += spent;
            total_budget += budget;

            ReportRow {
                category: category.clone(),
                spent,
                budget,
                difference,
                status: if difference <= 0.0 {
                    BudgetStatus::WithinBudget
                } else {
                    BudgetStatus::OverBudget
                },
            }
        })
        .collect();

    let expenses_log = state
        .expenses
        .iter()
        .filter(|e| state.has_category(&e.category))
        .cloned()
        .collect();

    Report {
        report,
        total_spent: round_cents(total_spent),
        total_budget: round_cents(total_budget),
        expenses_log,
    }
}
