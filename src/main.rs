use anyhow::{bail, Context, Result};
use budget_tracker::logging::init_tracing;
use budget_tracker::{open_store, BudgetService, Config, Expense, Report, SqliteStore, StoreKind};
use serde::Serialize;
use std::env;
use std::path::Path;

const USAGE: &str = "usage: budget-tracker <report | state | seed | export <file.csv>>";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format);

    match args.get(1).map(String::as_str) {
        Some("report") | None => run_report(&config),
        Some("state") => run_state(&config),
        Some("seed") => run_seed(&config),
        Some("export") => match args.get(2) {
            Some(path) => run_export(&config, Path::new(path)),
            None => bail!("{}", USAGE),
        },
        Some(other) => bail!("unknown command '{}'\n{}", other, USAGE),
    }
}

fn open_service(config: &Config) -> Result<BudgetService> {
    let store = open_store(&config.store).context("Failed to open budget store")?;
    Ok(BudgetService::new(store))
}

fn run_report(config: &Config) -> Result<()> {
    let report = open_service(config)?.report()?;
    print!("{}", render_report(&report));
    Ok(())
}

fn render_report(report: &Report) -> String {
    let mut out = format!(
        "{:<20} {:>10} {:>10} {:>11}  {}\n",
        "Category", "Spent", "Budget", "Difference", "Status"
    );
    out.push_str(&"-".repeat(68));
    out.push('\n');

    for row in &report.report {
        out.push_str(&format!(
            "{:<20} {:>10.2} {:>10.2} {:>11.2}  {}\n",
            row.category,
            row.spent,
            row.budget,
            row.difference,
            row.status.as_str()
        ));
    }

    out.push_str(&"-".repeat(68));
    out.push('\n');
    out.push_str(&format!(
        "{:<20} {:>10.2} {:>10.2}\n",
        "Total", report.total_spent, report.total_budget
    ));
    out
}

fn run_state(config: &Config) -> Result<()> {
    let state = open_service(config)?.state()?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn run_seed(config: &Config) -> Result<()> {
    if config.store.kind != StoreKind::Sqlite {
        println!("Nothing to seed: the {:?} store has no schema", config.store.kind);
        return Ok(());
    }

    let store = SqliteStore::open(&config.store.path)
        .with_context(|| format!("Failed to open {}", config.store.path.display()))?;
    let inserted = store.seed_defaults()?;
    println!("✓ Schema ready at {}", config.store.path.display());
    println!("✓ Seeded {} default categories", inserted);
    Ok(())
}

#[derive(Serialize)]
struct ExpenseRecord<'a> {
    id: &'a str,
    date: String,
    category: &'a str,
    amount: f64,
    description: &'a str,
}

impl<'a> From<&'a Expense> for ExpenseRecord<'a> {
    fn from(e: &'a Expense) -> Self {
        ExpenseRecord {
            id: &e.id,
            date: e.date.format("%Y-%m-%d").to_string(),
            category: &e.category,
            amount: e.amount,
            description: e.description.as_deref().unwrap_or(""),
        }
    }
}

fn write_expenses_csv<W: std::io::Write>(writer: W, expenses: &[Expense]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for expense in expenses {
        wtr.serialize(ExpenseRecord::from(expense))?;
    }
    wtr.flush()?;
    Ok(())
}

fn run_export(config: &Config, path: &Path) -> Result<()> {
    let report = open_service(config)?.report()?;
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_expenses_csv(file, &report.expenses_log)?;
    println!("✓ Exported {} expenses to {}", report.expenses_log.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use budget_tracker::{generate_report, BudgetState};
    use chrono::NaiveDate;
    use serde_json::json;

    fn sample() -> BudgetState {
        let mut state = BudgetState::new();
        state.add_category("Food").unwrap();
        state.add_category("Travel").unwrap();
        state
            .set_budgets(json!({"Food": 100, "Travel": 50}).as_object().unwrap())
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        state.add_expense("Food", &json!(110), Some("feast, big"), day).unwrap();
        state.add_expense("Travel", &json!(10), None, day).unwrap();
        state
    }

    #[test]
    fn test_render_report() {
        let text = render_report(&generate_report(&sample()));

        assert!(text.contains("Food"));
        assert!(text.contains("Over Budget"));
        assert!(text.contains("Within Budget"));
        assert!(text.lines().last().unwrap().contains("120.00"));
    }

    #[test]
    fn test_export_csv() {
        let state = sample();
        let mut buf = Vec::new();
        write_expenses_csv(&mut buf, &state.expenses).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,date,category,amount,description");
        assert!(lines[1].ends_with(",2024-12-01,Food,110.0,\"feast, big\""));
        assert!(lines[2].ends_with(",2024-12-01,Travel,10.0,"));
        assert_eq!(lines.len(), 3);
    }
}
