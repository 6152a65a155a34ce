//! Budget commands.

use crate::{
    cli::{AppContext, Output, clearable, today},
    core::{
        budget::{self, BudgetChanges, NewBudget},
        money::{format_amount, format_progress_bar},
    },
    entities::{budget as budget_entity, user},
    errors::Result,
};
use chrono::{Datelike, NaiveDate};
use clap::Subcommand;
use std::fmt::Write;

#[derive(Debug, Subcommand)]
pub enum BudgetCommand {
    /// Create a budget for a category
    Add {
        category: String,
        amount: f64,
        #[arg(long, default_value = "monthly")]
        period: String,
        /// Defaults to today
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List budgets
    List,
    /// Show one budget
    Show { id: i64 },
    /// Change fields of a budget
    Update {
        id: i64,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Remove the end date
        #[arg(long, conflicts_with = "end")]
        no_end: bool,
        /// Empty text clears the notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a budget
    Delete { id: i64 },
    /// Spending against each budget for a month (defaults to the current one)
    Progress {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
}

fn budget_line(b: &budget_entity::Model) -> String {
    format!(
        "#{:<4} {:<16} {:>12} {}  from {}{}",
        b.id,
        b.category,
        format_amount(b.amount),
        b.period,
        b.start_date,
        b.end_date.map(|d| format!(" to {d}")).unwrap_or_default(),
    )
}

pub async fn run(
    ctx: &AppContext,
    user: &user::Model,
    command: BudgetCommand,
    out: Output,
) -> Result<()> {
    let db = &ctx.database;

    match command {
        BudgetCommand::Add {
            category,
            amount,
            period,
            start,
            end,
            notes,
        } => {
            let input = NewBudget {
                category,
                amount,
                period,
                start_date: start.unwrap_or_else(today),
                end_date: end,
                notes,
            };
            let created = budget::create_budget(db, user.id, input).await?;
            out.emit(&created, |b| format!("✅ Created budget\n{}", budget_line(b)))
        }
        BudgetCommand::List => {
            let budgets = budget::list_budgets(db, user.id).await?;
            out.emit(&budgets, |budgets| {
                if budgets.is_empty() {
                    return "📭 No budgets yet. Create one with `budget add`.".to_string();
                }
                budgets.iter().map(budget_line).collect::<Vec<_>>().join("\n")
            })
        }
        BudgetCommand::Show { id } => {
            let found = budget::get_budget(db, user.id, id).await?;
            out.emit(&found, |b| {
                format!(
                    "{}\nNotes: {}",
                    budget_line(b),
                    b.notes.as_deref().unwrap_or("-")
                )
            })
        }
        BudgetCommand::Update {
            id,
            category,
            amount,
            period,
            start,
            end,
            no_end,
            notes,
        } => {
            let changes = BudgetChanges {
                category,
                amount,
                period,
                start_date: start,
                end_date: if no_end { Some(None) } else { end.map(Some) },
                notes: clearable(notes),
            };
            let updated = budget::update_budget(db, user.id, id, changes).await?;
            out.emit(&updated, |b| format!("✅ Updated budget\n{}", budget_line(b)))
        }
        BudgetCommand::Delete { id } => {
            budget::delete_budget(db, user.id, id).await?;
            out.success(&format!("Deleted budget #{id}"))
        }
        BudgetCommand::Progress { year, month } => {
            let now = today();
            let year = year.unwrap_or_else(|| now.year());
            let month = month.unwrap_or_else(|| now.month());
            let report = budget::progress_report(db, user.id, year, month).await?;
            out.emit(&report, |rows| {
                if rows.is_empty() {
                    return format!("📭 No budgets active in {year}-{month:02}.");
                }
                let mut text = format!("📊 Budgets for {year}-{month:02}\n");
                for p in rows {
                    let _ = writeln!(
                        text,
                        "{:<16} {} {:>5.1}%  {} of {} ({} left)",
                        p.category,
                        format_progress_bar(p.percent_used, Some(10)),
                        p.percent_used,
                        format_amount(p.spent),
                        format_amount(p.budgeted),
                        format_amount(p.remaining),
                    );
                }
                text.trim_end().to_string()
            })
        }
    }
}
