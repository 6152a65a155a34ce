//! Dashboard commands.

use crate::{
    cli::{AppContext, Output, output::money_line, today},
    core::{dashboard, money::format_amount},
    entities::user,
    errors::Result,
};
use chrono::Datelike;
use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum DashboardCommand {
    /// Headline figures for a window ending today
    Summary {
        /// week, month or year
        #[arg(long, default_value = "month")]
        timeframe: String,
    },
    /// Cash flow per week of a month (defaults to the current one)
    Weekly {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
    /// Spending per category for a window ending today
    Categories {
        #[arg(long, default_value = "month")]
        timeframe: String,
    },
    /// Latest transactions
    Recent {
        #[arg(long)]
        limit: Option<u64>,
    },
}

pub async fn run(
    ctx: &AppContext,
    user: &user::Model,
    command: DashboardCommand,
    out: Output,
) -> Result<()> {
    let db = &ctx.database;
    let today = today();

    match command {
        DashboardCommand::Summary { timeframe } => {
            let summary = dashboard::summary(db, user.id, timeframe.parse()?, today).await?;
            out.emit(&summary, |s| {
                format!(
                    "🏠 {} to {}: {} transactions, {} imports\n{}\n{}\n{}\n{}\nSavings rate: {:.2}%",
                    s.start_date,
                    s.end_date,
                    s.total_transactions,
                    s.recent_imports,
                    money_line("Income", s.income),
                    money_line("Expenses", s.expenses),
                    money_line("Balance", s.balance),
                    money_line("Average", s.avg_transaction),
                    s.savings_rate,
                )
            })
        }
        DashboardCommand::Weekly { year, month } => {
            let year = year.unwrap_or_else(|| today.year());
            let month = month.unwrap_or_else(|| today.month());
            let weeks = dashboard::weekly_breakdown(db, user.id, year, month).await?;
            out.emit(&weeks, |weeks| {
                weeks
                    .iter()
                    .map(|w| {
                        format!(
                            "{:<7} in {:>12}  out {:>12}  net {:>12}",
                            w.period,
                            format_amount(w.income),
                            format_amount(w.expenses),
                            format_amount(w.amount),
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        DashboardCommand::Categories { timeframe } => {
            let rows = dashboard::category_summary(db, user.id, timeframe.parse()?, today).await?;
            out.emit(&rows, |rows| {
                if rows.is_empty() {
                    return "📭 No spending in this window.".to_string();
                }
                rows.iter()
                    .map(|c| format!("{:<18} {:>12} {:>3}%", c.category, format_amount(c.amount), c.percentage))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        DashboardCommand::Recent { limit } => {
            let rows = dashboard::recent(db, user.id, limit).await?;
            out.emit(&rows, |rows| {
                if rows.is_empty() {
                    return "📭 No transactions yet.".to_string();
                }
                rows.iter()
                    .map(|t| {
                        format!(
                            "#{:<5} {}  {:>12}  {:<16} {}",
                            t.id,
                            t.date,
                            format_amount(t.amount),
                            t.category.as_deref().unwrap_or("-"),
                            t.description,
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}
