//! Analytics commands.

use crate::{
    cli::{AppContext, Output, output::money_line, today},
    core::{analytics, money::format_amount, period},
    entities::user,
    errors::Result,
};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use std::fmt::Write;

/// Date range shared by the analytics commands; defaults to the last month.
#[derive(Debug, Clone, Copy, Args)]
pub struct Range {
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long)]
    end: Option<NaiveDate>,
}

impl Range {
    fn resolve(self) -> Result<(NaiveDate, NaiveDate)> {
        let end = self.end.unwrap_or_else(today);
        let start = match self.start {
            Some(start) => start,
            None => period::shift_months(end, -1)?,
        };
        Ok((start, end))
    }
}

#[derive(Debug, Subcommand)]
pub enum AnalyticsCommand {
    /// Income, expenses, balance and savings rate
    Summary {
        #[command(flatten)]
        range: Range,
    },
    /// Spending per category
    Categories {
        #[command(flatten)]
        range: Range,
    },
    /// Income and expenses per day, week or month
    Trends {
        #[command(flatten)]
        range: Range,
        /// daily, weekly or monthly
        #[arg(long, default_value = "monthly")]
        interval: String,
    },
    /// Previously computed results, newest first
    History,
}

pub async fn run(
    ctx: &AppContext,
    user: &user::Model,
    command: AnalyticsCommand,
    out: Output,
) -> Result<()> {
    let db = &ctx.database;

    match command {
        AnalyticsCommand::Summary { range } => {
            let (start, end) = range.resolve()?;
            let summary = analytics::summary(db, user.id, start, end).await?;
            out.emit(&summary, |s| {
                format!(
                    "📊 {} to {} ({} transactions)\n{}\n{}\n{}\nSavings rate: {:.2}%",
                    s.start_date,
                    s.end_date,
                    s.transaction_count,
                    money_line("Income", s.total_income),
                    money_line("Expenses", s.total_expenses),
                    money_line("Balance", s.balance),
                    s.savings_rate,
                )
            })
        }
        AnalyticsCommand::Categories { range } => {
            let (start, end) = range.resolve()?;
            let breakdown = analytics::category_breakdown(db, user.id, start, end).await?;
            out.emit(&breakdown, |b| {
                let mut text = format!("📊 Spending {} to {}\n", b.start_date, b.end_date);
                for (name, share) in &b.categories {
                    let _ = writeln!(
                        text,
                        "{name:<18} {:>12} {:>6.2}%",
                        format_amount(share.amount),
                        share.percentage
                    );
                }
                let _ = write!(text, "{}", money_line("Total", b.total));
                text
            })
        }
        AnalyticsCommand::Trends { range, interval } => {
            let (start, end) = range.resolve()?;
            let interval = interval.parse()?;
            let points = analytics::trends(db, user.id, start, end, interval).await?;
            out.emit(&points, |points| {
                if points.is_empty() {
                    return "📭 No transactions in range.".to_string();
                }
                points
                    .iter()
                    .map(|p| {
                        format!(
                            "{:<10} in {:>12}  out {:>12}  net {:>12}",
                            p.interval,
                            format_amount(p.income),
                            format_amount(p.expenses),
                            format_amount(p.balance),
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        AnalyticsCommand::History => {
            let results = analytics::history(db, user.id).await?;
            out.emit(&results, |results| {
                if results.is_empty() {
                    return "📭 No analytics computed yet.".to_string();
                }
                results
                    .iter()
                    .map(|r| {
                        format!(
                            "#{:<4} {:<9} {}  {}",
                            r.id,
                            r.result_type,
                            r.created_at.format("%Y-%m-%d %H:%M"),
                            r.parameters
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}
