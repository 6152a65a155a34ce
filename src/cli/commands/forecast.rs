//! Forecast commands.

use crate::{
    cli::{AppContext, Output, output::money_line, today},
    core::{
        forecast::{self, CategoryProjection},
        money::format_amount,
    },
    entities::user,
    errors::Result,
};
use chrono::NaiveDate;
use clap::Subcommand;

const DEFAULT_MONTHS: &str = "6";

#[derive(Debug, Subcommand)]
pub enum ForecastCommand {
    /// Monthly income, expenses and savings
    Overview {
        #[arg(long, default_value = DEFAULT_MONTHS)]
        months: u32,
    },
    /// Income by category
    Income {
        #[arg(long, default_value = DEFAULT_MONTHS)]
        months: u32,
    },
    /// Expenses by category
    Expenses {
        #[arg(long, default_value = DEFAULT_MONTHS)]
        months: u32,
    },
    /// Cumulative savings with interest
    Savings {
        #[arg(long, default_value = DEFAULT_MONTHS)]
        months: u32,
    },
    /// Totals between two dates
    Custom { start: NaiveDate, end: NaiveDate },
}

fn category_table(rows: &[CategoryProjection]) -> String {
    rows.iter()
        .map(|row| {
            let parts = row
                .categories
                .iter()
                .map(|(name, amount)| format!("{name} {}", format_amount(*amount)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{:<9} {:>12}  {parts}", row.month, format_amount(row.total))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn run(
    ctx: &AppContext,
    user: &user::Model,
    command: ForecastCommand,
    out: Output,
) -> Result<()> {
    let db = &ctx.database;
    let today = today();

    match command {
        ForecastCommand::Overview { months } => {
            let rows = forecast::forecast(db, user.id, today, months).await?;
            out.emit(&rows, |rows| {
                rows.iter()
                    .map(|r| {
                        format!(
                            "{:<9} in {:>12}  out {:>12}  saved {:>12}",
                            r.month,
                            format_amount(r.income),
                            format_amount(r.expenses),
                            format_amount(r.savings),
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        ForecastCommand::Income { months } => {
            let rows = forecast::income_projection(db, user.id, today, months).await?;
            out.emit(&rows, |rows| category_table(rows))
        }
        ForecastCommand::Expenses { months } => {
            let rows = forecast::expense_projection(db, user.id, today, months).await?;
            out.emit(&rows, |rows| category_table(rows))
        }
        ForecastCommand::Savings { months } => {
            let rows = forecast::savings_projection(db, user.id, today, months).await?;
            out.emit(&rows, |rows| {
                rows.iter()
                    .map(|r| {
                        format!(
                            "{:<9} +{:>11}  interest {:>9}  total {:>12}",
                            r.month,
                            format_amount(r.monthly_savings),
                            format_amount(r.interest_earned),
                            format_amount(r.total_savings),
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        ForecastCommand::Custom { start, end } => {
            let projection = forecast::custom(db, user.id, start, end).await?;
            out.emit(&projection, |p| {
                format!(
                    "🔮 {} to {} ({} months)\n{}\n{}\n{}\nSavings rate: {:.1}%",
                    p.start_date,
                    p.end_date,
                    p.months,
                    money_line("Income", p.total_income),
                    money_line("Expenses", p.total_expenses),
                    money_line("Savings", p.total_savings),
                    p.savings_rate,
                )
            })
        }
    }
}
