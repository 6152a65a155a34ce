//! Dashboard widgets: headline totals, weekly cash flow, spending by category and the
//! latest transactions.

use crate::{
    core::{
        money::{round_cents, round_half_away},
        period::{self, Timeframe},
        transaction as tx,
    },
    entities::transaction,
    errors::Result,
};
use chrono::{Datelike, NaiveDate};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{info, instrument};

/// Number of rows [`recent`] returns when no limit is given.
pub const DEFAULT_RECENT_LIMIT: u64 = 5;

const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub timeframe: Timeframe,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_transactions: usize,
    pub total_amount: f64,
    /// Mean absolute amount, in cents precision
    pub avg_transaction: f64,
    /// Distinct imports that contributed rows to the window
    pub recent_imports: usize,
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
    pub savings_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekFlow {
    pub period: String,
    /// Income minus expenses
    pub amount: f64,
    pub income: f64,
    pub expenses: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub category: String,
    pub amount: f64,
    pub percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentTransaction {
    pub id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub category: Option<String>,
    pub amount: f64,
}

impl From<transaction::Model> for RecentTransaction {
    fn from(t: transaction::Model) -> Self {
        Self {
            id: t.id,
            date: t.date,
            description: t.description,
            category: t.category,
            amount: t.amount,
        }
    }
}

/// Headline figures for `transactions` dated within the window.
#[must_use]
pub fn summarize(
    timeframe: Timeframe,
    start: NaiveDate,
    end: NaiveDate,
    transactions: &[transaction::Model],
) -> DashboardSummary {
    let income: f64 = transactions.iter().filter(|t| t.amount > 0.0).map(|t| t.amount).sum();
    let expenses: f64 = transactions
        .iter()
        .filter(|t| t.amount < 0.0)
        .map(|t| t.amount.abs())
        .sum();
    let balance = income - expenses;

    #[allow(clippy::cast_precision_loss)]
    let avg_transaction = if transactions.is_empty() {
        0.0
    } else {
        let total: f64 = transactions.iter().map(|t| t.amount.abs()).sum();
        round_cents(total / transactions.len() as f64)
    };
    let recent_imports = transactions
        .iter()
        .filter_map(|t| t.import_id)
        .collect::<HashSet<_>>()
        .len();
    let savings_rate = if income > 0.0 {
        round_half_away(round_half_away(balance / income, 4) * 100.0, 1)
    } else {
        0.0
    };

    DashboardSummary {
        timeframe,
        start_date: start,
        end_date: end,
        total_transactions: transactions.len(),
        total_amount: balance,
        avg_transaction,
        recent_imports,
        income,
        expenses,
        balance,
        savings_rate,
    }
}

/// Week of the month a date falls in: days 1-7 are week 1, 29-31 are week 5.
#[must_use]
pub fn week_of_month(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}

/// Cash flow per week of the month. Weeks one to four are always present; week five
/// only when it has transactions.
#[must_use]
pub fn weekly_flows(transactions: &[transaction::Model]) -> Vec<WeekFlow> {
    let mut weeks: BTreeMap<u32, (f64, f64, usize)> = (1..=5).map(|w| (w, (0.0, 0.0, 0))).collect();
    for t in transactions {
        let entry = weeks.entry(week_of_month(t.date)).or_default();
        if t.amount > 0.0 {
            entry.0 += t.amount;
        } else if t.amount < 0.0 {
            entry.1 += t.amount.abs();
        }
        entry.2 += 1;
    }

    weeks
        .into_iter()
        .filter(|(week, (_, _, count))| *week <= 4 || *count > 0)
        .map(|(week, (income, expenses, _))| WeekFlow {
            period: format!("Week {week}"),
            amount: income - expenses,
            income,
            expenses,
        })
        .collect()
}

/// Expense totals per category, largest first. Blank categories count as
/// `Uncategorized`.
#[must_use]
pub fn spending_by_category(transactions: &[transaction::Model]) -> Vec<CategorySpend> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.amount < 0.0) {
        let category = t
            .category
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(UNCATEGORIZED);
        *totals.entry(category.to_string()).or_default() += t.amount.abs();
    }
    let total: f64 = totals.values().sum();

    let mut rows: Vec<CategorySpend> = totals
        .into_iter()
        .map(|(category, amount)| {
            #[allow(clippy::cast_possible_truncation)]
            let percentage = if total > 0.0 {
                round_half_away(round_half_away(amount / total, 4) * 100.0, 0) as i64
            } else {
                0
            };
            CategorySpend {
                category,
                amount,
                percentage,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    rows
}

/// Headline figures for the window ending `today`.
#[instrument(skip(db))]
pub async fn summary(
    db: &DatabaseConnection,
    user_id: i64,
    timeframe: Timeframe,
    today: NaiveDate,
) -> Result<DashboardSummary> {
    let start = timeframe.start_from(today)?;
    let rows = tx::between(db, user_id, start, today).await?;
    let summary = summarize(timeframe, start, today, &rows);
    info!(count = summary.total_transactions, "Built dashboard summary");
    Ok(summary)
}

/// Weekly cash flow for a calendar month.
#[instrument(skip(db))]
pub async fn weekly_breakdown(
    db: &DatabaseConnection,
    user_id: i64,
    year: i32,
    month: u32,
) -> Result<Vec<WeekFlow>> {
    let (start, end) = period::month_bounds(year, month)?;
    let rows = tx::between(db, user_id, start, end).await?;
    Ok(weekly_flows(&rows))
}

/// Spending per category for the window ending `today`.
#[instrument(skip(db))]
pub async fn category_summary(
    db: &DatabaseConnection,
    user_id: i64,
    timeframe: Timeframe,
    today: NaiveDate,
) -> Result<Vec<CategorySpend>> {
    let start = timeframe.start_from(today)?;
    let rows = tx::between(db, user_id, start, today).await?;
    Ok(spending_by_category(&rows))
}

/// The user's latest transactions, newest first.
pub async fn recent(
    db: &DatabaseConnection,
    user_id: i64,
    limit: Option<u64>,
) -> Result<Vec<RecentTransaction>> {
    Ok(tx::recent(db, user_id, limit.unwrap_or(DEFAULT_RECENT_LIMIT))
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}
