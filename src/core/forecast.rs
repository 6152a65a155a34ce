//! Forward projections built from a user's transaction history.
//!
//! All projections start the month after `today` and grow by 0.2% per month ahead.
//! December and January carry fixed seasonal adjustments, and holiday shopping is
//! raised in November and December. Figures are rounded to cents for display.

use crate::{
    core::{money::round_half_ceil, period, transaction as tx},
    entities::transaction,
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::instrument;

const MONTHLY_GROWTH: f64 = 0.002;
const MONTHLY_INTEREST: f64 = 0.002;
const STARTING_SAVINGS_MONTHS: f64 = 3.0;

/// Projected income, expenses and savings for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthForecast {
    pub month: String,
    pub income: f64,
    pub expenses: f64,
    pub savings: f64,
}

/// Projected amounts per category for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryProjection {
    pub month: String,
    /// Keyed by lowercase category name; rows without a category go under `other`
    pub categories: BTreeMap<String, f64>,
    pub total: f64,
}

/// Projected savings balance for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsPoint {
    pub month: String,
    pub monthly_savings: f64,
    pub interest_earned: f64,
    pub total_savings: f64,
}

/// Totals projected over an explicit date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomForecast {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub months: i64,
    pub total_income: f64,
    pub total_expenses: f64,
    pub total_savings: f64,
    pub savings_rate: f64,
}

fn trend(months_ahead: u32) -> f64 {
    f64::from(months_ahead).mul_add(MONTHLY_GROWTH, 1.0)
}

fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0_u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / f64::from(count) }
}

/// Target months as `(months_ahead, date)` pairs, starting the month after `today`.
fn horizon(today: NaiveDate, months: u32) -> Result<Vec<(u32, NaiveDate)>> {
    (1..=months)
        .map(|i| {
            let offset = i32::try_from(i)?;
            Ok((i, period::shift_months(today, offset)?))
        })
        .collect()
}

/// Average monthly income and expenses over every month that has any transaction.
///
/// A month with only expenses counts as zero income, and the other way round.
#[must_use]
pub fn overall_monthly_averages(transactions: &[transaction::Model]) -> (f64, f64) {
    let mut months: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();
    for t in transactions {
        let entry = months.entry(period::year_month(t.date)).or_default();
        if t.amount > 0.0 {
            entry.0 += t.amount;
        } else if t.amount < 0.0 {
            entry.1 += t.amount.abs();
        }
    }
    (
        mean(months.values().map(|m| m.0)),
        mean(months.values().map(|m| m.1)),
    )
}

/// Average monthly income over months with income, and average monthly expenses
/// over months with expenses.
#[must_use]
pub fn separate_monthly_averages(transactions: &[transaction::Model]) -> (f64, f64) {
    let mut income: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    let mut expenses: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for t in transactions {
        if t.amount > 0.0 {
            *income.entry(period::year_month(t.date)).or_default() += t.amount;
        } else if t.amount < 0.0 {
            *expenses.entry(period::year_month(t.date)).or_default() += t.amount.abs();
        }
    }
    (mean(income.into_values()), mean(expenses.into_values()))
}

/// Month-by-month projection of income, expenses and savings.
pub fn project_cash_flow(
    transactions: &[transaction::Model],
    today: NaiveDate,
    months: u32,
) -> Result<Vec<MonthForecast>> {
    let (avg_income, avg_expenses) = overall_monthly_averages(transactions);

    horizon(today, months)?
        .into_iter()
        .map(|(i, date)| {
            let income = avg_income * trend(i);
            let expenses = avg_expenses
                * trend(i)
                * match date.month() {
                    12 => 1.2,
                    1 => 0.9,
                    _ => 1.0,
                };
            Ok(MonthForecast {
                month: period::month_label(date),
                income: round_half_ceil(income, 2),
                expenses: round_half_ceil(expenses, 2),
                savings: round_half_ceil(income - expenses, 2),
            })
        })
        .collect()
}

fn project_categories(
    amounts: &[(Option<&str>, f64)],
    today: NaiveDate,
    months: u32,
    seasonal: impl Fn(&str, u32) -> f64,
) -> Result<Vec<CategoryProjection>> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for (category, amount) in amounts {
        let key = category.map_or_else(|| "other".to_string(), str::to_lowercase);
        *totals.entry(key).or_default() += amount;
    }
    let count = f64::from(u32::try_from(amounts.len())?);

    horizon(today, months)?
        .into_iter()
        .map(|(i, date)| {
            let mut total = 0.0;
            let categories = totals
                .iter()
                .map(|(key, sum)| {
                    let projected = sum / count * trend(i) * seasonal(key, date.month());
                    total += projected;
                    (key.clone(), round_half_ceil(projected, 2))
                })
                .collect();
            Ok(CategoryProjection {
                month: period::month_label(date),
                categories,
                total: round_half_ceil(total, 2),
            })
        })
        .collect()
}

/// Per-category income projection.
///
/// Each category's base is its share of total income divided by the number of income
/// transactions, so categories with many small payments weigh the same as one large one.
pub fn project_income(
    transactions: &[transaction::Model],
    today: NaiveDate,
    months: u32,
) -> Result<Vec<CategoryProjection>> {
    let income: Vec<(Option<&str>, f64)> = transactions
        .iter()
        .filter(|t| t.amount > 0.0)
        .map(|t| (t.category.as_deref(), t.amount))
        .collect();
    project_categories(&income, today, months, |_, _| 1.0)
}

/// Per-category expense projection, with shopping up 30% in November and December.
pub fn project_expenses(
    transactions: &[transaction::Model],
    today: NaiveDate,
    months: u32,
) -> Result<Vec<CategoryProjection>> {
    let expenses: Vec<(Option<&str>, f64)> = transactions
        .iter()
        .filter(|t| t.amount < 0.0)
        .map(|t| (t.category.as_deref(), t.amount.abs()))
        .collect();
    project_categories(&expenses, today, months, |category, month| {
        if category == "shopping" && (month == 11 || month == 12) {
            1.3
        } else {
            1.0
        }
    })
}

/// Cumulative savings projection with monthly interest.
///
/// The balance starts at three months of current savings. December savings drop 30%
/// and January savings rise 20%.
pub fn project_savings(
    transactions: &[transaction::Model],
    today: NaiveDate,
    months: u32,
) -> Result<Vec<SavingsPoint>> {
    let (avg_income, avg_expenses) = separate_monthly_averages(transactions);
    let current = avg_income - avg_expenses;
    let mut cumulative = current * STARTING_SAVINGS_MONTHS;

    horizon(today, months)?
        .into_iter()
        .map(|(i, date)| {
            let projected = current
                * trend(i)
                * match date.month() {
                    12 => 0.7,
                    1 => 1.2,
                    _ => 1.0,
                };
            let interest = cumulative * MONTHLY_INTEREST;
            cumulative += projected + interest;
            Ok(SavingsPoint {
                month: period::month_label(date),
                monthly_savings: round_half_ceil(projected, 2),
                interest_earned: round_half_ceil(interest, 2),
                total_savings: round_half_ceil(cumulative, 2),
            })
        })
        .collect()
}

/// Totals over `start..=end` from average monthly income and expenses.
///
/// The range covers whole months between the dates plus one.
pub fn project_range(
    transactions: &[transaction::Model],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<CustomForecast> {
    if end < start {
        return Err(Error::validation(format!(
            "End date {end} is before start date {start}"
        )));
    }
    let months = period::whole_months_between(start, end) + 1;
    let (avg_income, avg_expenses) = separate_monthly_averages(transactions);

    #[allow(clippy::cast_precision_loss)]
    let factor = months as f64;
    let total_income = avg_income * factor;
    let total_expenses = avg_expenses * factor;
    let total_savings = total_income - total_expenses;
    let savings_rate = if total_income > 0.0 {
        total_savings / total_income * 100.0
    } else {
        0.0
    };

    Ok(CustomForecast {
        start_date: start,
        end_date: end,
        months,
        total_income: round_half_ceil(total_income, 2),
        total_expenses: round_half_ceil(total_expenses, 2),
        total_savings: round_half_ceil(total_savings, 2),
        savings_rate: round_half_ceil(savings_rate, 1),
    })
}

/// Cash flow forecast for the user.
#[instrument(skip(db))]
pub async fn forecast(
    db: &DatabaseConnection,
    user_id: i64,
    today: NaiveDate,
    months: u32,
) -> Result<Vec<MonthForecast>> {
    let history = tx::all_for_user(db, user_id).await?;
    project_cash_flow(&history, today, months)
}

/// Income projection for the user.
#[instrument(skip(db))]
pub async fn income_projection(
    db: &DatabaseConnection,
    user_id: i64,
    today: NaiveDate,
    months: u32,
) -> Result<Vec<CategoryProjection>> {
    let history = tx::all_for_user(db, user_id).await?;
    project_income(&history, today, months)
}

/// Expense projection for the user.
#[instrument(skip(db))]
pub async fn expense_projection(
    db: &DatabaseConnection,
    user_id: i64,
    today: NaiveDate,
    months: u32,
) -> Result<Vec<CategoryProjection>> {
    let history = tx::all_for_user(db, user_id).await?;
    project_expenses(&history, today, months)
}

/// Savings projection for the user.
#[instrument(skip(db))]
pub async fn savings_projection(
    db: &DatabaseConnection,
    user_id: i64,
    today: NaiveDate,
    months: u32,
) -> Result<Vec<SavingsPoint>> {
    let history = tx::all_for_user(db, user_id).await?;
    project_savings(&history, today, months)
}

/// Range forecast for the user.
#[instrument(skip(db))]
pub async fn custom(
    db: &DatabaseConnection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<CustomForecast> {
    let history = tx::all_for_user(db, user_id).await?;
    project_range(&history, start, end)
}
