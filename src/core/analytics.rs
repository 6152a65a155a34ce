//! Analytics over a date range: totals, category breakdown and trends.
//!
//! Every computation is appended to the `analytics_results` log together with the
//! parameters that produced it.

use crate::{
    core::{money, transaction as tx},
    entities::{AnalyticsResult, analytics_result},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use serde_json::json;
use std::{collections::BTreeMap, fmt, str::FromStr};
use tracing::{info, instrument};

/// Log type for [`summary`].
pub const RESULT_SUMMARY: &str = "SUMMARY";
/// Log type for [`category_breakdown`].
pub const RESULT_CATEGORY: &str = "CATEGORY";
/// Log type for [`trends`].
pub const RESULT_TREND: &str = "TREND";

const UNCATEGORIZED: &str = "Uncategorized";

/// Income, expenses and savings rate over a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_income: f64,
    pub total_expenses: f64,
    pub balance: f64,
    /// Percentage of income kept; zero when there was no income
    pub savings_rate: f64,
    pub transaction_count: usize,
}

/// One category's share of spending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub amount: f64,
    pub percentage: f64,
}

/// Spending per category over a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub categories: BTreeMap<String, CategoryShare>,
    pub total: f64,
}

/// Bucket size for [`trends`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendInterval {
    Daily,
    Weekly,
    Monthly,
}

impl TrendInterval {
    /// Sortable bucket key: `2025-03-07`, `2025-W10` or `2025-03`.
    #[must_use]
    pub fn key(self, date: NaiveDate) -> String {
        match self {
            Self::Daily => date.format("%Y-%m-%d"),
            Self::Weekly => date.format("%G-W%V"),
            Self::Monthly => date.format("%Y-%m"),
        }
        .to_string()
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl FromStr for TrendInterval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(Error::validation(format!(
                "Unknown interval '{other}', expected daily, weekly or monthly"
            ))),
        }
    }
}

impl fmt::Display for TrendInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Totals for one trend bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub interval: String,
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
}

fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end < start {
        return Err(Error::validation(format!(
            "End date {end} is before start date {start}"
        )));
    }
    Ok(())
}

/// Pure summary over already-fetched amounts.
#[must_use]
pub fn summarize(start: NaiveDate, end: NaiveDate, amounts: &[f64]) -> FinancialSummary {
    let total_income = money::income_total(amounts);
    // Zero amounts fall on the expense side.
    let total_expenses: f64 = amounts.iter().filter(|a| **a <= 0.0).map(|a| a.abs()).sum();
    let balance = total_income - total_expenses;

    FinancialSummary {
        start_date: start,
        end_date: end,
        total_income,
        total_expenses,
        balance,
        savings_rate: money::ratio_percent(balance, total_income),
        transaction_count: amounts.len(),
    }
}

/// Pure category breakdown over `(category, amount)` pairs. Income is ignored.
#[must_use]
pub fn break_down<'a>(
    start: NaiveDate,
    end: NaiveDate,
    rows: impl IntoIterator<Item = (Option<&'a str>, f64)>,
) -> CategoryBreakdown {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for (category, amount) in rows {
        if amount >= 0.0 {
            continue;
        }
        let name = category
            .filter(|c| !c.is_empty())
            .unwrap_or(UNCATEGORIZED);
        *totals.entry(name.to_string()).or_default() += amount.abs();
    }

    let total: f64 = totals.values().sum();
    let categories = totals
        .into_iter()
        .map(|(name, amount)| {
            let percentage = money::ratio_percent(amount, total);
            (name, CategoryShare { amount, percentage })
        })
        .collect();

    CategoryBreakdown {
        start_date: start,
        end_date: end,
        categories,
        total,
    }
}

/// Pure trend bucketing over `(date, amount)` pairs, sorted by bucket key.
#[must_use]
pub fn bucket(
    interval: TrendInterval,
    rows: impl IntoIterator<Item = (NaiveDate, f64)>,
) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for (date, amount) in rows {
        let entry = buckets.entry(interval.key(date)).or_default();
        if amount > 0.0 {
            entry.0 += amount;
        } else {
            entry.1 += amount.abs();
        }
    }

    buckets
        .into_iter()
        .map(|(interval, (income, expenses))| TrendPoint {
            interval,
            income,
            expenses,
            balance: income - expenses,
        })
        .collect()
}

/// Income, expenses, balance and savings rate for the user between two dates.
#[instrument(skip(db))]
pub async fn summary(
    db: &DatabaseConnection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<FinancialSummary> {
    validate_range(start, end)?;
    let rows = tx::between(db, user_id, start, end).await?;
    info!(count = rows.len(), "Generating financial summary");

    let amounts: Vec<f64> = rows.iter().map(|t| t.amount).collect();
    let result = summarize(start, end, &amounts);

    record(
        db,
        user_id,
        RESULT_SUMMARY,
        json!({ "startDate": start, "endDate": end }),
        serde_json::to_value(&result)?,
    )
    .await?;
    Ok(result)
}

/// Spending per category for the user between two dates.
#[instrument(skip(db))]
pub async fn category_breakdown(
    db: &DatabaseConnection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<CategoryBreakdown> {
    validate_range(start, end)?;
    let rows = tx::between(db, user_id, start, end).await?;
    info!(count = rows.len(), "Generating category breakdown");

    let result = break_down(
        start,
        end,
        rows.iter().map(|t| (t.category.as_deref(), t.amount)),
    );

    record(
        db,
        user_id,
        RESULT_CATEGORY,
        json!({ "startDate": start, "endDate": end }),
        serde_json::to_value(&result)?,
    )
    .await?;
    Ok(result)
}

/// Income and expenses per interval for the user between two dates.
#[instrument(skip(db))]
pub async fn trends(
    db: &DatabaseConnection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    interval: TrendInterval,
) -> Result<Vec<TrendPoint>> {
    validate_range(start, end)?;
    let rows = tx::between(db, user_id, start, end).await?;
    info!(count = rows.len(), %interval, "Generating trends");

    let points = bucket(interval, rows.iter().map(|t| (t.date, t.amount)));

    record(
        db,
        user_id,
        RESULT_TREND,
        json!({ "startDate": start, "endDate": end, "interval": interval.as_str() }),
        json!({ "trends": &points }),
    )
    .await?;
    Ok(points)
}

async fn record(
    db: &DatabaseConnection,
    user_id: i64,
    result_type: &str,
    parameters: serde_json::Value,
    results: serde_json::Value,
) -> Result<analytics_result::Model> {
    analytics_result::ActiveModel {
        result_type: Set(result_type.to_string()),
        created_at: Set(chrono::Utc::now()),
        created_by: Set(user_id),
        parameters: Set(parameters),
        results: Set(results),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// The user's logged analytics results, newest first.
pub async fn history(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<analytics_result::Model>> {
    AnalyticsResult::find()
        .filter(analytics_result::Column::CreatedBy.eq(user_id))
        .order_by_desc(analytics_result::Column::CreatedAt)
        .order_by_desc(analytics_result::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
