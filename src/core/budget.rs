//! Budget business logic.
//!
//! A budget caps spending in one category from `start_date` through an optional
//! `end_date`. Progress for a month is the sum of the absolute values of the owner's
//! expense transactions in that category, counted only for budgets that overlap the month.

use crate::{
    core::{period, transaction as tx},
    entities::{Budget, budget},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Input for [`create_budget`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    pub category: String,
    pub amount: f64,
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Partial update for [`update_budget`]; `None` leaves a field unchanged and
/// `Some(None)` clears an optional one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetChanges {
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub period: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub notes: Option<Option<String>>,
}

/// One budget's standing for a month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetProgress {
    pub budget_id: i64,
    pub category: String,
    pub budgeted: f64,
    pub spent: f64,
    pub remaining: f64,
    pub percent_used: f64,
}

fn validate(category: &str, amount: f64, start: NaiveDate, end: Option<NaiveDate>) -> Result<()> {
    if category.trim().is_empty() {
        return Err(Error::validation("Budget category cannot be empty"));
    }
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    if let Some(end) = end.filter(|end| *end < start) {
        return Err(Error::validation(format!(
            "Budget end date {end} is before its start date {start}"
        )));
    }
    Ok(())
}

/// Creates a budget for `user_id`.
#[instrument(skip(db, input), fields(category = %input.category))]
pub async fn create_budget(
    db: &DatabaseConnection,
    user_id: i64,
    input: NewBudget,
) -> Result<budget::Model> {
    validate(&input.category, input.amount, input.start_date, input.end_date)?;

    let created = budget::ActiveModel {
        category: Set(input.category),
        amount: Set(input.amount),
        period: Set(input.period),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        notes: Set(input.notes),
        created_by: Set(user_id),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(id = created.id, "Created budget");
    Ok(created)
}

/// Retrieves one of the user's budgets.
pub async fn get_budget(db: &DatabaseConnection, user_id: i64, budget_id: i64) -> Result<budget::Model> {
    Budget::find_by_id(budget_id)
        .one(db)
        .await?
        .filter(|b| b.created_by == user_id)
        .ok_or(Error::NotFound {
            entity: "Budget",
            id: budget_id,
        })
}

/// Lists the user's budgets by category.
pub async fn list_budgets<C: ConnectionTrait>(db: &C, user_id: i64) -> Result<Vec<budget::Model>> {
    Budget::find()
        .filter(budget::Column::CreatedBy.eq(user_id))
        .order_by_asc(budget::Column::Category)
        .order_by_asc(budget::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies the provided fields to one of the user's budgets.
pub async fn update_budget(
    db: &DatabaseConnection,
    user_id: i64,
    budget_id: i64,
    changes: BudgetChanges,
) -> Result<budget::Model> {
    let existing = get_budget(db, user_id, budget_id).await?;

    let category = changes.category.unwrap_or_else(|| existing.category.clone());
    let amount = changes.amount.unwrap_or(existing.amount);
    let start_date = changes.start_date.unwrap_or(existing.start_date);
    let end_date = changes.end_date.unwrap_or(existing.end_date);
    validate(&category, amount, start_date, end_date)?;

    let mut active: budget::ActiveModel = existing.into();
    active.category = Set(category);
    active.amount = Set(amount);
    active.start_date = Set(start_date);
    active.end_date = Set(end_date);
    if let Some(period) = changes.period {
        active.period = Set(period);
    }
    if let Some(notes) = changes.notes {
        active.notes = Set(notes);
    }

    let updated = active.update(db).await?;
    info!(id = updated.id, "Updated budget");
    Ok(updated)
}

/// Deletes one of the user's budgets.
pub async fn delete_budget(db: &DatabaseConnection, user_id: i64, budget_id: i64) -> Result<()> {
    let existing = get_budget(db, user_id, budget_id).await?;
    existing.delete(db).await?;
    info!(id = budget_id, "Deleted budget");
    Ok(())
}

/// Whether the budget overlaps `month_start..=month_end`.
#[must_use]
pub fn is_active_between(budget: &budget::Model, month_start: NaiveDate, month_end: NaiveDate) -> bool {
    budget.start_date <= month_end && budget.end_date.is_none_or(|end| end >= month_start)
}

/// Absolute expense total for `category` within `start..=end`.
pub async fn spent_in_category<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    category: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<f64> {
    let spent = tx::in_category(db, user_id, category)
        .await?
        .iter()
        .filter(|t| t.amount < 0.0 && t.date >= start && t.date <= end)
        .map(|t| t.amount.abs())
        .sum();
    Ok(spent)
}

/// Spending per category for every budget active in the given month.
pub async fn progress(
    db: &DatabaseConnection,
    user_id: i64,
    year: i32,
    month: u32,
) -> Result<BTreeMap<String, f64>> {
    Ok(progress_report(db, user_id, year, month)
        .await?
        .into_iter()
        .map(|p| (p.category, p.spent))
        .collect())
}

/// Per-budget spending figures for the given month.
#[instrument(skip(db))]
pub async fn progress_report(
    db: &DatabaseConnection,
    user_id: i64,
    year: i32,
    month: u32,
) -> Result<Vec<BudgetProgress>> {
    let (month_start, month_end) = period::month_bounds(year, month)?;
    let mut report = Vec::new();

    for budget in list_budgets(db, user_id).await? {
        if !is_active_between(&budget, month_start, month_end) {
            continue;
        }
        let spent = spent_in_category(db, user_id, &budget.category, month_start, month_end).await?;
        report.push(BudgetProgress {
            budget_id: budget.id,
            category: budget.category,
            budgeted: budget.amount,
            spent,
            remaining: budget.amount - spent,
            percent_used: crate::core::money::calculate_progress(spent, budget.amount),
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn monthly(category: &str, amount: f64, start: NaiveDate, end: Option<NaiveDate>) -> NewBudget {
        NewBudget {
            category: category.to_string(),
            amount,
            period: "monthly".to_string(),
            start_date: start,
            end_date: end,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_budget_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_budget(&db, 1, monthly("Food", -1.0, date(2025, 1, 1), None)).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        let result = create_budget(&db, 1, monthly(" ", 10.0, date(2025, 1, 1), None)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_budget(
            &db,
            1,
            monthly("Food", 10.0, date(2025, 2, 1), Some(date(2025, 1, 1))),
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_progress_sums_expenses_for_active_budgets() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        create_budget(&db, user.id, monthly("Food", 400.0, date(2025, 1, 1), None)).await?;
        create_budget(
            &db,
            user.id,
            monthly("Travel", 1000.0, date(2024, 1, 1), Some(date(2024, 12, 31))),
        )
        .await?;
        create_budget(&db, user.id, monthly("Housing", 1500.0, date(2025, 3, 15), None)).await?;

        create_tx(&db, user.id, date(2025, 3, 2), -120.0, "Market", Some("Food")).await?;
        create_tx(&db, user.id, date(2025, 3, 20), -30.5, "Bakery", Some("Food")).await?;
        create_tx(&db, user.id, date(2025, 3, 21), 10.0, "Refund", Some("Food")).await?;
        create_tx(&db, user.id, date(2025, 4, 1), -99.0, "Next month", Some("Food")).await?;
        create_tx(&db, user.id, date(2025, 3, 1), -1400.0, "Rent", Some("Housing")).await?;

        let spent = progress(&db, user.id, 2025, 3).await?;
        assert_eq!(spent.len(), 2);
        assert_eq!(spent["Food"], 150.5);
        assert_eq!(spent["Housing"], 1400.0);
        assert!(!spent.contains_key("Travel"));

        Ok(())
    }

    #[tokio::test]
    async fn test_progress_ignores_other_users() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let other = create_test_user(&db, "other").await?;
        create_budget(&db, user.id, monthly("Food", 400.0, date(2025, 1, 1), None)).await?;
        create_tx(&db, other.id, date(2025, 3, 2), -120.0, "Theirs", Some("Food")).await?;

        let report = progress_report(&db, user.id, 2025, 3).await?;
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].spent, 0.0);
        assert_eq!(report[0].remaining, 400.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_are_owner_scoped() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let other = create_test_user(&db, "other").await?;
        let budget = create_budget(&db, user.id, monthly("Food", 400.0, date(2025, 1, 1), None)).await?;

        let result = update_budget(
            &db,
            other.id,
            budget.id,
            BudgetChanges {
                amount: Some(1.0),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        let updated = update_budget(
            &db,
            user.id,
            budget.id,
            BudgetChanges {
                amount: Some(450.0),
                notes: Some(Some("raised".to_string())),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.amount, 450.0);
        assert_eq!(updated.category, "Food");
        assert_eq!(updated.notes.as_deref(), Some("raised"));

        let budget = create_budget(
            &db,
            user.id,
            monthly("Travel", 200.0, date(2025, 1, 1), Some(date(2025, 6, 30))),
        )
        .await?;
        let cleared = update_budget(
            &db,
            user.id,
            budget.id,
            BudgetChanges {
                end_date: Some(None),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(cleared.end_date, None);
        assert_eq!(cleared.start_date, date(2025, 1, 1));

        delete_budget(&db, user.id, budget.id).await?;
        assert!(list_budgets(&db, user.id).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_progress_rejects_invalid_month() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let result = progress(&db, user.id, 2025, 0).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }
}
