//! Financial goal business logic - savings targets, contributions and progress.

use crate::{
    entities::{FinancialGoal, financial_goal},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use tracing::{info, instrument};

/// Input for [`create_goal`]. `current_amount` defaults to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: f64,
    pub current_amount: Option<f64>,
    pub category: String,
    pub start_date: NaiveDate,
    pub target_date: NaiveDate,
    pub priority: String,
    pub notes: Option<String>,
}

/// Partial update for [`update_goal`]; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalChanges {
    pub name: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
    pub priority: Option<String>,
    /// `Some(None)` clears the notes
    pub notes: Option<Option<String>>,
}

/// How far a goal has come.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub goal_id: i64,
    pub name: String,
    /// `current / target * 100`, not capped
    pub progress_percentage: f64,
    /// `target - current`; negative once the goal is exceeded
    pub remaining_amount: f64,
    /// Days from today to the target date; negative when overdue
    pub days_remaining: i64,
}

/// Sort rank for a priority label: High, Medium, Low, then anything else.
#[must_use]
pub fn priority_rank(priority: &str) -> u8 {
    match priority.to_ascii_lowercase().as_str() {
        "high" => 0,
        "medium" => 1,
        "low" => 2,
        _ => 3,
    }
}

fn validate_target(target_amount: f64) -> Result<()> {
    if !target_amount.is_finite() || target_amount <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: target_amount,
        });
    }
    Ok(())
}

/// Creates a goal for `user_id`.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_goal(
    db: &DatabaseConnection,
    user_id: i64,
    input: NewGoal,
) -> Result<financial_goal::Model> {
    if input.name.trim().is_empty() {
        return Err(Error::validation("Goal name cannot be empty"));
    }
    validate_target(input.target_amount)?;
    let current_amount = input.current_amount.unwrap_or(0.0);
    if !current_amount.is_finite() {
        return Err(Error::InvalidAmount {
            amount: current_amount,
        });
    }

    let created = financial_goal::ActiveModel {
        name: Set(input.name),
        target_amount: Set(input.target_amount),
        current_amount: Set(current_amount),
        category: Set(input.category),
        start_date: Set(input.start_date),
        target_date: Set(input.target_date),
        priority: Set(input.priority),
        notes: Set(input.notes),
        created_by: Set(user_id),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(id = created.id, "Created goal");
    Ok(created)
}

/// Retrieves one of the user's goals.
pub async fn get_goal(
    db: &DatabaseConnection,
    user_id: i64,
    goal_id: i64,
) -> Result<financial_goal::Model> {
    FinancialGoal::find_by_id(goal_id)
        .one(db)
        .await?
        .filter(|g| g.created_by == user_id)
        .ok_or(Error::NotFound {
            entity: "Goal",
            id: goal_id,
        })
}

/// Lists the user's goals, highest priority first.
pub async fn list_goals(db: &DatabaseConnection, user_id: i64) -> Result<Vec<financial_goal::Model>> {
    let mut goals = FinancialGoal::find()
        .filter(financial_goal::Column::CreatedBy.eq(user_id))
        .order_by_asc(financial_goal::Column::TargetDate)
        .all(db)
        .await?;
    goals.sort_by_key(|g| priority_rank(&g.priority));
    Ok(goals)
}

/// Applies the provided fields to one of the user's goals.
pub async fn update_goal(
    db: &DatabaseConnection,
    user_id: i64,
    goal_id: i64,
    changes: GoalChanges,
) -> Result<financial_goal::Model> {
    let existing = get_goal(db, user_id, goal_id).await?;
    if let Some(target) = changes.target_amount {
        validate_target(target)?;
    }

    let mut active: financial_goal::ActiveModel = existing.into();
    if let Some(name) = changes.name {
        active.name = Set(name);
    }
    if let Some(target) = changes.target_amount {
        active.target_amount = Set(target);
    }
    if let Some(current) = changes.current_amount {
        active.current_amount = Set(current);
    }
    if let Some(category) = changes.category {
        active.category = Set(category);
    }
    if let Some(start) = changes.start_date {
        active.start_date = Set(start);
    }
    if let Some(target_date) = changes.target_date {
        active.target_date = Set(target_date);
    }
    if let Some(priority) = changes.priority {
        active.priority = Set(priority);
    }
    if let Some(notes) = changes.notes {
        active.notes = Set(notes);
    }

    let updated = active.update(db).await?;
    info!(id = updated.id, "Updated goal");
    Ok(updated)
}

/// Deletes one of the user's goals.
pub async fn delete_goal(db: &DatabaseConnection, user_id: i64, goal_id: i64) -> Result<()> {
    let existing = get_goal(db, user_id, goal_id).await?;
    existing.delete(db).await?;
    info!(id = goal_id, "Deleted goal");
    Ok(())
}

/// Adds a positive contribution to the goal's current amount.
#[instrument(skip(db))]
pub async fn add_contribution(
    db: &DatabaseConnection,
    user_id: i64,
    goal_id: i64,
    amount: f64,
) -> Result<financial_goal::Model> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }

    let existing = get_goal(db, user_id, goal_id).await?;
    let new_current = existing.current_amount + amount;
    let mut active: financial_goal::ActiveModel = existing.into();
    active.current_amount = Set(new_current);

    let updated = active.update(db).await?;
    info!(id = goal_id, current = updated.current_amount, "Recorded goal contribution");
    Ok(updated)
}

/// Progress figures for a goal as of `today`.
#[must_use]
pub fn progress_of(goal: &financial_goal::Model, today: NaiveDate) -> GoalProgress {
    GoalProgress {
        goal_id: goal.id,
        name: goal.name.clone(),
        progress_percentage: crate::core::money::calculate_progress(
            goal.current_amount,
            goal.target_amount,
        ),
        remaining_amount: goal.target_amount - goal.current_amount,
        days_remaining: (goal.target_date - today).num_days(),
    }
}

/// Progress of one of the user's goals as of `today`.
pub async fn progress(
    db: &DatabaseConnection,
    user_id: i64,
    goal_id: i64,
    today: NaiveDate,
) -> Result<GoalProgress> {
    let goal = get_goal(db, user_id, goal_id).await?;
    Ok(progress_of(&goal, today))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use pretty_assertions::assert_eq;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_goal_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let mut input = new_goal("Car", 0.0, "Savings", "High");
        let result = create_goal(&db, 1, input.clone()).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: 0.0 }));

        input.target_amount = 100.0;
        input.name = String::new();
        let result = create_goal(&db, 1, input).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_current_amount_defaults_to_zero() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let goal = create_goal(&db, user.id, new_goal("Trip", 2000.0, "Travel", "Low")).await?;
        assert_eq!(goal.current_amount, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_goals_by_priority() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        create_goal(&db, user.id, new_goal("Sofa", 800.0, "Home", "Low")).await?;
        create_goal(&db, user.id, new_goal("Buffer", 5000.0, "Emergency Fund", "High")).await?;
        create_goal(&db, user.id, new_goal("Bike", 600.0, "Fun", "Medium")).await?;

        let names: Vec<String> = list_goals(&db, user.id)
            .await?
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["Buffer", "Bike", "Sofa"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_contribution_and_progress() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let mut input = new_goal("Laptop", 2000.0, "Tech", "Medium");
        input.target_date = date(2025, 12, 31);
        let goal = create_goal(&db, user.id, input).await?;

        add_contribution(&db, user.id, goal.id, 300.0).await?;
        let goal = add_contribution(&db, user.id, goal.id, 200.0).await?;
        assert_eq!(goal.current_amount, 500.0);

        let progress = progress(&db, user.id, goal.id, date(2025, 12, 1)).await?;
        assert_eq!(
            progress,
            GoalProgress {
                goal_id: goal.id,
                name: "Laptop".to_string(),
                progress_percentage: 25.0,
                remaining_amount: 1500.0,
                days_remaining: 30,
            }
        );

        let result = add_contribution(&db, user.id, goal.id, -5.0).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_goal_sets_and_clears_notes() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let goal = create_goal(&db, user.id, new_goal("Bike", 900.0, "Travel", "Medium")).await?;

        let noted = update_goal(
            &db,
            user.id,
            goal.id,
            GoalChanges {
                priority: Some("High".to_string()),
                notes: Some(Some("second hand is fine".to_string())),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(noted.notes.as_deref(), Some("second hand is fine"));
        assert_eq!(noted.priority, "High");

        let cleared = update_goal(
            &db,
            user.id,
            goal.id,
            GoalChanges {
                notes: Some(None),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(cleared.notes, None);
        assert_eq!(cleared.priority, "High");
        assert_eq!(cleared.name, "Bike");
        Ok(())
    }

    #[tokio::test]
    async fn test_goal_not_visible_to_other_user() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let other = create_test_user(&db, "other").await?;
        let goal = create_goal(&db, user.id, new_goal("Laptop", 2000.0, "Tech", "Medium")).await?;

        let result = add_contribution(&db, other.id, goal.id, 5.0).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }

    #[test]
    fn test_priority_rank() {
        assert!(priority_rank("HIGH") < priority_rank("medium"));
        assert!(priority_rank("Low") < priority_rank("someday"));
    }
}
