//! Shared test utilities for `FinancePortal`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test records with sensible defaults.

use crate::{
    config::{settings::AuthConfig, users::ROLE_USER},
    core::{
        goal::NewGoal,
        transaction::{self, NewTransaction},
    },
    entities::{self, user},
    errors::Result,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a user directly, without hashing a real password.
///
/// # Defaults
/// * `email`: `"{name}@example.com"`
/// * `role`: `USER`
pub async fn create_test_user(db: &DatabaseConnection, name: &str) -> Result<user::Model> {
    user::ActiveModel {
        username: Set(name.to_string()),
        email: Set(format!("{name}@example.com")),
        password_hash: Set("not-a-real-hash".to_string()),
        first_name: Set(None),
        last_name: Set(None),
        role: Set(ROLE_USER.to_string()),
        active: Set(true),
        created_at: Set(Utc::now()),
        last_login: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Sets up a complete test environment with one user.
/// Returns (db, user) for common test scenarios.
pub async fn setup_with_user() -> Result<(DatabaseConnection, user::Model)> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, "testuser").await?;
    Ok((db, user))
}

/// Builds a calendar date, panicking on an invalid one.
#[allow(clippy::unwrap_used)]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Transaction input with sensible defaults.
///
/// # Defaults
/// * `account`: None (the default account)
/// * `is_reconciled`: false
pub fn new_transaction(
    date: NaiveDate,
    amount: f64,
    description: &str,
    category: Option<&str>,
) -> NewTransaction {
    NewTransaction {
        date,
        description: description.to_string(),
        amount,
        category: category.map(str::to_string),
        account: None,
        is_reconciled: false,
    }
}

/// Records a transaction for `user_id` through the service layer.
pub async fn create_tx(
    db: &DatabaseConnection,
    user_id: i64,
    date: NaiveDate,
    amount: f64,
    description: &str,
    category: Option<&str>,
) -> Result<entities::transaction::Model> {
    transaction::create_transaction(db, user_id, new_transaction(date, amount, description, category))
        .await
}

/// An unsaved transaction row for the pure calculations.
///
/// # Defaults
/// * `id`: 0, `created_by`: 1
/// * `description`: `"Test transaction"`
/// * `import_id`: None
pub fn tx_model(date: NaiveDate, amount: f64, category: Option<&str>) -> entities::transaction::Model {
    entities::transaction::Model {
        id: 0,
        date,
        description: "Test transaction".to_string(),
        amount,
        category: category.map(str::to_string),
        transaction_type: transaction::TransactionKind::of(amount).as_str().to_string(),
        account: Some(transaction::DEFAULT_ACCOUNT.to_string()),
        is_reconciled: false,
        created_by: 1,
        import_id: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

/// Goal input running from 2025-01-01 to 2026-01-01 with nothing saved yet.
pub fn new_goal(name: &str, target_amount: f64, category: &str, priority: &str) -> NewGoal {
    NewGoal {
        name: name.to_string(),
        target_amount,
        current_amount: None,
        category: category.to_string(),
        start_date: date(2025, 1, 1),
        target_date: date(2026, 1, 1),
        priority: priority.to_string(),
        notes: None,
    }
}

/// Auth settings with the cheapest bcrypt cost so tests hash quickly.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret".to_string(),
        password_cost: 4,
        ..AuthConfig::default()
    }
}
