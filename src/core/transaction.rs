//! Transaction business logic - Handles all transaction-related operations.
//!
//! This module records, retrieves, filters, updates and deletes a user's transactions.
//! The `transaction_type` column always mirrors the sign of the amount: it is derived on
//! create and recomputed on update, so callers never set it. Rows belonging to another
//! user are reported as not found. The query helpers at the bottom are shared by the
//! budget, analytics, forecast, health and dashboard services.

use crate::{
    core::category::{self, CategoryLists},
    entities::{Transaction, transaction},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use std::{fmt, str::FromStr};
use tracing::{debug, info, instrument};

/// Account recorded when the caller does not name one.
pub const DEFAULT_ACCOUNT: &str = "Default Account";

/// Direction of a transaction, derived from the sign of its amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    /// Positive amount
    Income,
    /// Zero or negative amount
    Expense,
}

impl TransactionKind {
    /// Kind for a signed amount.
    #[must_use]
    pub fn of(amount: f64) -> Self {
        if amount > 0.0 {
            Self::Income
        } else {
            Self::Expense
        }
    }

    /// Value stored in `transaction_type`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(Error::validation(format!(
                "Unknown transaction type '{other}', expected income or expense"
            ))),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for [`create_transaction`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub category: Option<String>,
    pub account: Option<String>,
    pub is_reconciled: bool,
}

/// Partial update for [`update_transaction`]; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionChanges {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub account: Option<String>,
    pub is_reconciled: Option<bool>,
}

/// Filters for [`list_transactions`]. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub category: Option<String>,
    pub kind: Option<TransactionKind>,
}

/// Rejects zero, NaN and infinite amounts.
pub fn validate_amount(amount: f64) -> Result<()> {
    if amount == 0.0 || !amount.is_finite() {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<()> {
    if description.trim().is_empty() {
        return Err(Error::validation("Description cannot be empty"));
    }
    Ok(())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Builds the active model for a new row. Shared with the importer, which inserts
/// inside its own database transaction.
pub(crate) fn new_active_model(
    user_id: i64,
    input: NewTransaction,
    import_id: Option<i64>,
) -> transaction::ActiveModel {
    transaction::ActiveModel {
        date: Set(input.date),
        description: Set(input.description),
        amount: Set(input.amount),
        category: Set(blank_to_none(input.category)),
        transaction_type: Set(TransactionKind::of(input.amount).as_str().to_string()),
        account: Set(Some(
            blank_to_none(input.account).unwrap_or_else(|| DEFAULT_ACCOUNT.to_string()),
        )),
        is_reconciled: Set(input.is_reconciled),
        created_by: Set(user_id),
        import_id: Set(import_id),
        created_at: Set(chrono::Utc::now()),
        updated_at: Set(None),
        ..Default::default()
    }
}

/// Records a new transaction for `user_id`.
///
/// The amount must be finite and non-zero and the description must not be blank.
/// The account defaults to [`DEFAULT_ACCOUNT`].
#[instrument(skip(db, input), fields(amount = input.amount))]
pub async fn create_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    input: NewTransaction,
) -> Result<transaction::Model> {
    validate_amount(input.amount)?;
    validate_description(&input.description)?;

    let created = new_active_model(user_id, input, None).insert(db).await?;
    info!(id = created.id, "Created transaction");
    Ok(created)
}

/// Retrieves one of the user's transactions.
pub async fn get_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    transaction_id: i64,
) -> Result<transaction::Model> {
    Transaction::find_by_id(transaction_id)
        .one(db)
        .await?
        .filter(|t| t.created_by == user_id)
        .ok_or(Error::NotFound {
            entity: "Transaction",
            id: transaction_id,
        })
}

/// Lists the user's transactions matching `filter`, newest first.
///
/// `kind` filters on the sign of the amount, so zero-amount rows match neither kind.
pub async fn list_transactions(
    db: &DatabaseConnection,
    user_id: i64,
    filter: &TransactionFilter,
) -> Result<Vec<transaction::Model>> {
    let mut query = Transaction::find().filter(transaction::Column::CreatedBy.eq(user_id));

    if let Some(start) = filter.start {
        query = query.filter(transaction::Column::Date.gte(start));
    }
    if let Some(end) = filter.end {
        query = query.filter(transaction::Column::Date.lte(end));
    }
    if let Some(category) = &filter.category {
        query = query.filter(transaction::Column::Category.eq(category.as_str()));
    }
    query = match filter.kind {
        Some(TransactionKind::Income) => query.filter(transaction::Column::Amount.gt(0.0)),
        Some(TransactionKind::Expense) => query.filter(transaction::Column::Amount.lt(0.0)),
        None => query,
    };

    query
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies the provided fields to one of the user's transactions.
///
/// `transaction_type` is recomputed from the resulting amount and `updated_at` is stamped.
#[instrument(skip(db, changes))]
pub async fn update_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    transaction_id: i64,
    changes: TransactionChanges,
) -> Result<transaction::Model> {
    let existing = get_transaction(db, user_id, transaction_id).await?;

    if let Some(amount) = changes.amount {
        validate_amount(amount)?;
    }
    if let Some(description) = &changes.description {
        validate_description(description)?;
    }

    let amount = changes.amount.unwrap_or(existing.amount);
    let mut active: transaction::ActiveModel = existing.into();

    if let Some(date) = changes.date {
        active.date = Set(date);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if changes.amount.is_some() {
        active.amount = Set(amount);
    }
    if let Some(category) = changes.category {
        active.category = Set(blank_to_none(Some(category)));
    }
    if let Some(account) = changes.account {
        active.account = Set(Some(
            blank_to_none(Some(account)).unwrap_or_else(|| DEFAULT_ACCOUNT.to_string()),
        ));
    }
    if let Some(is_reconciled) = changes.is_reconciled {
        active.is_reconciled = Set(is_reconciled);
    }
    active.transaction_type = Set(TransactionKind::of(amount).as_str().to_string());
    active.updated_at = Set(Some(chrono::Utc::now()));

    let updated = active.update(db).await?;
    info!(id = updated.id, "Updated transaction");
    Ok(updated)
}

/// Deletes one of the user's transactions.
pub async fn delete_transaction(
    db: &DatabaseConnection,
    user_id: i64,
    transaction_id: i64,
) -> Result<()> {
    let existing = get_transaction(db, user_id, transaction_id).await?;
    existing.delete(db).await?;
    info!(id = transaction_id, "Deleted transaction");
    Ok(())
}

/// Income and expense categories for the user: the defaults plus every category
/// the user has recorded on a positive or negative amount.
pub async fn categories(db: &DatabaseConnection, user_id: i64) -> Result<CategoryLists> {
    let income = distinct_categories(db, user_id, transaction::Column::Amount.gt(0.0)).await?;
    let expense = distinct_categories(db, user_id, transaction::Column::Amount.lt(0.0)).await?;
    Ok(category::merge_with_defaults(income, expense))
}

async fn distinct_categories(
    db: &DatabaseConnection,
    user_id: i64,
    sign: sea_orm::sea_query::SimpleExpr,
) -> Result<Vec<String>> {
    let rows: Vec<Option<String>> = Transaction::find()
        .select_only()
        .column(transaction::Column::Category)
        .distinct()
        .filter(transaction::Column::CreatedBy.eq(user_id))
        .filter(sign)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().flatten().collect())
}

/// All of the user's transactions, oldest first.
pub async fn all_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::CreatedBy.eq(user_id))
        .order_by_asc(transaction::Column::Date)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The user's transactions dated within `start..=end`, oldest first.
pub async fn between<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<transaction::Model>> {
    debug!(user_id, %start, %end, "Loading transactions in range");
    Transaction::find()
        .filter(transaction::Column::CreatedBy.eq(user_id))
        .filter(transaction::Column::Date.between(start, end))
        .order_by_asc(transaction::Column::Date)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The user's transactions with exactly this category.
pub async fn in_category<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    category: &str,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::CreatedBy.eq(user_id))
        .filter(transaction::Column::Category.eq(category))
        .all(db)
        .await
        .map_err(Into::into)
}

/// The user's most recent transactions, newest first.
pub async fn recent<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    limit: u64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::CreatedBy.eq(user_id))
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_transaction_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let mut input = new_transaction(date(2025, 1, 5), 0.0, "Coffee", None);
        let result = create_transaction(&db, 1, input.clone()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: 0.0 }
        ));

        input.amount = f64::NAN;
        let result = create_transaction(&db, 1, input.clone()).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        input.amount = -4.5;
        input.description = "   ".to_string();
        let result = create_transaction(&db, 1, input).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_derives_type_and_default_account() -> Result<()> {
        let (db, user) = setup_with_user().await?;

        let expense = create_tx(&db, user.id, date(2025, 1, 5), -42.5, "Groceries", Some("Food")).await?;
        assert_eq!(expense.transaction_type, "expense");
        assert_eq!(expense.account.as_deref(), Some(DEFAULT_ACCOUNT));
        assert_eq!(expense.created_by, user.id);
        assert!(expense.import_id.is_none());

        let income = create_tx(&db, user.id, date(2025, 1, 1), 3000.0, "Pay", Some("Salary")).await?;
        assert_eq!(income.transaction_type, "income");

        Ok(())
    }

    #[tokio::test]
    async fn test_update_recomputes_type_and_keeps_other_fields() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let tx = create_tx(&db, user.id, date(2025, 2, 1), -20.0, "Refundable", Some("Shopping")).await?;

        let updated = update_transaction(
            &db,
            user.id,
            tx.id,
            TransactionChanges {
                amount: Some(20.0),
                is_reconciled: Some(true),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.amount, 20.0);
        assert_eq!(updated.transaction_type, "income");
        assert!(updated.is_reconciled);
        assert_eq!(updated.description, "Refundable");
        assert_eq!(updated.category.as_deref(), Some("Shopping"));
        assert!(updated.updated_at.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn test_other_users_rows_are_not_found() -> Result<()> {
        let (db, owner) = setup_with_user().await?;
        let other = create_test_user(&db, "mallory").await?;
        let tx = create_tx(&db, owner.id, date(2025, 2, 1), -5.0, "Mine", None).await?;

        assert!(matches!(
            get_transaction(&db, other.id, tx.id).await.unwrap_err(),
            Error::NotFound { .. }
        ));
        assert!(matches!(
            delete_transaction(&db, other.id, tx.id).await.unwrap_err(),
            Error::NotFound { .. }
        ));
        assert!(get_transaction(&db, owner.id, tx.id).await.is_ok());

        Ok(())
    }

    #[tokio::test]
    async fn test_list_transactions_filters() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        create_tx(&db, user.id, date(2025, 1, 1), 3000.0, "Pay", Some("Salary")).await?;
        create_tx(&db, user.id, date(2025, 1, 10), -100.0, "Market", Some("Food")).await?;
        create_tx(&db, user.id, date(2025, 2, 10), -60.0, "Diner", Some("Food")).await?;
        create_tx(&db, user.id, date(2025, 3, 1), -900.0, "Rent", Some("Housing")).await?;

        let all = list_transactions(&db, user.id, &TransactionFilter::default()).await?;
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].description, "Rent");

        let food = list_transactions(
            &db,
            user.id,
            &TransactionFilter {
                category: Some("Food".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(food.len(), 2);

        let january_expenses = list_transactions(
            &db,
            user.id,
            &TransactionFilter {
                start: Some(date(2025, 1, 1)),
                end: Some(date(2025, 1, 31)),
                kind: Some(TransactionKind::Expense),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(january_expenses.len(), 1);
        assert_eq!(january_expenses[0].description, "Market");

        Ok(())
    }

    #[tokio::test]
    async fn test_categories_merge_user_categories() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        create_tx(&db, user.id, date(2025, 1, 1), 200.0, "Side gig", Some("Freelance")).await?;
        create_tx(&db, user.id, date(2025, 1, 2), -15.0, "Vet", Some("Pets")).await?;

        let lists = categories(&db, user.id).await?;
        assert!(lists.income.contains(&"Freelance".to_string()));
        assert!(!lists.income.contains(&"Pets".to_string()));
        assert!(lists.expense.contains(&"Pets".to_string()));
        assert!(lists.expense.contains(&"Housing".to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn test_recent_limits_and_orders() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        for day in 1..=7 {
            create_tx(&db, user.id, date(2025, 4, day), -1.0, "Snack", None).await?;
        }

        let latest = recent(&db, user.id, 5).await?;
        assert_eq!(latest.len(), 5);
        assert_eq!(latest[0].date, date(2025, 4, 7));
        assert_eq!(latest[4].date, date(2025, 4, 3));

        Ok(())
    }

    #[test]
    fn test_transaction_kind() {
        assert_eq!(TransactionKind::of(0.01), TransactionKind::Income);
        assert_eq!(TransactionKind::of(0.0), TransactionKind::Expense);
        assert_eq!("Income".parse::<TransactionKind>().unwrap(), TransactionKind::Income);
        assert!("transfer".parse::<TransactionKind>().is_err());
    }
}
