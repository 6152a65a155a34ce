//! Transaction entity - A single dated money movement owned by a user.
//!
//! Positive amounts are income and negative amounts are expenses. `transaction_type`
//! mirrors the sign and is recomputed by the core layer on every save. Rows created
//! by a file import carry the `import_id` of their job.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Calendar date the money moved
    pub date: Date,
    /// Human-readable description of the transaction
    pub description: String,
    /// Signed amount (positive for income, negative for spending)
    pub amount: f64,
    /// Optional spending or income category
    pub category: Option<String>,
    /// `"income"` or `"expense"`, derived from the sign of `amount`
    pub transaction_type: String,
    /// Account the money moved through
    pub account: Option<String>,
    /// Whether the row has been reconciled against a statement
    pub is_reconciled: bool,
    /// Owning user
    pub created_by: i64,
    /// Import job that produced this row, if any
    pub import_id: Option<i64>,
    /// When the row was created
    pub created_at: DateTimeUtc,
    /// When the row was last modified
    pub updated_at: Option<DateTimeUtc>,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
