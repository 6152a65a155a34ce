//! Budget entity - A per-category spending cap over a date range.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    /// Unique identifier for the budget
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Expense category the cap applies to
    pub category: String,
    /// Spending cap for one period
    pub amount: f64,
    /// Free-form period label, e.g. `"monthly"`
    pub period: String,
    /// First day the budget is active
    pub start_date: Date,
    /// Last day the budget is active; open-ended when `None`
    pub end_date: Option<Date>,
    /// Optional notes
    pub notes: Option<String>,
    /// Owning user
    pub created_by: i64,
}

/// Defines relationships between Budget and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each budget belongs to one user
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
