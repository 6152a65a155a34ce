//! Financial goal entity - A savings target with progress and a deadline.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Financial goal database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "financial_goals")]
pub struct Model {
    /// Unique identifier for the goal
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Amount to reach
    pub target_amount: f64,
    /// Amount saved so far
    pub current_amount: f64,
    /// Goal category, e.g. `"Emergency Fund"` or `"Investment"`
    pub category: String,
    /// When saving started
    pub start_date: Date,
    /// Deadline
    pub target_date: Date,
    /// `"High"`, `"Medium"` or `"Low"`
    pub priority: String,
    /// Optional notes
    pub notes: Option<String>,
    /// Owning user
    pub created_by: i64,
}

/// Defines relationships between `FinancialGoal` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each goal belongs to one user
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
