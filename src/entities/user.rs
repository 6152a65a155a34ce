//! User entity - Account that owns every other record in the portal.
//!
//! Passwords are stored only as bcrypt hashes. `role` is either `USER` or `ADMIN`.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name, unique across all users
    #[sea_orm(unique)]
    pub username: String,
    /// Contact address, unique across all users
    #[sea_orm(unique)]
    pub email: String,
    /// bcrypt hash of the password
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Optional given name
    pub first_name: Option<String>,
    /// Optional family name
    pub last_name: Option<String>,
    /// Authorization role: `"USER"` or `"ADMIN"`
    pub role: String,
    /// Inactive users cannot log in
    pub active: bool,
    /// When the account was registered
    pub created_at: DateTimeUtc,
    /// Last successful login, if any
    pub last_login: Option<DateTimeUtc>,
}

/// Defines relationships between User and the records it owns
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A user owns many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// A user owns many budgets
    #[sea_orm(has_many = "super::budget::Entity")]
    Budgets,
    /// A user owns many financial goals
    #[sea_orm(has_many = "super::financial_goal::Entity")]
    FinancialGoals,
    /// A user owns many import jobs
    #[sea_orm(has_many = "super::import_job::Entity")]
    ImportJobs,
    /// A user owns many reports
    #[sea_orm(has_many = "super::report::Entity")]
    Reports,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl Related<super::financial_goal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinancialGoals.def()
    }
}

impl Related<super::import_job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ImportJobs.def()
    }
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reports.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
