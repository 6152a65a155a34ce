//! Import job entity - Metadata for one bulk file upload.
//!
//! A job starts as `processing` and ends as `completed` or `failed`.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Import job database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "import_jobs")]
pub struct Model {
    /// Unique identifier for the job
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the uploaded file
    pub file_name: String,
    /// Category applied to rows that have none
    pub category: Option<String>,
    /// Caller-supplied import type label
    pub import_type: Option<String>,
    /// Optional description
    pub description: Option<String>,
    /// `"processing"`, `"completed"` or `"failed"`
    pub status: String,
    /// Number of rows imported
    pub record_count: i32,
    /// Reason for failure, when `status` is `"failed"`
    pub error_message: Option<String>,
    /// When the job was created
    pub created_at: DateTimeUtc,
    /// When the job finished, successfully or not
    pub completed_at: Option<DateTimeUtc>,
    /// Owning user
    pub created_by: i64,
}

/// Defines relationships between `ImportJob` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each job belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    User,
    /// One raw snapshot per completed job
    #[sea_orm(has_many = "super::raw_import_data::Entity")]
    RawImportData,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::raw_import_data::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RawImportData.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
