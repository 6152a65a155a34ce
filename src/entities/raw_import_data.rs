//! Raw import data entity - Snapshot of the rows parsed from an imported file.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Raw import snapshot database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "raw_import_data")]
pub struct Model {
    /// Unique identifier for the snapshot
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Job the rows came from
    pub import_job_id: i64,
    /// Name of the uploaded file
    pub file_name: String,
    /// When the import ran
    pub import_date: DateTimeUtc,
    /// User who ran the import
    pub imported_by: i64,
    /// `"CSV"`, `"EXCEL"` or `"UNKNOWN"`
    pub source_type: String,
    /// Parsed rows as a JSON array
    pub raw_data: Json,
}

/// Defines relationships between `RawImportData` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each snapshot belongs to one import job
    #[sea_orm(
        belongs_to = "super::import_job::Entity",
        from = "Column::ImportJobId",
        to = "super::import_job::Column::Id"
    )]
    ImportJob,
}

impl Related<super::import_job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ImportJob.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
