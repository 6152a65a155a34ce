//! Analytics result entity - Append-only log of computed analytics.
//!
//! Each row stores the request parameters and the computed payload as JSON documents.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Analytics result database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "analytics_results")]
pub struct Model {
    /// Unique identifier for the result
    #[sea_orm(primary_key)]
    pub id: i64,
    /// `"SUMMARY"`, `"CATEGORY"` or `"TREND"`
    pub result_type: String,
    /// When the result was computed
    pub created_at: DateTimeUtc,
    /// User the result was computed for
    pub created_by: i64,
    /// Request parameters
    pub parameters: Json,
    /// Computed payload
    pub results: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
