//! Saved reports: definitions, generation and export.
//!
//! A report is readable by its owner and, when public, by everyone. Only the owner may
//! change or delete it. Generation returns a fixed sample payload for the `financial`
//! and `analytics` types.

use crate::{
    entities::{Report, report},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Condition, QueryOrder, Set, prelude::*};
use serde::Serialize;
use std::{collections::BTreeMap, fmt, str::FromStr};
use tracing::{info, instrument, warn};

/// Report type with a sample financial summary.
pub const TYPE_FINANCIAL: &str = "financial";
/// Report type with a sample spending trend.
pub const TYPE_ANALYTICS: &str = "analytics";

/// Input for [`create_report`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub name: String,
    pub description: Option<String>,
    pub report_type: String,
    pub is_public: bool,
    pub configuration: Option<serde_json::Value>,
}

/// Partial update for [`update_report`]; `None` leaves a field unchanged and
/// `Some(None)` clears an optional one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub report_type: Option<String>,
    pub is_public: Option<bool>,
    pub configuration: Option<Option<serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryFigure {
    pub amount: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthFigure {
    pub month: &'static str,
    pub amount: f64,
}

/// Body of a generated report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportData {
    Financial {
        total_income: f64,
        total_expenses: f64,
        net_savings: f64,
        savings_rate: f64,
        categories: BTreeMap<&'static str, CategoryFigure>,
    },
    Analytics {
        trends: Vec<MonthFigure>,
        insights: Vec<&'static str>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedReport {
    pub report_id: i64,
    pub name: String,
    pub report_type: String,
    pub generated_at: DateTime<Utc>,
    /// Absent for report types without a sample payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ReportData>,
}

/// Target format for [`export_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
    Pdf,
    Other(String),
}

impl ExportFormat {
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Excel => "application/vnd.ms-excel",
            Self::Pdf => "application/pdf",
            Self::Other(_) => "application/octet-stream",
        }
    }

    /// Download name, e.g. `report.csv`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("report.{self}")
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let format = s.trim().to_ascii_lowercase();
        if format.is_empty() {
            return Err(Error::validation("Export format cannot be empty"));
        }
        Ok(match format.as_str() {
            "csv" => Self::Csv,
            "excel" => Self::Excel,
            "pdf" => Self::Pdf,
            _ => Self::Other(format),
        })
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Csv => "csv",
            Self::Excel => "excel",
            Self::Pdf => "pdf",
            Self::Other(other) => other,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedReport {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: String,
}

fn encode_configuration(configuration: Option<serde_json::Value>) -> Result<Option<String>> {
    configuration
        .map(|value| serde_json::to_string(&value))
        .transpose()
        .map_err(Into::into)
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("Report name cannot be empty"));
    }
    Ok(())
}

/// Saves a new report definition owned by `user_id`.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_report(db: &DatabaseConnection, user_id: i64, input: NewReport) -> Result<report::Model> {
    validate_name(&input.name)?;
    let now = Utc::now();

    let created = report::ActiveModel {
        name: Set(input.name),
        description: Set(input.description),
        report_type: Set(input.report_type),
        is_public: Set(input.is_public),
        configuration: Set(encode_configuration(input.configuration)?),
        created_by: Set(user_id),
        created_at: Set(now),
        last_modified: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(id = created.id, "Created report");
    Ok(created)
}

/// A report the user owns or that is public.
pub async fn get_report(db: &DatabaseConnection, user_id: i64, report_id: i64) -> Result<report::Model> {
    Report::find_by_id(report_id)
        .one(db)
        .await?
        .filter(|r| r.created_by == user_id || r.is_public)
        .ok_or(Error::NotFound {
            entity: "Report",
            id: report_id,
        })
}

/// The user's own reports plus every public report, most recently modified first.
pub async fn list_reports(
    db: &DatabaseConnection,
    user_id: i64,
    report_type: Option<&str>,
) -> Result<Vec<report::Model>> {
    let mut query = Report::find().filter(
        Condition::any()
            .add(report::Column::CreatedBy.eq(user_id))
            .add(report::Column::IsPublic.eq(true)),
    );
    if let Some(report_type) = report_type {
        query = query.filter(report::Column::ReportType.eq(report_type));
    }
    query
        .order_by_desc(report::Column::LastModified)
        .order_by_desc(report::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads a report for modification. Public reports owned by someone else are
/// forbidden; private ones are not found.
async fn owned_report(
    db: &DatabaseConnection,
    user_id: i64,
    report_id: i64,
    action: &'static str,
) -> Result<report::Model> {
    let report = get_report(db, user_id, report_id).await?;
    if report.created_by != user_id {
        warn!(report_id, user_id, action, "Rejected change to another user's report");
        return Err(Error::Forbidden {
            action,
            entity: "Report",
            id: report_id,
        });
    }
    Ok(report)
}

/// Applies the provided fields to one of the user's reports.
#[instrument(skip(db, changes))]
pub async fn update_report(
    db: &DatabaseConnection,
    user_id: i64,
    report_id: i64,
    changes: ReportChanges,
) -> Result<report::Model> {
    let existing = owned_report(db, user_id, report_id, "update").await?;

    let mut active: report::ActiveModel = existing.into();
    if let Some(name) = changes.name {
        validate_name(&name)?;
        active.name = Set(name);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(report_type) = changes.report_type {
        active.report_type = Set(report_type);
    }
    if let Some(is_public) = changes.is_public {
        active.is_public = Set(is_public);
    }
    if let Some(configuration) = changes.configuration {
        active.configuration = Set(encode_configuration(configuration)?);
    }
    active.last_modified = Set(Utc::now());

    let updated = active.update(db).await?;
    info!(id = updated.id, "Updated report");
    Ok(updated)
}

/// Deletes one of the user's reports.
pub async fn delete_report(db: &DatabaseConnection, user_id: i64, report_id: i64) -> Result<()> {
    let existing = owned_report(db, user_id, report_id, "delete").await?;
    existing.delete(db).await?;
    info!(id = report_id, "Deleted report");
    Ok(())
}

fn sample_financial() -> ReportData {
    let categories = [
        ("Housing", 1500.0, 35.7),
        ("Food", 800.0, 19.0),
        ("Transportation", 500.0, 11.9),
        ("Entertainment", 300.0, 7.1),
        ("Utilities", 550.0, 13.1),
        ("Other", 550.0, 13.1),
    ]
    .into_iter()
    .map(|(name, amount, percentage)| (name, CategoryFigure { amount, percentage }))
    .collect();

    ReportData::Financial {
        total_income: 6500.0,
        total_expenses: 4200.0,
        net_savings: 2300.0,
        savings_rate: 35.4,
        categories,
    }
}

fn sample_analytics() -> ReportData {
    let trends = [
        ("Jan", 4200.0),
        ("Feb", 4500.0),
        ("Mar", 4100.0),
        ("Apr", 5200.0),
        ("May", 4800.0),
        ("Jun", 5500.0),
    ]
    .into_iter()
    .map(|(month, amount)| MonthFigure { month, amount })
    .collect();

    ReportData::Analytics {
        trends,
        insights: vec![
            "Spending increased by 15% in April compared to March",
            "Entertainment expenses are 20% higher than last quarter",
            "Savings rate has improved by 5% over the last 6 months",
        ],
    }
}

/// Sample payload for a report type, if it has one.
#[must_use]
pub fn sample_data(report_type: &str) -> Option<ReportData> {
    match report_type.to_ascii_lowercase().as_str() {
        TYPE_FINANCIAL => Some(sample_financial()),
        TYPE_ANALYTICS => Some(sample_analytics()),
        _ => None,
    }
}

/// Generates a readable report.
#[instrument(skip(db))]
pub async fn generate_report(
    db: &DatabaseConnection,
    user_id: i64,
    report_id: i64,
) -> Result<GeneratedReport> {
    let report = get_report(db, user_id, report_id).await?;
    Ok(GeneratedReport {
        report_id: report.id,
        data: sample_data(&report.report_type),
        name: report.name,
        report_type: report.report_type,
        generated_at: Utc::now(),
    })
}

/// Renders a readable report as a downloadable text document.
#[instrument(skip(db))]
pub async fn export_report(
    db: &DatabaseConnection,
    user_id: i64,
    report_id: i64,
    format: &ExportFormat,
) -> Result<ExportedReport> {
    let report = get_report(db, user_id, report_id).await?;
    let body = format!(
        "Report: {}\nType: {}\nGenerated on: {}\n\nSample report data would be included here.",
        report.name,
        report.report_type,
        Utc::now().format("%Y-%m-%dT%H:%M:%S"),
    );
    info!(report_id, %format, "Exported report");
    Ok(ExportedReport {
        file_name: format.file_name(),
        content_type: format.content_type(),
        body,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use pretty_assertions::assert_eq;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn new_report(name: &str, report_type: &str, is_public: bool) -> NewReport {
        NewReport {
            name: name.to_string(),
            description: None,
            report_type: report_type.to_string(),
            is_public,
            configuration: Some(serde_json::json!({"range": "6m"})),
        }
    }

    #[tokio::test]
    async fn test_create_report_requires_name() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let result = create_report(&db, 1, new_report(" ", TYPE_FINANCIAL, false)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_visibility_rules() -> Result<()> {
        let (db, owner) = setup_with_user().await?;
        let other = create_test_user(&db, "other").await?;
        let private = create_report(&db, owner.id, new_report("Mine", TYPE_FINANCIAL, false)).await?;
        let public = create_report(&db, owner.id, new_report("Shared", TYPE_ANALYTICS, true)).await?;

        assert_eq!(private.configuration.as_deref(), Some(r#"{"range":"6m"}"#));

        let visible: Vec<String> = list_reports(&db, other.id, None)
            .await?
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(visible, vec!["Shared"]);
        assert_eq!(list_reports(&db, owner.id, None).await?.len(), 2);
        assert_eq!(list_reports(&db, owner.id, Some(TYPE_FINANCIAL)).await?.len(), 1);

        let result = get_report(&db, other.id, private.id).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        let result = delete_report(&db, other.id, public.id).await;
        assert!(matches!(result.unwrap_err(), Error::Forbidden { action: "delete", .. }));

        let result = update_report(&db, other.id, private.id, ReportChanges::default()).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_report() -> Result<()> {
        let (db, owner) = setup_with_user().await?;
        let report = create_report(&db, owner.id, new_report("Mine", TYPE_FINANCIAL, false)).await?;

        let updated = update_report(
            &db,
            owner.id,
            report.id,
            ReportChanges {
                is_public: Some(true),
                configuration: Some(Some(serde_json::json!({"range": "1y"}))),
                ..Default::default()
            },
        )
        .await?;
        assert!(updated.is_public);
        assert_eq!(updated.configuration.as_deref(), Some(r#"{"range":"1y"}"#));
        assert!(updated.last_modified >= report.last_modified);

        let cleared = update_report(
            &db,
            owner.id,
            report.id,
            ReportChanges {
                description: Some(None),
                configuration: Some(None),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(cleared.description, None);
        assert_eq!(cleared.configuration, None);
        assert!(cleared.is_public);
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_and_export() -> Result<()> {
        let (db, owner) = setup_with_user().await?;
        let financial = create_report(&db, owner.id, new_report("Q1", TYPE_FINANCIAL, false)).await?;
        let custom = create_report(&db, owner.id, new_report("Misc", "custom", false)).await?;

        let generated = generate_report(&db, owner.id, financial.id).await?;
        match generated.data.unwrap() {
            ReportData::Financial {
                net_savings,
                categories,
                ..
            } => {
                assert_eq!(net_savings, 2300.0);
                assert_eq!(categories["Housing"].percentage, 35.7);
            }
            ReportData::Analytics { .. } => panic!("expected financial data"),
        }
        assert!(generate_report(&db, owner.id, custom.id).await?.data.is_none());

        let exported = export_report(&db, owner.id, financial.id, &"PDF".parse()?).await?;
        assert_eq!(exported.file_name, "report.pdf");
        assert_eq!(exported.content_type, "application/pdf");
        assert!(exported.body.starts_with("Report: Q1\nType: financial\nGenerated on: "));
        Ok(())
    }

    #[test]
    fn test_export_formats() {
        let csv: ExportFormat = "csv".parse().unwrap();
        assert_eq!(csv.content_type(), "text/csv");
        let excel: ExportFormat = "Excel".parse().unwrap();
        assert_eq!(excel.file_name(), "report.excel");
        assert_eq!(excel.content_type(), "application/vnd.ms-excel");
        let json: ExportFormat = "json".parse().unwrap();
        assert_eq!(json.content_type(), "application/octet-stream");
        assert!("".parse::<ExportFormat>().is_err());
    }
}
