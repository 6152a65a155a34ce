//! File import business logic.
//!
//! An upload becomes an import job that starts as `processing`. CSV files are parsed
//! into transactions; the rows, a raw snapshot of what was parsed and the job's
//! completion are written in one database transaction. Any failure leaves no rows
//! behind and marks the job `failed` with the reason, and the failed job is returned
//! to the caller rather than an error.
//!
//! CSV layout: a header line, then positional columns
//! `date, amount, description, category, account, type`. Only the first two are required.

use crate::{
    config::settings::ImportConfig,
    core::transaction::{self as tx, NewTransaction},
    entities::{ImportJob, RawImportData, import_job, raw_import_data},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use std::fmt;
use tracing::{info, instrument, warn};

/// Job is still running.
pub const STATUS_PROCESSING: &str = "processing";
/// Job finished and its rows were stored.
pub const STATUS_COMPLETED: &str = "completed";
/// Job stopped; nothing was stored.
pub const STATUS_FAILED: &str = "failed";

const DEFAULT_DESCRIPTION: &str = "Imported transaction";

/// File format, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Csv,
    Excel,
    Unknown,
}

impl SourceType {
    /// `.csv` is CSV, `.xls` and `.xlsx` are Excel, anything else is unknown.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Self {
        let lower = file_name.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Self::Csv
        } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            Self::Excel
        } else {
            Self::Unknown
        }
    }

    /// Label stored on the raw snapshot.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Excel => "EXCEL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata supplied with an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRequest {
    pub file_name: String,
    /// Applied to rows without a category of their own
    pub category: Option<String>,
    pub import_type: Option<String>,
    pub description: Option<String>,
}

/// One parsed CSV row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedRow {
    pub date: NaiveDate,
    pub amount: f64,
    pub description: Option<String>,
    pub category: Option<String>,
    pub account: Option<String>,
    /// Free-form type column; the stored type always follows the amount's sign
    pub transaction_type: Option<String>,
}

impl ImportedRow {
    fn into_new_transaction(self, fallback_category: Option<&str>) -> NewTransaction {
        NewTransaction {
            date: self.date,
            description: self
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            amount: self.amount,
            category: self.category.or_else(|| fallback_category.map(str::to_string)),
            account: self.account,
            is_reconciled: false,
        }
    }
}

/// Parses a date as `YYYY-MM-DD`, `MM/DD/YYYY` or `DD/MM/YYYY`, in that order.
///
/// Unparseable dates fall back to `today` with a warning.
#[must_use]
pub fn parse_date(value: &str, today: NaiveDate) -> NaiveDate {
    let value = value.trim();
    ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .unwrap_or_else(|| {
            warn!("Could not parse date '{value}', using {today}");
            today
        })
}

fn optional_field(record: &csv::StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parses CSV bytes into rows.
///
/// The first line is a header. Lines with fewer than two fields are skipped, as are
/// zero amounts. A non-numeric amount fails the whole file.
pub fn parse_csv(contents: &[u8], today: NaiveDate) -> Result<Vec<ImportedRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(contents);

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = index + 2;
        if record.len() < 2 {
            warn!(line, "Skipping row with fewer than two fields");
            continue;
        }

        let raw_amount = record.get(1).unwrap_or_default();
        let amount: f64 = raw_amount.parse().map_err(|_| Error::Import {
            message: format!("Invalid amount '{raw_amount}' on line {line}"),
        })?;
        if !amount.is_finite() {
            return Err(Error::Import {
                message: format!("Invalid amount '{raw_amount}' on line {line}"),
            });
        }
        if amount == 0.0 {
            warn!(line, "Skipping zero amount row");
            continue;
        }

        rows.push(ImportedRow {
            date: parse_date(record.get(0).unwrap_or_default(), today),
            amount,
            description: optional_field(&record, 2),
            category: optional_field(&record, 3),
            account: optional_field(&record, 4),
            transaction_type: optional_field(&record, 5),
        });
    }

    Ok(rows)
}

/// Runs an import for `user_id` and returns the finished job.
///
/// Empty and oversized files are rejected before any job is created. After that,
/// problems end in a `failed` job rather than an error.
#[instrument(skip(db, limits, request, contents), fields(file = %request.file_name, bytes = contents.len()))]
pub async fn process_import(
    db: &DatabaseConnection,
    user_id: i64,
    limits: &ImportConfig,
    request: ImportRequest,
    contents: &[u8],
    today: NaiveDate,
) -> Result<import_job::Model> {
    if contents.is_empty() {
        return Err(Error::validation("Please select a file to upload"));
    }
    if contents.len() > limits.max_file_bytes {
        return Err(Error::validation(format!(
            "File is {} bytes, the limit is {}",
            contents.len(),
            limits.max_file_bytes
        )));
    }

    let job = import_job::ActiveModel {
        file_name: Set(request.file_name.clone()),
        category: Set(request.category.clone()),
        import_type: Set(request.import_type.clone()),
        description: Set(request.description.clone()),
        status: Set(STATUS_PROCESSING.to_string()),
        record_count: Set(0),
        error_message: Set(None),
        created_at: Set(chrono::Utc::now()),
        completed_at: Set(None),
        created_by: Set(user_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(job_id = job.id, "Import job started");

    let source = SourceType::from_file_name(&request.file_name);
    let outcome = match source {
        SourceType::Csv => match parse_csv(contents, today) {
            Ok(rows) => store_rows(db, &job, source, rows).await,
            Err(e) => Err(e),
        },
        other => Err(Error::Import {
            message: format!("{other} files are not supported, upload a CSV file"),
        }),
    };

    match outcome {
        Ok(completed) => {
            info!(job_id = completed.id, records = completed.record_count, "Import completed");
            Ok(completed)
        }
        Err(e) => {
            warn!(job_id = job.id, error = %e, "Import failed");
            mark_failed(db, job, &e.to_string()).await
        }
    }
}

async fn store_rows(
    db: &DatabaseConnection,
    job: &import_job::Model,
    source: SourceType,
    rows: Vec<ImportedRow>,
) -> Result<import_job::Model> {
    let record_count = i32::try_from(rows.len())?;
    let snapshot = serde_json::to_value(&rows)?;
    let txn = db.begin().await?;

    for row in rows {
        let input = row.into_new_transaction(job.category.as_deref());
        tx::new_active_model(job.created_by, input, Some(job.id))
            .insert(&txn)
            .await?;
    }

    let now = chrono::Utc::now();
    raw_import_data::ActiveModel {
        import_job_id: Set(job.id),
        file_name: Set(job.file_name.clone()),
        import_date: Set(now),
        imported_by: Set(job.created_by),
        source_type: Set(source.as_str().to_string()),
        raw_data: Set(snapshot),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut active: import_job::ActiveModel = job.clone().into();
    active.status = Set(STATUS_COMPLETED.to_string());
    active.record_count = Set(record_count);
    active.completed_at = Set(Some(now));
    let completed = active.update(&txn).await?;

    txn.commit().await?;
    Ok(completed)
}

async fn mark_failed(
    db: &DatabaseConnection,
    job: import_job::Model,
    message: &str,
) -> Result<import_job::Model> {
    let mut active: import_job::ActiveModel = job.into();
    active.status = Set(STATUS_FAILED.to_string());
    active.record_count = Set(0);
    active.error_message = Set(Some(message.to_string()));
    active.completed_at = Set(Some(chrono::Utc::now()));
    active.update(db).await.map_err(Into::into)
}

/// The user's import jobs, newest first.
pub async fn history(db: &DatabaseConnection, user_id: i64) -> Result<Vec<import_job::Model>> {
    ImportJob::find()
        .filter(import_job::Column::CreatedBy.eq(user_id))
        .order_by_desc(import_job::Column::CreatedAt)
        .order_by_desc(import_job::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one of the user's import jobs.
pub async fn get_job(db: &DatabaseConnection, user_id: i64, job_id: i64) -> Result<import_job::Model> {
    ImportJob::find_by_id(job_id)
        .one(db)
        .await?
        .filter(|j| j.created_by == user_id)
        .ok_or(Error::NotFound {
            entity: "Import job",
            id: job_id,
        })
}

/// The raw snapshot stored for a completed job, if any.
pub async fn snapshot(
    db: &DatabaseConnection,
    user_id: i64,
    job_id: i64,
) -> Result<Option<raw_import_data::Model>> {
    let job = get_job(db, user_id, job_id).await?;
    RawImportData::find()
        .filter(raw_import_data::Column::ImportJobId.eq(job.id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Deletes one of the user's import jobs and its snapshot. Imported transactions stay.
pub async fn delete_job(db: &DatabaseConnection, user_id: i64, job_id: i64) -> Result<()> {
    let job = get_job(db, user_id, job_id).await?;

    let txn = db.begin().await?;
    RawImportData::delete_many()
        .filter(raw_import_data::Column::ImportJobId.eq(job.id))
        .exec(&txn)
        .await?;
    job.delete(&txn).await?;
    txn.commit().await?;

    info!(job_id, "Deleted import job");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::transaction::{TransactionFilter, list_transactions};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    const SAMPLE: &str = "date,amount,description,category,account,type\n\
        2025-01-03,-45.20,Groceries,Food,Checking,expense\n\
        01/15/2025,3000,Salary,,Checking,income\n\
        28/01/2025,-12.5,\"Coffee, beans\"\n\
        2025-02-01\n\
        not-a-date,-5,Mystery\n";

    fn request(file_name: &str) -> ImportRequest {
        ImportRequest {
            file_name: file_name.to_string(),
            category: Some("Imported".to_string()),
            import_type: Some("bank".to_string()),
            description: None,
        }
    }

    #[test]
    fn test_source_type_from_file_name() {
        assert_eq!(SourceType::from_file_name("bank.CSV"), SourceType::Csv);
        assert_eq!(SourceType::from_file_name("bank.xlsx"), SourceType::Excel);
        assert_eq!(SourceType::from_file_name("bank.xls"), SourceType::Excel);
        assert_eq!(SourceType::from_file_name("bank.txt"), SourceType::Unknown);
    }

    #[test]
    fn test_parse_date_formats() {
        let today = date(2025, 6, 1);
        assert_eq!(parse_date("2025-01-03", today), date(2025, 1, 3));
        assert_eq!(parse_date("01/15/2025", today), date(2025, 1, 15));
        assert_eq!(parse_date("28/01/2025", today), date(2025, 1, 28));
        assert_eq!(parse_date("03/04/2025", today), date(2025, 3, 4));
        assert_eq!(parse_date("yesterday", today), today);
    }

    #[test]
    fn test_parse_csv_rows() {
        let today = date(2025, 6, 1);
        let rows = parse_csv(SAMPLE.as_bytes(), today).unwrap();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].amount, -45.2);
        assert_eq!(rows[0].category.as_deref(), Some("Food"));
        assert_eq!(rows[1].date, date(2025, 1, 15));
        assert_eq!(rows[1].category, None);
        assert_eq!(rows[2].description.as_deref(), Some("Coffee, beans"));
        assert_eq!(rows[3].date, today);
    }

    #[test]
    fn test_parse_csv_rejects_bad_amount() {
        let result = parse_csv(b"date,amount\n2025-01-01,twelve\n", date(2025, 1, 1));
        assert!(matches!(result.unwrap_err(), Error::Import { .. }));
    }

    #[tokio::test]
    async fn test_empty_file_rejected_without_job() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let result = process_import(
            &db,
            1,
            &ImportConfig::default(),
            request("empty.csv"),
            b"",
            date(2025, 1, 1),
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_oversized_file_rejected() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let limits = ImportConfig { max_file_bytes: 4 };
        let result =
            process_import(&db, 1, &limits, request("big.csv"), b"date,amount", date(2025, 1, 1))
                .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_csv_import_completes() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let job = process_import(
            &db,
            user.id,
            &ImportConfig::default(),
            request("bank.csv"),
            SAMPLE.as_bytes(),
            date(2025, 6, 1),
        )
        .await?;

        assert_eq!(job.status, STATUS_COMPLETED);
        assert_eq!(job.record_count, 4);
        assert!(job.completed_at.is_some());

        let imported = list_transactions(&db, user.id, &TransactionFilter::default()).await?;
        assert_eq!(imported.len(), 4);
        assert!(imported.iter().all(|t| t.import_id == Some(job.id)));
        let salary = imported.iter().find(|t| t.amount == 3000.0).unwrap();
        assert_eq!(salary.category.as_deref(), Some("Imported"));
        assert_eq!(salary.transaction_type, "income");

        let raw = snapshot(&db, user.id, job.id).await?.unwrap();
        assert_eq!(raw.source_type, "CSV");
        assert_eq!(raw.raw_data.as_array().map(Vec::len), Some(4));

        Ok(())
    }

    #[tokio::test]
    async fn test_bad_amount_fails_job_and_stores_nothing() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let job = process_import(
            &db,
            user.id,
            &ImportConfig::default(),
            request("bank.csv"),
            b"date,amount\n2025-01-01,-10\n2025-01-02,abc\n",
            date(2025, 6, 1),
        )
        .await?;

        assert_eq!(job.status, STATUS_FAILED);
        assert!(job.error_message.unwrap().contains("abc"));
        assert!(job.completed_at.is_some());
        assert!(
            list_transactions(&db, user.id, &TransactionFilter::default())
                .await?
                .is_empty()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_excel_upload_fails_job() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let job = process_import(
            &db,
            user.id,
            &ImportConfig::default(),
            request("bank.xlsx"),
            b"PK\x03\x04",
            date(2025, 6, 1),
        )
        .await?;
        assert_eq!(job.status, STATUS_FAILED);
        assert!(job.error_message.unwrap().contains("EXCEL"));
        Ok(())
    }

    #[tokio::test]
    async fn test_history_and_delete() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let other = create_test_user(&db, "other").await?;
        let limits = ImportConfig::default();
        let first = process_import(
            &db,
            user.id,
            &limits,
            request("a.csv"),
            b"date,amount\n2025-01-01,-1\n",
            date(2025, 6, 1),
        )
        .await?;
        let second = process_import(
            &db,
            user.id,
            &limits,
            request("b.csv"),
            b"date,amount\n2025-01-02,-2\n",
            date(2025, 6, 1),
        )
        .await?;

        let jobs = history(&db, user.id).await?;
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, second.id);
        assert!(history(&db, other.id).await?.is_empty());

        assert!(matches!(
            delete_job(&db, other.id, first.id).await.unwrap_err(),
            Error::NotFound { .. }
        ));
        delete_job(&db, user.id, first.id).await?;
        assert_eq!(history(&db, user.id).await?.len(), 1);
        assert_eq!(
            list_transactions(&db, user.id, &TransactionFilter::default())
                .await?
                .len(),
            2
        );
        Ok(())
    }
}
