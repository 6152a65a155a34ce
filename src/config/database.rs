//! Database configuration module for `FinancePortal`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`
//! and created only when missing, so the command line can open the same file on every run.

use crate::entities::{
    AnalyticsResult, Budget, FinancialGoal, ImportJob, RawImportData, Report, Transaction, User,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, Statement};
use std::path::Path;
use tracing::debug;

/// Default location of the `SQLite` database file.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/finance_portal.sqlite?mode=rwc";

/// Establishes a connection to the `SQLite` database at `database_url`.
///
/// For file-backed URLs the parent directory is created first so a fresh checkout
/// can run without any setup.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(parent) = sqlite_file_path(database_url).and_then(|p| Path::new(p).parent()) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    Database::connect(database_url).await.map_err(Into::into)
}

/// Extracts the file path from a `sqlite://` URL, ignoring in-memory databases.
fn sqlite_file_path(database_url: &str) -> Option<&str> {
    let rest = database_url.strip_prefix("sqlite://")?;
    let path = rest.split('?').next()?;
    if path.is_empty() || path.contains(":memory:") {
        None
    } else {
        Some(path)
    }
}

/// Creates all necessary database tables using `SeaORM`'s schema generation from entity definitions.
///
/// Relational tables and the two JSON document tables live in the same database.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Transaction).await?;
    create_table(db, &schema, Budget).await?;
    create_table(db, &schema, FinancialGoal).await?;
    create_table(db, &schema, ImportJob).await?;
    create_table(db, &schema, Report).await?;
    create_table(db, &schema, AnalyticsResult).await?;
    create_table(db, &schema, RawImportData).await?;

    Ok(())
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<()> {
    debug!("Ensuring table {}", entity.table_name());
    let builder = db.get_database_backend();
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;
    Ok(())
}

/// Runs `SELECT 1` against the database to confirm it answers queries.
pub async fn check_connection(db: &DatabaseConnection) -> Result<()> {
    let backend = db.get_database_backend();
    db.query_one(Statement::from_string(backend, "SELECT 1")).await?;
    Ok(())
}
