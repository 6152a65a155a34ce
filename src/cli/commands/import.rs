//! Import commands - load CSV files and manage import jobs.

use crate::{
    cli::{AppContext, Output, today},
    core::import::{self, ImportRequest, STATUS_FAILED},
    entities::{import_job, user},
    errors::{Error, Result},
};
use clap::Subcommand;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Subcommand)]
pub enum ImportCommand {
    /// Import transactions from a CSV file
    File {
        path: PathBuf,
        /// Category for rows that have none
        #[arg(long)]
        category: Option<String>,
        /// Free-form label such as the bank name
        #[arg(long = "type")]
        import_type: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List import jobs, newest first
    History,
    /// Show one import job
    Show { id: i64 },
    /// Print the raw rows stored for a job
    Snapshot { id: i64 },
    /// Delete a job and its snapshot; imported transactions are kept
    Delete { id: i64 },
}

fn job_line(job: &import_job::Model) -> String {
    let icon = if job.status == STATUS_FAILED { "❌" } else { "📥" };
    format!(
        "{icon} #{:<4} {:<24} {:<10} {:>5} rows  {}{}",
        job.id,
        job.file_name,
        job.status,
        job.record_count,
        job.created_at.format("%Y-%m-%d %H:%M"),
        job.error_message
            .as_deref()
            .map(|e| format!("\n   {e}"))
            .unwrap_or_default(),
    )
}

pub async fn run(
    ctx: &AppContext,
    user: &user::Model,
    command: ImportCommand,
    out: Output,
) -> Result<()> {
    let db = &ctx.database;

    match command {
        ImportCommand::File {
            path,
            category,
            import_type,
            description,
        } => {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| Error::validation(format!("Not a file path: {}", path.display())))?
                .to_string();
            let contents = std::fs::read(&path)?;
            info!(file = %path.display(), bytes = contents.len(), "Read import file");

            let request = ImportRequest {
                file_name,
                category,
                import_type,
                description,
            };
            let job = import::process_import(db, user.id, &ctx.config.import, request, &contents, today())
                .await?;
            out.emit(&job, job_line)
        }
        ImportCommand::History => {
            let jobs = import::history(db, user.id).await?;
            out.emit(&jobs, |jobs| {
                if jobs.is_empty() {
                    return "📭 No imports yet.".to_string();
                }
                jobs.iter().map(job_line).collect::<Vec<_>>().join("\n")
            })
        }
        ImportCommand::Show { id } => {
            let job = import::get_job(db, user.id, id).await?;
            out.emit(&job, job_line)
        }
        ImportCommand::Snapshot { id } => {
            let snapshot = import::snapshot(db, user.id, id).await?;
            out.emit(&snapshot, |s| {
                s.as_ref().map_or_else(
                    || format!("📭 No raw data stored for import #{id}."),
                    |s| {
                        serde_json::to_string_pretty(&s.raw_data)
                            .unwrap_or_else(|e| format!("❌ Could not render snapshot: {e}"))
                    },
                )
            })
        }
        ImportCommand::Delete { id } => {
            import::delete_job(db, user.id, id).await?;
            out.success(&format!("Deleted import #{id}"))
        }
    }
}
