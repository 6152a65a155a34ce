//! Report commands.

use crate::{
    cli::{AppContext, Output, clearable},
    core::report::{self, ExportFormat, NewReport, ReportChanges, TYPE_FINANCIAL},
    entities::{report as report_entity, user},
    errors::Result,
};
use clap::Subcommand;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Save a report definition
    Create {
        name: String,
        #[arg(long = "type", default_value = TYPE_FINANCIAL)]
        report_type: String,
        #[arg(long)]
        description: Option<String>,
        /// Let every user read the report
        #[arg(long)]
        public: bool,
        /// Configuration as a JSON document
        #[arg(long = "configuration")]
        configuration: Option<String>,
    },
    /// Your reports plus public ones
    List {
        #[arg(long = "type")]
        report_type: Option<String>,
    },
    /// Show one report definition
    Show { id: i64 },
    /// Change fields of one of your reports
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        /// Empty text clears the description
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "type")]
        report_type: Option<String>,
        #[arg(long)]
        public: Option<bool>,
        /// Empty text clears the configuration
        #[arg(long = "configuration")]
        configuration: Option<String>,
    },
    /// Delete one of your reports
    Delete { id: i64 },
    /// Produce the report body
    Generate { id: i64 },
    /// Export a report to csv, excel or pdf
    Export {
        id: i64,
        format: String,
        /// Write the document here instead of printing it
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn parse_configuration(raw: Option<String>) -> Result<Option<serde_json::Value>> {
    raw.map(|text| serde_json::from_str(&text))
        .transpose()
        .map_err(Into::into)
}

fn report_line(r: &report_entity::Model) -> String {
    format!(
        "#{:<4} {:<24} {:<10} {}  modified {}",
        r.id,
        r.name,
        r.report_type,
        if r.is_public { "public " } else { "private" },
        r.last_modified.format("%Y-%m-%d %H:%M"),
    )
}

pub async fn run(
    ctx: &AppContext,
    user: &user::Model,
    command: ReportCommand,
    out: Output,
) -> Result<()> {
    let db = &ctx.database;

    match command {
        ReportCommand::Create {
            name,
            report_type,
            description,
            public,
            configuration,
        } => {
            let input = NewReport {
                name,
                description,
                report_type,
                is_public: public,
                configuration: parse_configuration(configuration)?,
            };
            let created = report::create_report(db, user.id, input).await?;
            out.emit(&created, |r| format!("📄 Created report\n{}", report_line(r)))
        }
        ReportCommand::List { report_type } => {
            let reports = report::list_reports(db, user.id, report_type.as_deref()).await?;
            out.emit(&reports, |reports| {
                if reports.is_empty() {
                    return "📭 No reports yet.".to_string();
                }
                reports.iter().map(report_line).collect::<Vec<_>>().join("\n")
            })
        }
        ReportCommand::Show { id } => {
            let found = report::get_report(db, user.id, id).await?;
            out.emit(&found, |r| {
                format!(
                    "{}\nDescription: {}\nConfiguration: {}",
                    report_line(r),
                    r.description.as_deref().unwrap_or("-"),
                    r.configuration.as_deref().unwrap_or("-"),
                )
            })
        }
        ReportCommand::Update {
            id,
            name,
            description,
            report_type,
            public,
            configuration,
        } => {
            let changes = ReportChanges {
                name,
                description: clearable(description),
                report_type,
                is_public: public,
                configuration: clearable(configuration)
                    .map(parse_configuration)
                    .transpose()?,
            };
            let updated = report::update_report(db, user.id, id, changes).await?;
            out.emit(&updated, |r| format!("✅ Updated report\n{}", report_line(r)))
        }
        ReportCommand::Delete { id } => {
            report::delete_report(db, user.id, id).await?;
            out.success(&format!("Deleted report #{id}"))
        }
        ReportCommand::Generate { id } => {
            let generated = report::generate_report(db, user.id, id).await?;
            out.emit(&generated, |g| {
                let body = g
                    .data
                    .as_ref()
                    .map(serde_json::to_string_pretty)
                    .transpose()
                    .unwrap_or_else(|e| Some(format!("❌ Could not render report: {e}")))
                    .unwrap_or_else(|| "No data for this report type.".to_string());
                format!("📄 {} ({})\n{body}", g.name, g.report_type)
            })
        }
        ReportCommand::Export { id, format, out: path } => {
            let format: ExportFormat = format.parse()?;
            let exported = report::export_report(db, user.id, id, &format).await?;
            match path {
                Some(path) => {
                    std::fs::write(&path, &exported.body)?;
                    info!(file = %path.display(), "Wrote exported report");
                    out.success(&format!("Exported report #{id} to {}", path.display()))
                }
                None => out.emit(&exported, |e| e.body.clone()),
            }
        }
    }
}
