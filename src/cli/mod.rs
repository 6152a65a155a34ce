//! Command line layer - argument parsing, session handling and output
//!
//! This module provides the `finance-portal` command tree, the shared context every
//! command runs against, and the helpers that resolve the signed-in user.

/// Sub-command definitions and handlers
pub mod commands;
/// Human and JSON rendering
pub mod output;

use crate::{
    config::settings::AppConfig,
    core::auth::{self, JwtManager},
    entities::user,
    errors::{Error, Result},
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sea_orm::DatabaseConnection;
use std::path::PathBuf;
use tracing::debug;

pub use output::Output;

/// Personal finance records, imports and analysis from the terminal.
#[derive(Debug, Parser)]
#[command(name = "finance-portal", version, about)]
pub struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,
    /// Access token; defaults to the one saved by `auth login`
    #[arg(long, global = true, env = "FINANCE_PORTAL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Settings file
    #[arg(long, global = true, default_value = "config.toml")]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register, log in and inspect the current session
    #[command(subcommand)]
    Auth(commands::auth::AuthCommand),
    /// Record and browse transactions
    #[command(subcommand)]
    Tx(commands::transaction::TxCommand),
    /// Manage category budgets
    #[command(subcommand)]
    Budget(commands::budget::BudgetCommand),
    /// Manage savings goals
    #[command(subcommand)]
    Goal(commands::goal::GoalCommand),
    /// Import transaction files
    #[command(subcommand)]
    Import(commands::import::ImportCommand),
    /// Summaries, category breakdowns and trends
    #[command(subcommand)]
    Analytics(commands::analytics::AnalyticsCommand),
    /// Project income, expenses and savings
    #[command(subcommand)]
    Forecast(commands::forecast::ForecastCommand),
    /// Financial health score
    #[command(subcommand)]
    Health(commands::health::HealthCommand),
    /// Dashboard widgets
    #[command(subcommand)]
    Dashboard(commands::dashboard::DashboardCommand),
    /// Saved reports
    #[command(subcommand)]
    Report(commands::report::ReportCommand),
    /// Check the database connection
    Status,
}

/// Shared state available to every command.
/// This structure holds the database connection, the loaded settings and the
/// token manager built from them.
pub struct AppContext {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Settings loaded at start-up
    pub config: AppConfig,
    /// Issues and verifies access tokens
    pub jwt: JwtManager,
}

impl AppContext {
    /// Creates a new `AppContext` from an open connection and the loaded settings.
    #[must_use]
    pub fn new(database: DatabaseConnection, config: AppConfig) -> Self {
        let jwt = JwtManager::new(&config.auth);
        Self {
            database,
            config,
            jwt,
        }
    }

    /// Token from the command line or environment, else the saved session.
    pub fn resolve_token(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(token) = explicit.filter(|t| !t.trim().is_empty()) {
            return Ok(token.trim().to_string());
        }
        let path = &self.config.auth.session_file;
        debug!(path = %path.display(), "Reading saved session");
        match std::fs::read_to_string(path) {
            Ok(saved) if !saved.trim().is_empty() => Ok(saved.trim().to_string()),
            Ok(_) => Err(not_logged_in()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_logged_in()),
            Err(e) => Err(e.into()),
        }
    }

    /// The user the resolved token belongs to.
    pub async fn current_user(&self, explicit: Option<&str>) -> Result<user::Model> {
        let token = self.resolve_token(explicit)?;
        auth::authenticate(&self.database, &self.jwt, &token).await
    }
}

fn not_logged_in() -> Error {
    Error::unauthorized("Not logged in; run `finance-portal auth login` or pass --token")
}

/// Update flag for an optional text field: absent leaves it alone, empty text clears it.
pub(crate) fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| Some(v).filter(|v| !v.trim().is_empty()))
}

/// Today's date in local time.
#[must_use]
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Runs one parsed command line against `ctx`.
pub async fn run(cli: Cli, ctx: &AppContext) -> Result<()> {
    let out = Output::new(cli.json);
    let token = cli.token.as_deref();

    match cli.command {
        Command::Auth(cmd) => commands::auth::run(ctx, token, cmd, out).await,
        Command::Status => commands::status::run(ctx, out).await,
        command => {
            let user = ctx.current_user(token).await?;
            debug!(user_id = user.id, "Authenticated");
            match command {
                Command::Tx(cmd) => commands::transaction::run(ctx, &user, cmd, out).await,
                Command::Budget(cmd) => commands::budget::run(ctx, &user, cmd, out).await,
                Command::Goal(cmd) => commands::goal::run(ctx, &user, cmd, out).await,
                Command::Import(cmd) => commands::import::run(ctx, &user, cmd, out).await,
                Command::Analytics(cmd) => commands::analytics::run(ctx, &user, cmd, out).await,
                Command::Forecast(cmd) => commands::forecast::run(ctx, &user, cmd, out).await,
                Command::Health(cmd) => commands::health::run(ctx, &user, cmd, out).await,
                Command::Dashboard(cmd) => commands::dashboard::run(ctx, &user, cmd, out).await,
                Command::Report(cmd) => commands::report::run(ctx, &user, cmd, out).await,
                Command::Auth(_) | Command::Status => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["finance-portal", "tx", "list", "--json", "--token", "abc"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(cli.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_report_configuration_does_not_shadow_settings_file() {
        let cli = Cli::try_parse_from([
            "finance-portal",
            "report",
            "create",
            "Q2",
            "--configuration",
            r#"{"a":1}"#,
            "--config",
            "other.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        match cli.command {
            Command::Report(commands::report::ReportCommand::Create { configuration, .. }) => {
                assert_eq!(configuration.as_deref(), Some(r#"{"a":1}"#));
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["finance-portal", "report", "update", "3", "--config", "x.toml"])
            .unwrap();
        assert_eq!(cli.config, PathBuf::from("x.toml"));
    }

    #[test]
    fn test_health_goals_takes_json_argument() {
        let cli = Cli::try_parse_from(["finance-portal", "health", "goals", r#"{"savings":20}"#, "--json"])
            .unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Command::Health(commands::health::HealthCommand::Goals { .. })
        ));
    }

    #[test]
    fn test_budget_update_no_end_conflicts_with_end() {
        let cli = Cli::try_parse_from(["finance-portal", "budget", "update", "4", "--no-end"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Budget(commands::budget::BudgetCommand::Update { no_end: true, end: None, .. })
        ));
        let result = Cli::try_parse_from([
            "finance-portal",
            "budget",
            "update",
            "4",
            "--no-end",
            "--end",
            "2025-12-31",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_clearable() {
        assert_eq!(clearable(None), None);
        assert_eq!(clearable(Some("  ".to_string())), Some(None));
        assert_eq!(clearable(Some("note".to_string())), Some(Some("note".to_string())));
    }

    #[tokio::test]
    async fn test_resolve_token_prefers_explicit_then_session() -> Result<()> {
        let db = setup_test_db().await?;
        let mut config = AppConfig::default();
        config.auth = test_auth_config();
        config.auth.session_file =
            std::env::temp_dir().join(format!("finance-portal-test-{}.token", std::process::id()));
        let ctx = AppContext::new(db, config);

        assert!(matches!(
            ctx.resolve_token(None).unwrap_err(),
            Error::Unauthorized { .. }
        ));

        std::fs::write(&ctx.config.auth.session_file, "saved\n")?;
        assert_eq!(ctx.resolve_token(None)?, "saved");
        assert_eq!(ctx.resolve_token(Some("flag"))?, "flag");
        std::fs::remove_file(&ctx.config.auth.session_file)?;
        Ok(())
    }
}
