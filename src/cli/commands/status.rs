use crate::{
    cli::{AppContext, Output},
    config::database,
    errors::Result,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Status<'a> {
    database_url: &'a str,
    database: &'static str,
}

/// Runs `SELECT 1` and reports the outcome.
pub async fn run(ctx: &AppContext, out: Output) -> Result<()> {
    database::check_connection(&ctx.database).await?;
    let status = Status {
        database_url: &ctx.config.database_url,
        database: "ok",
    };
    out.emit(&status, |s| format!("✅ Database reachable at {}", s.database_url))
}
