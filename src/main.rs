use clap::Parser;
use dotenvy::dotenv;
use finance_portal::{
    cli::{self, AppContext, Cli},
    config::{database, settings},
    core::auth,
    errors::Result,
};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();

    let cli = Cli::parse();
    match start(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

async fn start(cli: Cli) -> Result<()> {
    // 3. Load the application configuration
    let config = settings::load_app_configuration(&cli.config)?;

    // 4. Open the database and make sure the schema exists
    let db = database::create_connection(&config.database_url)
        .await
        .inspect(|_| info!("Database connected"))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;

    // 5. Seed configured accounts
    let seeded = auth::seed_users(&db, &config.users, config.auth.password_cost)
        .await
        .inspect_err(|e| error!("Failed to seed users: {}", e))?;
    if seeded > 0 {
        info!(seeded, "Seeded user accounts");
    }

    // 6. Run the command
    let ctx = AppContext::new(db, config);
    cli::run(cli, &ctx).await
}
