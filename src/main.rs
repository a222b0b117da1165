use center_stats::config::{database, settings};
use center_stats::core::context::LogNotifier;
use center_stats::core::submission::SubmissionCoordinator;
use center_stats::errors::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Engine settings
    let config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!(
        reporting_weekday = %config.submission.reporting_weekday,
        grace_days = config.submission.accountability_grace_days,
        "Configuration loaded"
    );

    // 4. Database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database schema ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Coordinator; notifications go to the log until a mail transport is configured
    let coordinator = SubmissionCoordinator::new(db, config.submission, Arc::new(LogNotifier));
    info!(
        database = %database::get_database_url(),
        settings = ?coordinator.settings(),
        "Submission engine ready"
    );
    Ok(())
}
