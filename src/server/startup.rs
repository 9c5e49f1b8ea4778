use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::server::{
    config::Config,
    discord::DiscordClient,
    error::Error,
    event::{EventDispatcher, TracingEventSink},
    model::app::AppState,
    scheduler::{Reconciler, Scheduler},
};

/// Connect to the database and run migrations
pub async fn connect_to_database(config: &Config) -> Result<DatabaseConnection, Error> {
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};

    let mut opt = ConnectOptions::new(&config.database_url);
    opt.sqlx_logging(false);

    let db = Database::connect(opt).await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Build the guild platform client with the configured bot token and request timeout
pub fn build_discord_client(config: &Config) -> Result<DiscordClient, Error> {
    Ok(DiscordClient::with_timeout(
        &config.discord_api_url,
        &config.discord_token,
        config.request_timeout,
    )?)
}

/// Assemble the shared state, lifecycle events are written to the log
pub fn build_state(db: DatabaseConnection, discord: DiscordClient) -> AppState {
    AppState::new(
        db,
        Arc::new(discord),
        EventDispatcher::new().with_sink(Arc::new(TracingEventSink)),
    )
}

/// Start the expiration reconciler on the configured interval
pub async fn start_scheduler(
    config: &Config,
    state: &AppState,
) -> Result<tokio_cron_scheduler::JobScheduler, Error> {
    let scheduler = Scheduler::new(Reconciler::from_state(state)).await?;

    scheduler.start(config.reconcile_interval).await
}
