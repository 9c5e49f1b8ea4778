use licensy::server::{config::Config, startup};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        tracing::error!("Licensy stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), licensy::server::error::Error> {
    let db = startup::connect_to_database(&config).await?;
    let discord = startup::build_discord_client(&config)?;
    let state = startup::build_state(db, discord);

    let mut scheduler = startup::start_scheduler(&config, &state).await?;

    tracing::info!("Licensy engine running");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }

    tracing::info!("Shutting down");
    scheduler.shutdown().await?;

    Ok(())
}
