mod api_doc;
mod auth;
mod error;
mod handlers;
mod setup;
mod state;

use digisewa_core::Config;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,sqlx=warn")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (database, storage, ledger, routes)
    let (_state, router) = setup::initialize_app(config.clone()).await?;

    // Start the server
    setup::start_server(&config, router).await?;

    Ok(())
}
