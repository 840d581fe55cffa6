use identity_gate::api::{AppState, start_webserver};
use identity_gate::challenge::HydraClient;
use identity_gate::config::load_config_or_panic;
use identity_gate::flows::Flows;
use identity_gate::identity::DbUserStore;
use sea_orm::Database;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "identity_gate=info,tower_http=info,sea_orm=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install().expect("Failed to install `color_eyre::install`");
    dotenvy::dotenv().ok();

    initialize_tracing();

    // Load config
    let config = load_config_or_panic();

    // Set up SeaORM database connection
    let db = Arc::new(
        Database::connect(&config.database_url)
            .await
            .expect("Failed to connect to database"),
    );

    let users = Arc::new(DbUserStore::new(db));
    let gateway = Arc::new(HydraClient::new(&config.hydra)?);
    tracing::info!(admin_url = %config.hydra.admin_url, "Using authorization server");

    let flows = Flows::new(gateway, users.clone(), users, &config);
    let state = AppState {
        flows,
        pages: Arc::new(config.pages.clone()),
    };

    start_webserver(state, &config.listen_addr).await?;
    Ok(())
}
