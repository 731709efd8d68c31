use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use saas_api::{build_router, AppState};
use saas_core::billing_provider::BillingProvider;
use saas_infrastructure::{create_pool, postgres_repositories, run_migrations, StripeClient};
use saas_shared::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize telemetry
    saas_shared::telemetry::init_telemetry();

    info!("SaaS server starting...");

    // Load configuration
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Connect to Database
    info!("Connecting to database...");
    let pool = create_pool(&config.database).await?;
    if config.database.run_migrations {
        run_migrations(&pool).await?;
    }
    info!("Database connection established.");

    // Billing provider
    let provider: Arc<dyn BillingProvider> =
        Arc::new(StripeClient::new(&config.billing.secret_key, &config.billing.api_base)?);

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));

    // Create App State and router
    let state = AppState::new(config, postgres_repositories(pool), provider);
    let app = build_router(state);

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
