//! Storefront back-end server

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::api::{self, AppState};
use storefront::config::Config;
use storefront::events::EventPublisher;
use storefront::payment::{PaymentGateway, SnapGateway};
use storefront::services::Services;
use storefront::storage::{MemoryStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!("NATS unavailable, domain events will only be logged: {e}");
                None
            }
        },
        None => None,
    };
    let events = EventPublisher::new(nats);
    let gateway: Arc<dyn PaymentGateway> = Arc::new(SnapGateway::new(&config.payment));

    let services = match &config.database_url {
        Some(url) => {
            let db = PgPoolOptions::new().max_connections(config.db_max_connections).connect(url).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            Services::build(Arc::new(PgStore::new(db)), &config, gateway, events)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage");
            Services::build(Arc::new(MemoryStore::new()), &config, gateway, events)
        }
    };
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let app = api::router(AppState::new(services));

    tracing::info!("storefront listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?, app).await?;
    Ok(())
}
