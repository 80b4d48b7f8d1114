use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use sawa_api::{app, metrics::Metrics, worker, AppState, AuthConfig};
use sawa_booking::{BookingDesk, Notifier};
use sawa_core::{DocumentStore, EventPublisher, NoopPublisher};
use sawa_offer::FeeSchedule;
use sawa_store::{app_config::Config, EventProducer, MemoryStore, PgDocumentStore, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sawa_api=debug,sawa_booking=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Sawa API on port {}", config.server.port);

    let store: Arc<dyn DocumentStore> = match &config.database.url {
        Some(url) => {
            let db = PgDocumentStore::new(url).await.context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            Arc::new(db)
        }
        None => {
            tracing::warn!("No database configured, using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let redis = match &config.redis.url {
        Some(url) => Some(Arc::new(RedisClient::new(url).context("Invalid Redis URL")?)),
        None => None,
    };

    let publisher: Arc<dyn EventPublisher> = match &config.kafka.brokers {
        Some(brokers) => Arc::new(EventProducer::new(brokers).context("Failed to create Kafka producer")?),
        None => Arc::new(NoopPublisher),
    };

    // SSE Broadcast Channel
    let (updates_tx, _) = tokio::sync::broadcast::channel(100);
    let notifier = Notifier::new(store.clone(), publisher, updates_tx);

    let rules = config.business_rules.clone();
    let fees = FeeSchedule::new(rules.platform_fee_bps, rules.office_fee_bps);
    let desk = Arc::new(BookingDesk::new(store, notifier, fees));
    let metrics = Arc::new(Metrics::new().context("Failed to register metrics")?);

    tokio::spawn(worker::start_expiry_worker(desk.clone(), metrics.clone(), rules.expiry_sweep_seconds));

    let app_state = AppState {
        desk,
        redis,
        metrics,
        business_rules: rules,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
            allow_dev_tokens: config.auth.allow_dev_tokens,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
