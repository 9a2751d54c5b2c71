use std::sync::Arc;
use std::time::Duration;

use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fspiop_core::bus::InMemoryBus;
use fspiop_core::ParticipantDirectory;
use fspiop_dispatcher::{DispatcherState, HttpCallbackSender, HttpParticipantDirectory, StaticParticipantDirectory};
use fspiop_gateway::{
    config::GatewayConfig, ingress, metrics, routes, state::AppState,
};

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = GatewayConfig::from_env().expect("Failed to load configuration");
    let port = config.port;
    let rate_limit_rpm = config.rate_limit_rpm;

    tracing::info!("Starting fspiop-gateway on port {}", port);
    tracing::info!("Switch FSP identity: {}", config.switch_fsp_id);
    tracing::info!(
        "JWS verification: {}",
        if config.jws_enabled { "enabled" } else { "disabled" }
    );

    // Register Prometheus metrics
    metrics::register_metrics();
    fspiop_dispatcher::metrics::register_metrics(&metrics::REGISTRY);

    // Event bus: the producer feeds the HTTP handlers, the consumer feeds
    // the embedded dispatcher
    let (producer, consumer) = InMemoryBus::channel(config.bus_capacity);

    // Outbound HTTP client shared by the callback sender and the directory
    let client =
        HttpCallbackSender::build_client(CALLBACK_TIMEOUT).expect("Failed to build HTTP client");

    let directory: Arc<dyn ParticipantDirectory> = match &config.directory_url {
        Some(url) => {
            tracing::info!("Participant directory: {}", url);
            Arc::new(HttpParticipantDirectory::new(client.clone(), url.clone()))
        }
        None => {
            tracing::info!(
                "Participant directory: static ({} endpoints)",
                config.participant_endpoints.len()
            );
            Arc::new(StaticParticipantDirectory::from_pairs(
                &config.participant_endpoints,
            ))
        }
    };

    // Embedded dispatcher: consume loop runs until the last producer handle
    // drops, which happens when the server stops
    let dispatcher_state = DispatcherState::new(
        config.switch_fsp_id.clone(),
        directory,
        Arc::new(HttpCallbackSender::new(client)),
    );
    let dispatcher = fspiop_dispatcher::spawn(dispatcher_state, Box::new(consumer));

    // Create shared state
    let state = AppState::new(config, Arc::new(producer));
    let state_data = web::Data::new(state);
    let app_state = state_data.clone();

    // Configure rate limiter
    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(rate_limit_rpm as u64)
        .finish()
        .expect("Failed to create rate limiter config");

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(web::PayloadConfig::new(1024 * 1024)) // 1MB body limit
            .app_data(ingress::json_config())
            .wrap(Logger::default())
            .wrap(Governor::new(&governor_conf))
            .configure(routes::health::configure)
            .configure(routes::participants::configure)
            .configure(routes::parties::configure)
            .configure(routes::transfers::configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    // Server stopped: drop the last producer handle and join the dispatcher
    // so the bus drains before exit
    drop(state_data);
    if let Err(e) = dispatcher.await {
        tracing::warn!(error = %e, "dispatcher task did not shut down cleanly");
    }
    Ok(())
}
