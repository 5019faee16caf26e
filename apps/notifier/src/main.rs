use std::sync::Arc;
use tracing::info;

mod api;
mod config;
mod observability;
mod redis;
mod server;

use config::{Config, ProviderKind};
use domain_notifications::{
    ApiState, DispatchConfig, DispatchService, EmailProvider, HistoryService,
    HttpIdentityResolver, RedisNotificationStore, SendGridProvider, SmtpProvider,
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    observability::install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    observability::init_tracing(&config.environment);

    // Select the email transport once at startup; every dispatch for
    // the lifetime of the process goes through this provider.
    let provider: Arc<dyn EmailProvider> = match config.provider {
        ProviderKind::Sendgrid => {
            info!("Using SendGrid email provider");
            Arc::new(SendGridProvider::from_env()?)
        }
        ProviderKind::Smtp => {
            info!("Using SMTP email provider");
            Arc::new(SmtpProvider::from_env()?)
        }
    };

    if !provider.configured() {
        tracing::warn!(
            provider = provider.name(),
            "Email provider looks unconfigured; sends will likely fail"
        );
    }

    let redis = redis::connect_with_retry(&config.redis_url, 5)
        .await
        .map_err(|e| eyre::eyre!("Redis connection failed: {}", e))?;

    let store = Arc::new(RedisNotificationStore::new(redis.clone()));
    let resolver = Arc::new(HttpIdentityResolver::from_env()?);

    let dispatch = DispatchService::new(
        provider,
        Arc::clone(&store),
        resolver,
        DispatchConfig::from_env(),
    )?;
    let history = HistoryService::new(store);

    let api_routes = axum::Router::new().nest(
        "/notifications",
        domain_notifications::router(ApiState {
            dispatch: Arc::new(dispatch),
            history: Arc::new(history),
        }),
    );

    let app = api::create_router::<api::ApiDoc>(api_routes)
        .merge(api::health_router(config.app))
        .merge(api::ready_router(redis));

    info!(
        "Starting {} v{} on port {}",
        config.app.name, config.app.version, config.server.port
    );

    server::create_app(app, &config.server)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Notifier shutdown complete");
    Ok(())
}
