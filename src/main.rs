use sqlx::migrate::Migrator;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use market_core::auth::TokenIssuer;
use market_core::gateway::PaystackClient;
use market_core::{config, create_app, db, startup, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::Config::from_env()?;

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database pool
    let pool = db::create_pool(&config).await?;

    // Run migrations
    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;
    tracing::info!("Database migrations completed");

    // Startup validation
    let report = startup::validate_environment(&config, &pool).await?;
    report.print();
    if !report.is_valid() {
        anyhow::bail!("startup validation failed");
    }

    // Payment gateway client
    let gateway = PaystackClient::new(
        config.paystack_base_url.clone(),
        config.paystack_secret_key.clone(),
    );
    tracing::info!(base_url = %config.paystack_base_url, "payment gateway client initialized");

    let tokens = TokenIssuer::new(&config.jwt_secret, config.jwt_ttl_hours);

    let state = AppState::new(pool, Arc::new(gateway), tokens);

    let cors = match &config.cors_allowed_origins {
        Some(origins) => {
            let origins = origins
                .split(',')
                .filter_map(|o| o.trim().parse::<axum::http::HeaderValue>().ok())
                .collect::<Vec<_>>();
            CorsLayer::new().allow_origin(origins)
        }
        None => CorsLayer::new().allow_origin(Any),
    };

    let app = create_app(state).layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
