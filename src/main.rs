use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod db;
mod error;
mod evaluation;
mod models;
mod services;

use config::Config;
use constants::API_VERSION;
use db::Database;
use services::{EvmChallengeLedger, SettlementRelay};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fitcentive_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting Fitcentive settlement backend");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);
    if config.is_testnet() {
        tracing::info!("EVM chain {} (testnet)", config.evm_chain_id);
    }

    // Initialize database
    let db = Database::new(&config).await?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db.run_migrations().await?;

    // Challenge contract
    let ledger = EvmChallengeLedger::from_config(&config)?;
    let ledger_can_sign = ledger.can_sign();
    let relay = SettlementRelay::new(Arc::new(db.clone()), Arc::new(ledger));

    let app_state = api::AppState {
        db,
        config: config.clone(),
        relay: Arc::new(relay),
        ledger_can_sign,
    };

    // Build router
    let app = build_router(app_state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Challenges
        .route("/api/v1/challenges/types", get(api::challenges::list_types))
        .route("/api/v1/challenges/preview", post(api::challenges::preview))
        .route("/api/v1/challenges/settle", post(api::challenges::settle))
        // Scheduler
        .route(
            "/api/v1/cron/settle-challenges",
            post(api::cron::settle_challenges),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Origins from `CORS_ALLOWED_ORIGINS`; empty means any origin.
fn parse_allowed_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty() && *origin != "*")
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect()
}

// Browsers only call the read endpoints and the bearer-guarded settle routes.
fn cors_from_config(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let allowed = parse_allowed_origins(&config.cors_allowed_origins);
    if allowed.is_empty() {
        return cors.allow_origin(AllowOrigin::any());
    }
    cors.allow_origin(AllowOrigin::list(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_origins_skip_wildcards_and_blanks() {
        assert!(parse_allowed_origins("*").is_empty());
        assert!(parse_allowed_origins("  ").is_empty());

        let origins = parse_allowed_origins("https://app.fitcentive.xyz, ,http://localhost:3001");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "https://app.fitcentive.xyz");
        assert_eq!(origins[1], "http://localhost:3001");
    }

    #[test]
    fn cors_layer_builds_for_any_config() {
        let mut cfg = config::test_config();
        let _ = cors_from_config(&cfg);
        cfg.cors_allowed_origins = "https://app.fitcentive.xyz".to_string();
        let _ = cors_from_config(&cfg);
    }
}
