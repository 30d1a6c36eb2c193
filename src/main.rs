use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::middleware;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

use palmares::api::{build_app, rate_limit_middleware, RateLimitState};
use palmares::config::EconomyConfig;
use palmares::forum::{SharedNotifier, TracingNotifier};
use palmares::store;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first - this validates every knob
    let config = EconomyConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        eprintln!("Please check environment variables.");
        e
    })?;

    init_logging(&config)?;

    info!("Starting Palmarès economy server");
    info!(
        "Economy settings: answer reward={} pts, stake range={}..={}, conversion={} pts/gem",
        config.economy.answer_reward_points,
        config.economy.min_stake,
        config.economy.max_stake,
        config.economy.gem_conversion_rate
    );

    let store = store::connect(&config.database).await;
    info!(backend = store.backend_name(), "Storage ready");

    if config.economy.seed_demo_data && store.backend_name() == "memory" {
        store::seed_demo_data(&store).await?;
    }

    let notifier: SharedNotifier = Arc::new(TracingNotifier);
    let rate_state = RateLimitState::new(config.security.rate_limit_per_minute);

    // check() resets a window only when that client returns; idle entries
    // are dropped by a periodic sweep.
    let limiter = rate_state.limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            limiter.cleanup();
        }
    });

    // Build the application; rate limiting sits outside the shared router
    // because it needs per-connection info from the listener.
    let app = build_app(store, notifier, &config)
        .layer(middleware::from_fn_with_state(
            rate_state,
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http());

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", bind_addr, e))?;

    info!("Palmarès server listening on {}", bind_addr);
    info!(
        "Security middleware: rate limit={}/min, max body={}KB",
        config.security.rate_limit_per_minute,
        config.security.max_request_size / 1024
    );

    // Serve with connect info for client IP extraction
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Initialize logging at the configured level
fn init_logging(config: &EconomyConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
