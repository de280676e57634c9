mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use aeomon_core::{load_app_config, Environment};
use aeomon_db::{connect_pool, run_migrations, PoolConfig};
use aeomon_report::build_pipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = load_app_config()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(env = %config.env, addr = %config.bind_addr, "starting aeomon-server");

    let pool = connect_pool(&config.database_url, PoolConfig::from_app_config(&config)).await?;
    run_migrations(&pool).await?;

    let pipeline = Arc::new(build_pipeline(pool.clone(), &config)?);
    let _scheduler = scheduler::build_scheduler(Arc::clone(&pipeline)).await?;

    let is_development = config.env == Environment::Development;
    let auth = middleware::AuthState::from_env(is_development)?;
    let state = api::AppState {
        pool,
        pipeline,
        manual_timeout: Duration::from_secs(config.manual_trigger_timeout_secs),
    };
    let app = api::build_app(state, auth, api::default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
