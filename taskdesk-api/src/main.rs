//! # TaskDesk API Server
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/taskdesk \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p taskdesk-api
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON log lines and `RUST_LOG` to adjust levels.

use taskdesk_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskdesk_shared::db::{
    migrations::{get_migration_status, run_migrations},
    pool::{close_pool, create_pool},
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(
        "TaskDesk API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::load()?;

    let pool = create_pool(&config.database).await?;
    if config.database.run_migrations {
        run_migrations(&pool).await?;
    }

    let schema = get_migration_status(&pool).await?;
    if schema.is_up_to_date {
        tracing::info!(
            applied = schema.applied_migrations,
            latest = ?schema.latest_version,
            "Database schema is current"
        );
    } else {
        tracing::warn!(
            applied = schema.applied_migrations,
            latest = ?schema.latest_version,
            "Database schema is behind; enable DATABASE__RUN_MIGRATIONS or migrate manually"
        );
    }

    let bind_address = config.bind_address();
    let state = AppState::new(pool.clone(), config)?;
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskdesk_api=debug,taskdesk_shared=info,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
