//! Process wiring shared by the binaries.
//!
//! Turns validated configuration into live infrastructure: the tracing
//! subscriber, the PostgreSQL pool, the Stripe client, and the shutdown
//! signal.

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::adapters::postgres::MIGRATOR;
use crate::adapters::stripe::{StripeBillingProvider, StripeConfig};
use crate::config::{BillingConfig, DatabaseConfig, ServerConfig};
use crate::ports::ProviderError;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter. Production logs are JSON;
/// everything else gets the human-readable format.
pub fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&server.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    if server.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Opens the connection pool and applies migrations when configured.
pub async fn connect_database(database: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .min_connections(database.min_connections)
        .max_connections(database.max_connections)
        .acquire_timeout(database.connect_timeout())
        .connect(&database.url)
        .await?;
    tracing::info!(max_connections = database.max_connections, "database pool created");

    if database.run_migrations {
        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;
        tracing::info!("database migrations applied");
    }

    Ok(pool)
}

/// Builds the Stripe client with the configured key, timeout, and base URL.
pub fn billing_provider(billing: &BillingConfig) -> Result<StripeBillingProvider, ProviderError> {
    let mut config =
        StripeConfig::new(billing.secret_key.clone()).with_timeout(billing.provider_timeout());
    if let Some(url) = &billing.api_base_url {
        config = config.with_base_url(url.clone());
    }

    if billing.is_live_mode() {
        tracing::info!("Stripe client in live mode");
    } else {
        tracing::info!("Stripe client in test mode");
    }

    StripeBillingProvider::new(config)
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
