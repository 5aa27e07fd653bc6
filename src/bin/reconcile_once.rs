//! One-shot reconciliation sweep.
//!
//! Runs a single sweep against the configured database and Stripe account,
//! prints the report as JSON, and exits. Intended for cron or manual
//! repair. Exits non-zero only when the sweep could not start; per-user
//! failures are counted in the report.

use std::sync::Arc;

use tokio::sync::watch;

use entitlement_sync::adapters::postgres::PostgresEntitlementRepository;
use entitlement_sync::application::handlers::entitlement::ReconcileEntitlementsHandler;
use entitlement_sync::config::AppConfig;
use entitlement_sync::runtime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    runtime::init_tracing(&config.server);
    config.validate()?;

    let pool = runtime::connect_database(&config.database).await?;
    let handler = ReconcileEntitlementsHandler::new(
        Arc::new(PostgresEntitlementRepository::new(pool.clone())),
        Arc::new(runtime::billing_provider(&config.billing)?),
    );

    // Ctrl+C stops the sweep before the next user
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        runtime::shutdown_signal().await;
        let _ = cancel_tx.send(true);
    });

    let report = handler.run(&cancel_rx).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    pool.close().await;
    Ok(())
}
