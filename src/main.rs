//! Entitlement Sync server
//!
//! Serves the subscription API and runs the reconciliation scheduler in
//! the same process.
//!
//! ## REST Endpoints
//!
//! - `GET /api/subscription` - Current user's entitlement view
//! - `POST /api/subscription/create-checkout-session` - Start a hosted checkout
//! - `POST /api/subscription/webhook` - Stripe webhook handler
//! - `GET /health` - Liveness probe

use std::sync::Arc;

use tokio::sync::watch;

use entitlement_sync::adapters::auth::{JwtConfig, JwtSessionValidator};
use entitlement_sync::adapters::http::{
    entitlement_router, AuthState, RouterSettings, SubscriptionAppState,
};
use entitlement_sync::adapters::postgres::{
    PostgresEntitlementRepository, PostgresProcessedEventLog,
};
use entitlement_sync::application::handlers::entitlement::{
    CheckoutSettings, HandleProviderWebhookHandler, ReconcileEntitlementsHandler,
    ReconciliationScheduler,
};
use entitlement_sync::config::AppConfig;
use entitlement_sync::domain::entitlement::WebhookVerifier;
use entitlement_sync::ports::{BillingProvider, EntitlementRepository};
use entitlement_sync::runtime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    runtime::init_tracing(&config.server);
    config.validate()?;

    tracing::info!(
        environment = ?config.server.environment,
        port = config.server.port,
        reconciliation_enabled = config.reconciliation.enabled,
        "starting entitlement-sync"
    );

    let pool = runtime::connect_database(&config.database).await?;
    let repository: Arc<dyn EntitlementRepository> =
        Arc::new(PostgresEntitlementRepository::new(pool.clone()));
    let event_log = Arc::new(PostgresProcessedEventLog::new(pool.clone()));
    let provider: Arc<dyn BillingProvider> = Arc::new(runtime::billing_provider(&config.billing)?);

    let webhook = HandleProviderWebhookHandler::new(
        repository.clone(),
        event_log,
        WebhookVerifier::new(config.billing.webhook_secret.clone()),
    )
    .with_expected_livemode(config.billing.is_live_mode());
    let subscription_state = SubscriptionAppState::new(
        repository.clone(),
        provider.clone(),
        webhook,
        CheckoutSettings::from_redirect_base(
            config.billing.price_id.clone(),
            &config.billing.redirect_base_url,
        ),
    );

    let auth: AuthState = Arc::new(JwtSessionValidator::new(
        JwtConfig::new(config.auth.jwt_secret.clone())
            .with_issuer(config.auth.issuer.clone())
            .with_leeway(config.auth.leeway_secs),
    ));

    // Post storage lives in the main application; this service has no
    // ContentWriter of its own, so the gated content routes stay unmounted.
    let app = entitlement_router(
        subscription_state,
        None,
        auth,
        RouterSettings {
            request_timeout: config.server.request_timeout(),
            cors_origins: config.server.cors_origins_list(),
        },
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler_task = if config.reconciliation.enabled {
        let handler = Arc::new(ReconcileEntitlementsHandler::new(repository, provider));
        let scheduler =
            ReconciliationScheduler::new(handler).with_interval(config.reconciliation.interval());
        let rx = shutdown_rx.clone();
        Some(tokio::spawn(async move { scheduler.run(rx).await }))
    } else {
        tracing::info!("reconciliation scheduler disabled");
        None
    };

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(runtime::shutdown_signal())
        .await?;

    // Stop the scheduler; an in-flight sweep halts before its next user
    let _ = shutdown_tx.send(true);
    if let Some(task) = scheduler_task {
        match task.await {
            Ok(sweeps) => tracing::info!(sweeps, "reconciliation scheduler joined"),
            Err(e) => tracing::error!(error = %e, "reconciliation scheduler panicked"),
        }
    }

    pool.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}
