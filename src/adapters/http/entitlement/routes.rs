//! Axum router configuration for subscription and content endpoints.

use std::time::Duration;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use super::handlers::{
    create_checkout_session, create_post, create_reply, get_subscription, handle_webhook, health,
    ContentAppState, SubscriptionAppState,
};
use crate::adapters::http::middleware::{auth_middleware, AuthState};

/// Cross-cutting HTTP settings applied to every API route.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub request_timeout: Duration,
    /// Allowed CORS origins; empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cors_origins: Vec::new(),
        }
    }
}

/// Subscription routes that require a bearer token.
///
/// - `GET /` - Current user's entitlement view
/// - `POST /create-checkout-session` - Start a hosted checkout
pub fn subscription_routes() -> Router<SubscriptionAppState> {
    Router::new()
        .route("/", get(get_subscription))
        .route("/create-checkout-session", post(create_checkout_session))
}

/// Webhook route, authenticated by payload signature instead of a token.
///
/// - `POST /webhook` - Billing provider event delivery
pub fn webhook_routes() -> Router<SubscriptionAppState> {
    Router::new().route("/webhook", post(handle_webhook))
}

/// Gated content routes.
///
/// - `POST /` - Create a post
/// - `POST /:post_id/replies` - Reply to a post
pub fn content_routes() -> Router<ContentAppState> {
    Router::new()
        .route("/", post(create_post))
        .route("/:post_id/replies", post(create_reply))
}

/// Builds the complete application router.
///
/// Content routes are mounted only when `content` is supplied; without a
/// content store there is nothing for them to write to.
///
/// ```ignore
/// let app = entitlement_router(subscription_state, Some(content_state), auth, RouterSettings::default());
/// axum::serve(listener, app).await?;
/// ```
pub fn entitlement_router(
    subscription: SubscriptionAppState,
    content: Option<ContentAppState>,
    auth: AuthState,
    settings: RouterSettings,
) -> Router {
    let authenticated = middleware::from_fn_with_state(auth, auth_middleware);

    let subscription_api = Router::new()
        .merge(subscription_routes().route_layer(authenticated.clone()))
        .merge(webhook_routes())
        .with_state(subscription);

    let mut api = Router::new().nest("/subscription", subscription_api);

    if let Some(content) = content {
        api = api.nest(
            "/posts",
            content_routes()
                .route_layer(authenticated)
                .with_state(content),
        );
    }

    // Outermost first
    let layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&settings.cors_origins))
        .layer(TimeoutLayer::new(settings.request_timeout));

    Router::new()
        .nest("/api", api)
        .layer(layers)
        // Health stays outside the timeout
        .route("/health", get(health))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
