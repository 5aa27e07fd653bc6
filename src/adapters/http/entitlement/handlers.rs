//! HTTP handlers for subscription and gated content endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::entitlement::{
    CheckoutSettings, CreatePostCommand, CreatePostHandler, CreateReplyCommand,
    CreateReplyHandler, EntitlementGate, GetSubscriptionStatusHandler,
    GetSubscriptionStatusQuery, HandleProviderWebhookCommand, HandleProviderWebhookHandler,
    IssueCheckoutSessionCommand, IssueCheckoutSessionHandler,
};
use crate::domain::entitlement::{EntitlementError, WebhookError};
use crate::ports::{BillingProvider, ContentWriter, EntitlementReader, EntitlementRepository};

use super::dto::{
    CheckoutSessionResponse, ContentCreatedResponse, CreatePostRequest, CreateReplyRequest,
    ErrorResponse, HealthResponse, SubscriptionStatusResponse, WebhookAckResponse,
};

/// Header carrying the provider's webhook signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the subscription endpoints.
///
/// Handlers are built once at startup and shared behind `Arc`.
#[derive(Clone)]
pub struct SubscriptionAppState {
    pub issue_checkout: Arc<IssueCheckoutSessionHandler>,
    pub webhook: Arc<HandleProviderWebhookHandler>,
    pub status: Arc<GetSubscriptionStatusHandler>,
}

impl SubscriptionAppState {
    pub fn new(
        repository: Arc<dyn EntitlementRepository>,
        provider: Arc<dyn BillingProvider>,
        webhook: HandleProviderWebhookHandler,
        checkout: CheckoutSettings,
    ) -> Self {
        Self {
            issue_checkout: Arc::new(IssueCheckoutSessionHandler::new(
                repository.clone(),
                provider,
                checkout,
            )),
            webhook: Arc::new(webhook),
            status: Arc::new(GetSubscriptionStatusHandler::new(repository)),
        }
    }
}

/// Shared state for the gated content endpoints.
#[derive(Clone)]
pub struct ContentAppState {
    pub create_post: Arc<CreatePostHandler>,
    pub create_reply: Arc<CreateReplyHandler>,
}

impl ContentAppState {
    pub fn new(reader: Arc<dyn EntitlementReader>, writer: Arc<dyn ContentWriter>) -> Self {
        let gate = EntitlementGate::new(reader);
        Self {
            create_post: Arc::new(CreatePostHandler::new(gate.clone(), writer.clone())),
            create_reply: Arc::new(CreateReplyHandler::new(gate, writer)),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscription Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/subscription/create-checkout-session - Start a hosted checkout
pub async fn create_checkout_session(
    State(state): State<SubscriptionAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let cmd = IssueCheckoutSessionCommand { user_id: user.id };

    let result = state.issue_checkout.handle(cmd).await?;

    Ok(Json(CheckoutSessionResponse::from(result)))
}

/// GET /api/subscription - Current user's entitlement view
pub async fn get_subscription(
    State(state): State<SubscriptionAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let query = GetSubscriptionStatusQuery { user_id: user.id };

    let result = state.status.handle(query).await?;

    Ok(Json(SubscriptionStatusResponse::from(result)))
}

/// POST /api/subscription/webhook - Billing provider event delivery
///
/// Authenticated by signature only; the body must reach the verifier
/// byte-for-byte, so it is taken as raw `Bytes`.
pub async fn handle_webhook(
    State(state): State<SubscriptionAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandleProviderWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    let result = state.webhook.handle(cmd).await?;
    tracing::info!(
        event_id = %result.event_id,
        event_type = %result.event_type,
        outcome = ?result.outcome,
        "webhook processed"
    );

    Ok(Json(WebhookAckResponse::received()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Content Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/posts - Create a post (active subscription required)
pub async fn create_post(
    State(state): State<ContentAppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let cmd = CreatePostCommand {
        author_id: user.id,
        title: request.title,
        content: request.content,
    };

    let created = state.create_post.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(ContentCreatedResponse::from(created))))
}

/// POST /api/posts/:post_id/replies - Reply to a post (active subscription required)
pub async fn create_reply(
    State(state): State<ContentAppState>,
    RequireAuth(user): RequireAuth,
    Path(post_id): Path<i64>,
    Json(request): Json<CreateReplyRequest>,
) -> Result<impl IntoResponse, EntitlementApiError> {
    let cmd = CreateReplyCommand {
        author_id: user.id,
        post_id,
        content: request.content,
    };

    let created = state.create_reply.handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(ContentCreatedResponse::from(created))))
}

/// GET /health - Liveness probe
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts entitlement errors to HTTP responses.
#[derive(Debug)]
pub struct EntitlementApiError(EntitlementError);

impl From<EntitlementError> for EntitlementApiError {
    fn from(err: EntitlementError) -> Self {
        Self(err)
    }
}

impl IntoResponse for EntitlementApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            EntitlementError::UserNotFound(_) => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            EntitlementError::AccountDeactivated(_) => {
                (StatusCode::FORBIDDEN, "ACCOUNT_DEACTIVATED")
            }
            EntitlementError::SubscriptionRequired { .. } => {
                (StatusCode::FORBIDDEN, "SUBSCRIPTION_REQUIRED")
            }
            EntitlementError::ProviderUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "PROVIDER_UNAVAILABLE")
            }
            EntitlementError::ValidationFailed { .. } => {
                (StatusCode::BAD_REQUEST, "VALIDATION_FAILED")
            }
            EntitlementError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = match &self.0 {
            EntitlementError::ValidationFailed { field, .. } => ErrorResponse::with_details(
                error_code,
                self.0.message(),
                serde_json::json!({ "field": field }),
            ),
            // Store internals stay in the log.
            EntitlementError::Infrastructure(_) => {
                ErrorResponse::new(error_code, "Internal server error")
            }
            _ => ErrorResponse::new(error_code, self.0.message()),
        };
        (status, Json(body)).into_response()
    }
}

/// API error type for webhook deliveries.
///
/// 4xx rejects a delivery that will fail the same way on every attempt;
/// 5xx reports a transient failure that a redelivery can fix. Neither
/// acknowledges the event: only 2xx does.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if self.0.is_retryable() {
            tracing::error!(error = %self.0, "webhook processing failed, provider will retry");
        }

        let body = ErrorResponse::new(self.0.code(), self.0.to_string());
        (status, Json(body)).into_response()
    }
}
