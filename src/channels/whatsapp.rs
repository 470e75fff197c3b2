//! WhatsApp inbound channel — the Twilio webhook surface.
//!
//! Pure I/O plumbing: decode the Twilio form, hand the message to the
//! dispatcher, acknowledge. The webhook always answers 200 — internal
//! failures are absorbed into the fallback reply, never surfaced to the
//! transport as an error.

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::State,
    extract::rejection::FormRejection,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::dispatch::Dispatcher;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// Build the Axum router for the webhook server.
pub fn webhook_routes(dispatcher: Arc<Dispatcher>) -> Router {
    let state = AppState { dispatcher };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/webhook", post(inbound_message))
        .with_state(state)
}

async fn root() -> impl IntoResponse {
    "PulseAI backend is running. POST /webhook for Twilio messages."
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "service": "pulseai" }))
}

/// Twilio's inbound message form (subset of the fields it posts).
#[derive(Debug, Deserialize)]
pub struct TwilioInbound {
    /// Message text.
    #[serde(rename = "Body", default)]
    pub body: String,
    /// Sender identity, e.g. "whatsapp:+234800...".
    #[serde(rename = "From", default)]
    pub from: String,
}

/// One invocation per inbound chat message.
///
/// The transport always sees a successful acknowledgment: even a payload
/// the form decoder rejects is answered 200, since surfacing an error to
/// Twilio would only trigger redelivery of something we cannot parse.
async fn inbound_message(
    State(state): State<AppState>,
    payload: Result<Form<TwilioInbound>, FormRejection>,
) -> impl IntoResponse {
    let Form(inbound) = match payload {
        Ok(form) => form,
        Err(rejection) => {
            warn!(error = %rejection, "Webhook payload not decodable, acknowledging anyway");
            return "OK";
        }
    };

    info!(from = %inbound.from, "Webhook received message");

    let result = state.dispatcher.handle_inbound(&inbound.from, &inbound.body).await;
    info!(from = %inbound.from, outcome = result.label(), "Webhook handled message");

    // Always acknowledge; the citizen-facing outcome was the reply.
    "OK"
}
