//! HTTP front: the interactions endpoint and the liveness probe.
//!
//! Discord POSTs every interaction here and requires the endpoint to reject
//! requests whose ed25519 signature does not check out. `PING` is answered
//! inline; everything else goes to the orchestrator, whose inline response
//! is returned as the callback body.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;

use hive_discord::interaction::{kind, Interaction, InteractionResponse};
use hive_discord::verify::InteractionVerifier;

use crate::orchestrator::Orchestrator;

pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub verifier: InteractionVerifier,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/interactions", post(interactions))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// The one-liner the container platform's startup probe expects.
async fn healthz() -> &'static str {
    "I'm alive!"
}

async fn interactions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = header(&headers, "x-signature-ed25519");
    let timestamp = header(&headers, "x-signature-timestamp");
    let verified = match (signature, timestamp) {
        (Some(signature), Some(timestamp)) => state.verifier.verify(signature, timestamp, &body),
        _ => false,
    };
    if !verified {
        return (StatusCode::UNAUTHORIZED, "invalid request signature").into_response();
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(interaction) => interaction,
        Err(e) => {
            tracing::warn!(error = %e, "Undecodable interaction payload");
            return (StatusCode::BAD_REQUEST, "malformed interaction").into_response();
        }
    };

    if interaction.kind == kind::PING {
        return Json(InteractionResponse::pong()).into_response();
    }

    Json(state.orchestrator.handle(interaction).await).into_response()
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
