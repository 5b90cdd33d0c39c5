//! Inbound interaction endpoint.
//!
//! The bridge posts each classified interaction as JSON and relays the
//! returned reply to the platform. Follow-up work runs after the reply is
//! returned, so the acknowledgment never waits on it.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use huddle_conversation::{Interaction, InteractionRouter, Reply};
use tower_http::trace::TraceLayer;

/// Builds the HTTP routes.
pub fn routes(router: InteractionRouter) -> Router {
    Router::new()
        .route("/interactions", post(handle_interaction))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(router)
}

async fn handle_interaction(
    State(router): State<InteractionRouter>,
    Json(interaction): Json<Interaction>,
) -> Json<Reply> {
    let response = router.handle(interaction).await;
    if let Some(work) = response.follow_up {
        tokio::spawn(work);
    }
    Json(response.reply)
}

async fn health() -> &'static str {
    "ok"
}
