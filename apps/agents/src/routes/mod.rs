pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::evaluation::handlers as evaluation;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Résumé evaluation
        .route(
            "/api/v1/events/storage",
            post(evaluation::handle_storage_event),
        )
        .route("/api/v1/evaluations", post(evaluation::handle_evaluate))
        .route(
            "/api/v1/candidates/:id",
            get(evaluation::handle_get_candidate),
        )
        // Restaurant assistant
        .route("/api/v1/chat", post(chat::handle_chat))
        .with_state(state)
}
