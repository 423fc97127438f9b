//! Axum route handler for the restaurant assistant.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::chat::assistant::{ChatTurn, RestaurantAssistant};
use crate::errors::AppError;
use crate::state::AppState;

pub const APOLOGY: &str =
    "I apologize, but I'm having trouble processing your request right now. Please try again later.";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    /// Accepted in place of `message`.
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ChatRequest {
    fn text(&self) -> Option<&str> {
        [&self.message, &self.prompt]
            .into_iter()
            .filter_map(|v| v.as_deref().map(str::trim))
            .find(|v| !v.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub status: &'static str,
    pub response: String,
    pub customer_id: String,
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatFailure {
    pub status: &'static str,
    pub error: String,
    pub response: &'static str,
    pub message: &'static str,
}

/// POST /api/v1/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let message = request
        .text()
        .ok_or_else(|| AppError::Validation("message or prompt is required".to_string()))?;
    let customer_id = request.customer_id.as_deref().unwrap_or("anonymous");
    let session_id = request.session_id.as_deref().unwrap_or("default-session");

    let assistant = RestaurantAssistant::new(
        state.objects.as_ref(),
        state.store.as_ref(),
        state.model.as_ref(),
        &state.chat,
    );
    let turn = ChatTurn {
        message,
        customer_id,
        session_id,
    };

    match assistant.respond(&turn).await {
        Ok(response) => Ok(Json(ChatResponse {
            status: "success",
            response,
            customer_id: customer_id.to_string(),
            session_id: session_id.to_string(),
            message: "Customer request processed successfully".to_string(),
        })
        .into_response()),
        Err(err) => {
            error!(customer_id, session_id, "Chat request failed: {err}");
            let body = ChatFailure {
                status: "error",
                error: "The assistant is temporarily unavailable".to_string(),
                response: APOLOGY,
                message: "Customer request processing failed",
            };
            Ok((StatusCode::BAD_GATEWAY, Json(body)).into_response())
        }
    }
}
