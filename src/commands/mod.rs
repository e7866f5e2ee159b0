pub mod chat;
pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/chat", post(chat::chat))
        .route("/chat/clear", post(chat::clear))
        .route("/chat/sessions", get(chat::sessions))
        .route("/tools", get(chat::tools))
        .with_state(state)
}
