use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::chat::{
    ChatRequest, ChatResponse, ClearRequest, ClearResponse, ErrorBody, SessionsResponse,
    ToolsResponse,
};
use crate::session::DEFAULT_SESSION_ID;
use crate::state::AppState;

fn session_or_default(session_id: Option<String>) -> String {
    session_id.unwrap_or_else(|| DEFAULT_SESSION_ID.to_string())
}

pub async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    let Some(message) = req.message.filter(|m| !m.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "Message is required".to_string(),
            }),
        )
            .into_response();
    };
    let session_id = session_or_default(req.session_id);

    let result = {
        let _turn = state.locks.acquire(&session_id).await;
        let cancel = state.shutdown.child_token();
        state.advisor.respond(&session_id, &message, &cancel).await
    };
    state.locks.forget(&session_id).await;

    match result {
        Ok(outcome) => Json(ChatResponse {
            response: outcome.response,
            session_id,
            tools_used: outcome.tools_used,
            tool_results: outcome.tool_results.iter().map(|r| r.to_wire()).collect(),
            timestamp: Utc::now(),
        })
        .into_response(),
        Err(err) => {
            warn!(
                event_name = "http.chat.failed",
                session_id = %session_id,
                kind = err.kind(),
                error = %err,
                "chat turn failed"
            );
            AppError::from(err).into_response()
        }
    }
}

pub async fn clear(
    State(state): State<AppState>,
    Json(req): Json<ClearRequest>,
) -> Result<Json<ClearResponse>, AppError> {
    let session_id = session_or_default(req.session_id);
    {
        let _turn = state.locks.acquire(&session_id).await;
        state.advisor.sessions().clear(&session_id).await?;
    }
    state.locks.forget(&session_id).await;
    info!(
        event_name = "http.chat.cleared",
        session_id = %session_id,
        "conversation history cleared"
    );
    Ok(Json(ClearResponse {
        message: "Conversation history cleared".to_string(),
        session_id,
    }))
}

pub async fn sessions(State(state): State<AppState>) -> Result<Json<SessionsResponse>, AppError> {
    let sessions = state.advisor.sessions().list_active().await?;
    Ok(Json(SessionsResponse { sessions }))
}

pub async fn tools(State(state): State<AppState>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: state.advisor.executor().registry().wire_catalog(),
    })
}
