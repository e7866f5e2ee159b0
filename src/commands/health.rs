use axum::Json;
use chrono::Utc;

use crate::models::chat::HealthResponse;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "Course advisor backend is running".to_string(),
        timestamp: Utc::now(),
    })
}
