mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{call, harness, text, tool_request, Harness, Step};
use course_advisor::commands::router;
use course_advisor::state::AppState;

fn app(h: &Harness) -> Router {
    router(AppState::new(h.advisor.clone()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn empty_message_is_a_bad_request() {
    let h = harness(Vec::new());
    let app = app(&h);

    let (status, body) = send(&app, "POST", "/chat", Some(json!({ "message": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Message is required" }));

    let (status, _) = send(&app, "POST", "/chat", Some(json!({ "sessionId": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(h.provider.seen().is_empty());
}

#[tokio::test]
async fn chat_round_trip_reports_tool_envelopes() {
    let h = harness(vec![
        tool_request(vec![call(
            "call_1",
            "build_semester_schedule",
            json!({ "course_codes": ["CS-5", "MATH-55"], "max_credits": 6 }),
        )]),
        text("Here is your schedule."),
    ]);
    let app = app(&h);

    let (status, body) = send(
        &app,
        "POST",
        "/chat",
        Some(json!({ "message": "Plan my fall", "sessionId": "stu-1" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Here is your schedule.");
    assert_eq!(body["sessionId"], "stu-1");
    assert_eq!(body["toolsUsed"], true);
    assert_eq!(body["toolResults"][0]["success"], true);
    assert_eq!(body["toolResults"][0]["data"]["schedule"]["remaining_capacity"], 0);
    assert!(body["timestamp"].is_string());

    let (status, body) = send(&app, "GET", "/chat/sessions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessions"][0]["sessionId"], "stu-1");
    assert_eq!(body["sessions"][0]["messageCount"], 2);
}

#[tokio::test]
async fn missing_session_id_uses_the_default_session() {
    let h = harness(vec![text("hi there")]);
    let app = app(&h);

    let (status, body) = send(&app, "POST", "/chat", Some(json!({ "message": "hi" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessionId"], "default");
    assert_eq!(body["toolsUsed"], false);
    assert_eq!(body["toolResults"], json!([]));
}

#[tokio::test]
async fn turn_fault_maps_to_internal_server_error() {
    let h = harness(vec![Step::Fail("connection reset".to_string())]);
    let app = app(&h);

    let (status, body) = send(&app, "POST", "/chat", Some(json!({ "message": "hi" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert!(body["message"].as_str().unwrap().starts_with("AI processing failed"));

    let (_, sessions) = send(&app, "GET", "/chat/sessions", None).await;
    assert_eq!(sessions["sessions"], json!([]));
}

#[tokio::test]
async fn clear_is_idempotent() {
    let h = harness(vec![text("ok")]);
    let app = app(&h);
    send(&app, "POST", "/chat", Some(json!({ "message": "hi", "sessionId": "a" }))).await;

    for _ in 0..2 {
        let (status, body) = send(&app, "POST", "/chat/clear", Some(json!({ "sessionId": "a" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Conversation history cleared");
        assert_eq!(body["sessionId"], "a");
    }
    let (status, body) = send(&app, "POST", "/chat/clear", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessionId"], "default");

    let (_, sessions) = send(&app, "GET", "/chat/sessions", None).await;
    assert_eq!(sessions["sessions"], json!([]));
}

#[tokio::test]
async fn tools_and_health_endpoints() {
    let h = harness(Vec::new());
    let app = app(&h);

    let (status, body) = send(&app, "GET", "/tools", None).await;
    assert_eq!(status, StatusCode::OK);
    let tools = body["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 6);
    assert!(tools.iter().all(|t| t["type"] == "function"));
    assert_eq!(tools[0]["function"]["name"], "search_courses");
    assert_eq!(tools[0]["function"]["parameters"]["type"], "object");

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn finished_chat_turns_release_their_session_locks() {
    let h = harness(vec![text("one"), text("two")]);
    let state = AppState::new(h.advisor.clone());
    let locks = state.locks.clone();
    let app = router(state);

    send(&app, "POST", "/chat", Some(json!({ "message": "hi", "sessionId": "a" }))).await;
    send(&app, "POST", "/chat", Some(json!({ "message": "hi", "sessionId": "b" }))).await;

    assert_eq!(locks.len().await, 0);
}
