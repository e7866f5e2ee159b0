use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::llm::provider::{estimate_tokens, LLMProvider, LLMResponse, Message, MessageRole, Sampling, TokenUsage};
use crate::tools::definition::{ToolCall, ToolSpec};

#[derive(Clone)]
pub struct OpenAICompatibleProvider {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl OpenAICompatibleProvider {
    pub fn new(
        api_key: String,
        model: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        if api_key.trim().is_empty() {
            return Err(AppError::Config("model backend is missing api_key".to_string()));
        }
        let base_url = normalize_openai_compatible_base_url(base_url);
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| AppError::Message(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("course-advisor/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Message(e.to_string()))?;

        Ok(Self {
            client,
            model,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn send(&self, body: Value) -> Result<LLMResponse, AppError> {
        let resp = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Message(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::Message(format!(
                "OpenAI-compatible error: {status} {text}"
            )));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Message(e.to_string()))?;
        parsed.into_response(&self.model, &body)
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    fn provider_name(&self) -> &'static str {
        "openai_compatible"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: Vec<Message>, sampling: Sampling) -> Result<LLMResponse, AppError> {
        let openai_messages = messages
            .into_iter()
            .map(to_openai_message)
            .collect::<Result<Vec<_>, AppError>>()?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": openai_messages,
            "temperature": sampling.temperature,
            "max_tokens": sampling.max_tokens
        });
        self.send(body).await
    }

    async fn chat_with_tools(
        &self,
        messages: Vec<Message>,
        tools: &[ToolSpec],
        sampling: Sampling,
    ) -> Result<LLMResponse, AppError> {
        let tool_defs = tools.iter().map(ToolSpec::to_wire).collect::<Vec<_>>();

        let openai_messages = messages
            .into_iter()
            .map(to_openai_message)
            .collect::<Result<Vec<_>, AppError>>()?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": openai_messages,
            "temperature": sampling.temperature,
            "max_tokens": sampling.max_tokens,
            "tools": tool_defs,
            "tool_choice": "auto"
        });
        self.send(body).await
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    pub choices: Vec<ChatChoice>,
    pub model: Option<String>,
    pub usage: Option<ChatUsage>,
}

impl ChatResponse {
    fn into_response(self, requested_model: &str, body: &Value) -> Result<LLMResponse, AppError> {
        let model = self.model.unwrap_or_else(|| requested_model.to_string());
        let prompt_tokens = self.usage.as_ref().and_then(|u| u.prompt_tokens);
        let completion_tokens = self.usage.as_ref().and_then(|u| u.completion_tokens);
        let estimated = prompt_tokens.is_none() || completion_tokens.is_none();

        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Message("No choices".to_string()))?;

        let content = choice.message.content.unwrap_or_default();
        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                // Unparseable arguments stay a raw string; the registry rejects them.
                let args_value = serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(Value::String(tc.function.arguments));
                ToolCall {
                    id: tc.id,
                    name: tc.function.name,
                    arguments: args_value,
                }
            })
            .collect();

        let output_estimate_text = if tool_calls.is_empty() {
            content.clone()
        } else {
            format!(
                "{content}\n{}",
                serde_json::to_string(&tool_calls).unwrap_or_default()
            )
        };

        Ok(LLMResponse {
            content,
            usage: TokenUsage {
                input_tokens: prompt_tokens.unwrap_or_else(|| estimate_tokens(&body.to_string())),
                output_tokens: completion_tokens
                    .unwrap_or_else(|| estimate_tokens(&output_estimate_text)),
                estimated,
            },
            model,
            finish_reason: choice.finish_reason,
            tool_calls,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIToolCall {
    pub id: String,
    pub function: OpenAIFunctionCall,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIFunctionCall {
    pub name: String,
    pub arguments: String,
}

fn to_openai_message(msg: Message) -> Result<Value, AppError> {
    let role = match msg.role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::Tool => "tool",
    };

    let mut out = serde_json::Map::new();
    out.insert("role".to_string(), Value::String(role.to_string()));
    out.insert(
        "content".to_string(),
        msg.content.map(Value::String).unwrap_or(Value::Null),
    );

    if let Some(tool_call_id) = msg.tool_call_id {
        out.insert("tool_call_id".to_string(), Value::String(tool_call_id));
    }

    if let Some(tool_calls) = msg.tool_calls {
        let mapped = tool_calls
            .into_iter()
            .map(|tc| {
                let args = match tc.arguments {
                    Value::String(raw) => raw,
                    other => serde_json::to_string(&other).map_err(|e| AppError::Message(e.to_string()))?,
                };
                Ok(serde_json::json!({
                    "id": tc.id,
                    "type": "function",
                    "function": { "name": tc.name, "arguments": args }
                }))
            })
            .collect::<Result<Vec<_>, AppError>>()?;
        out.insert("tool_calls".to_string(), Value::Array(mapped));
    }

    Ok(Value::Object(out))
}

pub fn normalize_openai_compatible_base_url(base_url: Option<String>) -> String {
    let default_url = "https://api.openai.com/v1".to_string();
    let Some(mut base) = base_url else {
        return default_url;
    };
    base = base.trim().to_string();
    if base.is_empty() {
        return default_url;
    }

    // Users sometimes paste full endpoint.
    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        base = trimmed
            .strip_suffix("/chat/completions")
            .unwrap_or(trimmed)
            .to_string();
    }

    // Only append /v1 when no path provided.
    match url::Url::parse(&base) {
        Ok(url) => {
            let path = url.path();
            if path.is_empty() || path == "/" {
                return format!("{}/v1", base.trim_end_matches('/'));
            }
            base.trim_end_matches('/').to_string()
        }
        Err(_) => base.trim_end_matches('/').to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn base_url_normalization() {
        assert_eq!(normalize_openai_compatible_base_url(None), "https://api.openai.com/v1");
        assert_eq!(
            normalize_openai_compatible_base_url(Some("http://localhost:11434".to_string())),
            "http://localhost:11434/v1"
        );
        assert_eq!(
            normalize_openai_compatible_base_url(Some(
                "https://example.com/v1/chat/completions".to_string()
            )),
            "https://example.com/v1"
        );
    }

    #[test]
    fn assistant_tool_request_turn_serializes_arguments_as_string() {
        let msg = Message::assistant_tool_calls(
            None,
            vec![ToolCall {
                id: "call_1".to_string(),
                name: "check_prerequisites".to_string(),
                arguments: json!({ "course_code": "CS-5" }),
            }],
        );
        let wire = to_openai_message(msg).unwrap();
        assert_eq!(wire["role"], "assistant");
        assert_eq!(wire["content"], Value::Null);
        assert_eq!(wire["tool_calls"][0]["type"], "function");
        assert_eq!(
            wire["tool_calls"][0]["function"]["arguments"],
            "{\"course_code\":\"CS-5\"}"
        );
    }

    #[test]
    fn response_parsing_keeps_tool_call_order_and_raw_bad_arguments() {
        let parsed: ChatResponse = serde_json::from_value(json!({
            "model": "gpt-test",
            "choices": [{
                "finish_reason": "tool_calls",
                "message": {
                    "content": null,
                    "tool_calls": [
                        { "id": "a", "type": "function", "function": { "name": "search_courses", "arguments": "{\"limit\":5}" } },
                        { "id": "b", "type": "function", "function": { "name": "check_prerequisites", "arguments": "{oops" } }
                    ]
                }
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 4 }
        }))
        .unwrap();

        let resp = parsed.into_response("fallback", &json!({})).unwrap();
        assert_eq!(resp.model, "gpt-test");
        assert_eq!(resp.usage.input_tokens, 10);
        assert!(!resp.usage.estimated);
        let ids: Vec<&str> = resp.tool_calls.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(resp.tool_calls[0].arguments, json!({ "limit": 5 }));
        assert_eq!(resp.tool_calls[1].arguments, Value::String("{oops".to_string()));
    }

    #[test]
    fn empty_choices_is_a_backend_error() {
        let parsed: ChatResponse =
            serde_json::from_value(json!({ "model": "m", "choices": [] })).unwrap();

        let err = parsed.into_response("fallback", &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "No choices");
    }
}
