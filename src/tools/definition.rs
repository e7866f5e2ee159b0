use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamType {
    String,
    Integer,
    StringArray,
    Enum { values: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: ParamType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn new(name: &str, kind: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    fn json_schema(&self) -> Value {
        let mut out = Map::new();
        match &self.kind {
            ParamType::String => {
                out.insert("type".to_string(), Value::from("string"));
            }
            ParamType::Integer => {
                out.insert("type".to_string(), Value::from("integer"));
            }
            ParamType::StringArray => {
                out.insert("type".to_string(), Value::from("array"));
                out.insert("items".to_string(), serde_json::json!({ "type": "string" }));
            }
            ParamType::Enum { values } => {
                out.insert("type".to_string(), Value::from("string"));
                out.insert("enum".to_string(), serde_json::json!(values));
            }
        }
        if let Some(default) = &self.default {
            out.insert("default".to_string(), default.clone());
        }
        out.insert("description".to_string(), Value::from(self.description.clone()));
        Value::Object(out)
    }
}

/// One entry of the fixed tool catalog. Parameters keep declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        for p in &self.parameters {
            properties.insert(p.name.clone(), p.json_schema());
        }
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }

    /// The function-tool shape the model backend consumes.
    pub fn to_wire(&self) -> Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_schema()
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { data: Value },
    NotFound,
    Unsatisfied { data: Value },
    Rejected { parameters: Vec<String> },
    Fault { detail: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub name: String,
    pub outcome: ToolOutcome,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ToolResult {
    pub fn success(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Success { .. })
    }

    pub fn data(&self) -> Option<&Value> {
        match &self.outcome {
            ToolOutcome::Success { data } => Some(data),
            _ => None,
        }
    }

    pub fn error_detail(&self) -> Option<&str> {
        match &self.outcome {
            ToolOutcome::Fault { detail } => Some(detail),
            _ => None,
        }
    }

    /// `{success, data?, error?, message}` as handed to the model and HTTP callers.
    pub fn to_wire(&self) -> Value {
        let mut out = Map::new();
        out.insert("success".to_string(), Value::Bool(self.success()));
        match &self.outcome {
            ToolOutcome::Success { data } => {
                out.insert("data".to_string(), data.clone());
            }
            ToolOutcome::NotFound => {}
            ToolOutcome::Unsatisfied { data } => {
                out.insert("data".to_string(), data.clone());
            }
            ToolOutcome::Rejected { parameters } => {
                if !parameters.is_empty() {
                    out.insert(
                        "data".to_string(),
                        serde_json::json!({ "invalid_parameters": parameters }),
                    );
                }
            }
            ToolOutcome::Fault { detail } => {
                out.insert("error".to_string(), Value::String(detail.clone()));
            }
        }
        out.insert("message".to_string(), Value::String(self.message.clone()));
        Value::Object(out)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolTrace {
    pub call: ToolCall,
    pub result: ToolResult,
}
