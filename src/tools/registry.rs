use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::error::{AppError, ToolError};
use crate::tools::args::{ToolName, ToolRequest};
use crate::tools::builtin;
use crate::tools::definition::{ParamType, ToolCall, ToolSpec};

/// The fixed tool catalog. Built once at startup, never mutated.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    specs: Vec<ToolSpec>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new(specs: Vec<ToolSpec>) -> Result<Self, AppError> {
        let mut index = HashMap::new();
        for (i, spec) in specs.iter().enumerate() {
            if index.insert(spec.name.clone(), i).is_some() {
                return Err(AppError::Config(format!("duplicate tool name '{}'", spec.name)));
            }
            let mut seen = HashSet::new();
            for param in &spec.parameters {
                if !seen.insert(param.name.as_str()) {
                    return Err(AppError::Config(format!(
                        "tool '{}' declares parameter '{}' twice",
                        spec.name, param.name
                    )));
                }
                if param.required && param.default.is_some() {
                    return Err(AppError::Config(format!(
                        "tool '{}' parameter '{}' is required but declares a default",
                        spec.name, param.name
                    )));
                }
            }
        }
        Ok(Self { specs, index })
    }

    /// The built-in catalog, checked so every entry has a handler and every handler an entry.
    pub fn builtin() -> Result<Self, AppError> {
        let registry = Self::new(builtin::definitions())?;
        registry.check_handlers()?;
        Ok(registry)
    }

    pub fn check_handlers(&self) -> Result<(), AppError> {
        for spec in &self.specs {
            if ToolName::from_name(&spec.name).is_none() {
                return Err(AppError::Config(format!(
                    "tool '{}' has no registered handler",
                    spec.name
                )));
            }
        }
        for name in ToolName::ALL {
            if !self.index.contains_key(name.as_str()) {
                return Err(AppError::Config(format!(
                    "handler '{name}' has no catalog entry"
                )));
            }
        }
        Ok(())
    }

    pub fn list(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn resolve(&self, name: &str) -> Result<&ToolSpec, ToolError> {
        self.index
            .get(name)
            .map(|&i| &self.specs[i])
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub fn wire_catalog(&self) -> Vec<Value> {
        self.specs.iter().map(ToolSpec::to_wire).collect()
    }

    /// Schema-checks the call's arguments, applies defaults and decodes the typed request.
    pub fn validate(&self, call: &ToolCall) -> Result<ToolRequest, ToolError> {
        let spec = self.resolve(&call.name)?;
        let mut args = match &call.arguments {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            _ => {
                return Err(ToolError::InvalidArguments {
                    tool: spec.name.clone(),
                    parameters: Vec::new(),
                    reason: "arguments must be a JSON object".to_string(),
                })
            }
        };
        // Explicit nulls count as absent.
        args.retain(|_, v| !v.is_null());

        let mut offending: Vec<String> = Vec::new();
        let mut reasons: Vec<String> = Vec::new();
        let mut integral_floats: Vec<String> = Vec::new();
        for param in &spec.parameters {
            match args.get(&param.name) {
                None if param.required => {
                    offending.push(param.name.clone());
                    reasons.push(format!("missing required parameter '{}'", param.name));
                }
                None => {
                    if let Some(default) = &param.default {
                        args.insert(param.name.clone(), default.clone());
                    }
                }
                Some(value) => {
                    if let Err(reason) = check_type(&param.kind, value) {
                        offending.push(param.name.clone());
                        reasons.push(format!("'{}' {reason}", param.name));
                    } else if param.kind == ParamType::Integer && value.is_f64() {
                        integral_floats.push(param.name.clone());
                    }
                }
            }
        }
        // Some backends send 6.0 for 6; the typed decode wants a whole number.
        for name in integral_floats {
            if let Some(n) = args.get(&name).and_then(as_integer) {
                args.insert(name, Value::from(n));
            }
        }
        for key in args.keys() {
            if spec.param(key).is_none() {
                offending.push(key.clone());
                reasons.push(format!("unknown parameter '{key}'"));
            }
        }
        if !offending.is_empty() {
            return Err(ToolError::InvalidArguments {
                tool: spec.name.clone(),
                parameters: offending,
                reason: reasons.join("; "),
            });
        }

        let name = ToolName::from_name(&spec.name)
            .ok_or_else(|| ToolError::NotImplemented(spec.name.clone()))?;
        ToolRequest::decode(name, Value::Object(args)).map_err(|e| ToolError::InvalidArguments {
            tool: spec.name.clone(),
            parameters: Vec::new(),
            reason: e.to_string(),
        })
    }
}

fn check_type(kind: &ParamType, value: &Value) -> Result<(), String> {
    match kind {
        ParamType::String => value
            .as_str()
            .map(|_| ())
            .ok_or_else(|| "must be a string".to_string()),
        ParamType::Integer => as_integer(value)
            .map(|_| ())
            .ok_or_else(|| "must be a non-negative integer".to_string()),
        ParamType::StringArray => match value.as_array() {
            Some(items) if items.iter().all(Value::is_string) => Ok(()),
            _ => Err("must be an array of strings".to_string()),
        },
        ParamType::Enum { values } => match value.as_str() {
            Some(s) if values.iter().any(|v| v == s) => Ok(()),
            _ => Err(format!("must be one of: {}", values.join(", "))),
        },
    }
}

fn as_integer(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        })
        .filter(|n| *n <= u64::from(u32::MAX))
}
