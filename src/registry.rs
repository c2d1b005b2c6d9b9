//! Tool registry and result envelope.
//!
//! Every tool goes through the same pipeline: validate arguments against the
//! declared schema, invoke the handler, fold the outcome into the uniform
//! `{isError, ...}` envelope, and serialize that envelope as a single
//! pretty-printed JSON text content block. Per-tool behavior is entirely data:
//! a [`ToolSpec`] carries the schema, the payload key, and whether an empty
//! result list counts as an error.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::error::ToolError;

/// Argument type accepted by a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    StringArray,
}

impl FieldKind {
    fn json_schema(self) -> Value {
        match self {
            Self::String => json!({ "type": "string" }),
            Self::Integer => json!({ "type": "integer" }),
            Self::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::StringArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }
}

/// One named field in a tool's input schema.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: &'static str,
}

impl FieldSpec {
    pub fn required(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
        }
    }
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send>>;

/// A tool handler: validated arguments in, payload or tagged error out.
pub type Handler = Arc<dyn Fn(Map<String, Value>) -> HandlerFuture + Send + Sync>;

/// Declaration of a single tool. Immutable once registered.
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: Vec<FieldSpec>,
    /// Key the success payload is wrapped under, e.g. `tasks` or `plan`.
    pub success_key: &'static str,
    /// When set, an empty result array is reported as this error instead of
    /// an empty success. Query tools use it; creation tools leave it `None`.
    pub empty_message: Option<&'static str>,
    pub handler: Handler,
}

impl ToolSpec {
    fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            let mut schema = field.kind.json_schema();
            if let Some(object) = schema.as_object_mut() {
                object.insert("description".to_string(), json!(field.description));
            }
            properties.insert(field.name.to_string(), schema);
            if field.required {
                required.push(field.name);
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Registry of tools exposed by one dispatcher instance.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<ToolSpec>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: ToolSpec) {
        self.tools.push(spec);
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// The `tools/list` catalog, in registration order.
    pub fn catalog(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .iter()
            .map(|spec| {
                json!({
                    "name": spec.name,
                    "description": spec.description,
                    "inputSchema": spec.input_schema(),
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    /// Invoke a tool by exact name. Returns `None` for unknown names - an
    /// unresolvable tool is a protocol-level error, not a tool envelope.
    pub async fn call(&self, name: &str, arguments: Value) -> Option<Value> {
        let spec = self.tools.iter().find(|spec| spec.name == name)?;

        let outcome = match validate(spec, arguments) {
            Ok(args) => (spec.handler)(args).await,
            Err(err) => Err(err),
        };

        if let Err(err) = &outcome {
            tracing::warn!(tool = name, error = %err, "tool call failed");
        }
        Some(envelope(spec, outcome))
    }
}

/// Check the raw argument mapping against the schema. Collects every
/// offending field so the caller sees all problems at once.
fn validate(spec: &ToolSpec, arguments: Value) -> Result<Map<String, Value>, ToolError> {
    let object = match arguments {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        _ => return Err(ToolError::validation("arguments (must be an object)")),
    };

    let mut offending = Vec::new();
    for field in &spec.fields {
        match object.get(field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    offending.push(field.name.to_string());
                }
            }
            Some(value) => {
                if !field.kind.matches(value) {
                    offending.push(field.name.to_string());
                }
            }
        }
    }

    if offending.is_empty() {
        Ok(object)
    } else {
        Err(ToolError::Validation { fields: offending })
    }
}

/// Fold a handler outcome into the wire envelope: a single text content block
/// holding pretty-printed JSON with an explicit `isError` flag and exactly one
/// of error-content or success-content.
fn envelope(spec: &ToolSpec, outcome: Result<Value, ToolError>) -> Value {
    let body = match outcome {
        Ok(payload) => {
            let empty = payload.as_array().is_some_and(Vec::is_empty);
            match spec.empty_message {
                Some(message) if empty => json!({ "isError": true, "error": message }),
                _ => {
                    let mut body = Map::new();
                    body.insert("isError".to_string(), json!(false));
                    body.insert(spec.success_key.to_string(), payload);
                    Value::Object(body)
                }
            }
        }
        Err(err) => json!({ "isError": true, "error": err.to_string() }),
    };

    let text = serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string());
    json!({ "content": [{ "type": "text", "text": text }] })
}
