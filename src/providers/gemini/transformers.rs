//! Request body construction for `streamGenerateContent`

use serde_json::{json, Map, Value};

use crate::formatting::{thinking_budget, FormattedMessage};
use crate::providers::http::ReasoningParam;
use crate::providers::{AdapterRequest, RequestOptions};
use crate::types::{Role, ToolDefinition};

pub(crate) const THINKING_CONFIG: ReasoningParam = ReasoningParam {
    name: "thinkingConfig",
    mentions: &["thinking"],
};

/// Schema keywords Gemini's OpenAPI subset accepts as-is.
const SCHEMA_KEYS: &[&str] = &[
    "description",
    "enum",
    "format",
    "maxItems",
    "maximum",
    "maxLength",
    "minItems",
    "minimum",
    "minLength",
    "nullable",
    "pattern",
    "propertyOrdering",
    "required",
    "title",
];

pub(crate) fn build_generate_body(
    request: &AdapterRequest,
    options: RequestOptions,
) -> (Value, Option<ReasoningParam>) {
    let mut body = json!({ "contents": build_contents(&request.messages) });
    if let Some(system) = request
        .config
        .system_prompt
        .as_deref()
        .filter(|prompt| !prompt.trim().is_empty())
    {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    if !request.config.tools.is_empty() {
        body["tools"] = json!([{ "functionDeclarations": build_tools(&request.config.tools) }]);
    }

    if !(options.reasoning_params && request.show_thoughts()) {
        return (body, None);
    }
    body["generationConfig"] = json!({
        "thinkingConfig": {
            "includeThoughts": true,
            "thinkingBudget": thinking_budget(request.config.reasoning_effort),
        }
    });
    (body, Some(THINKING_CONFIG))
}

pub fn build_contents(messages: &[FormattedMessage]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            let mut parts = Vec::new();
            match message.role {
                Role::User => {
                    parts.extend(message.media.iter().map(|part| {
                        json!({ "inlineData": { "mimeType": part.mime_type, "data": part.base64 } })
                    }));
                }
                Role::Assistant => {
                    parts.extend(message.tool_calls.iter().map(|call| {
                        json!({ "functionCall": { "name": call.namespaced_name, "args": call.arguments } })
                    }));
                }
                Role::ToolResults => {
                    parts.extend(message.tool_results.iter().map(|result| {
                        json!({
                            "functionResponse": {
                                "name": result.namespaced_name,
                                "response": { "content": result.content },
                            }
                        })
                    }));
                }
            }
            if !message.text.is_empty() || parts.is_empty() {
                parts.insert(0, json!({ "text": message.text }));
            }
            let role = match message.role {
                Role::Assistant => "model",
                Role::User | Role::ToolResults => "user",
            };
            json!({ "role": role, "parts": parts })
        })
        .collect()
}

pub fn build_tools(tools: &[ToolDefinition]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.namespaced_name(),
                "description": tool.description,
                "parameters": sanitize_schema(&tool.input_schema),
            })
        })
        .collect()
}

/// Reduce a JSON schema to the subset Gemini accepts.
///
/// Unknown keywords (`$schema`, `additionalProperties`, `default`, ...) are
/// dropped, and a `["T", "null"]` type union becomes `T` plus `nullable`.
pub fn sanitize_schema(schema: &Value) -> Value {
    let Value::Object(map) = schema else {
        return schema.clone();
    };
    let mut out = Map::new();
    for (key, value) in map {
        match key.as_str() {
            "type" => match value {
                Value::Array(types) => {
                    let mut concrete = types.iter().filter(|t| t.as_str() != Some("null"));
                    if let Some(first) = concrete.next() {
                        out.insert(key.clone(), first.clone());
                    }
                    if types.iter().any(|t| t.as_str() == Some("null")) {
                        out.insert("nullable".to_string(), Value::Bool(true));
                    }
                }
                other => {
                    out.insert(key.clone(), other.clone());
                }
            },
            "properties" => {
                if let Value::Object(properties) = value {
                    let cleaned = properties
                        .iter()
                        .map(|(name, property)| (name.clone(), sanitize_schema(property)))
                        .collect();
                    out.insert(key.clone(), Value::Object(cleaned));
                }
            }
            "items" => {
                out.insert(key.clone(), sanitize_schema(value));
            }
            "anyOf" => {
                if let Value::Array(variants) = value {
                    out.insert(
                        key.clone(),
                        Value::Array(variants.iter().map(sanitize_schema).collect()),
                    );
                }
            }
            known if SCHEMA_KEYS.contains(&known) => {
                out.insert(key.clone(), value.clone());
            }
            _ => {}
        }
    }
    Value::Object(out)
}
