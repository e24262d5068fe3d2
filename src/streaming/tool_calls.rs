//! Tool call accumulation
//!
//! Fragments are keyed by their stream-local index, never by id: vendors may
//! send the id after the first argument piece. Argument pieces are appended in
//! arrival order and parsed once, at stream end.

use std::collections::BTreeMap;

use crate::types::{ToolCallFragment, ToolCallResult, ToolDefinition, split_namespaced_name};

/// Tool call under construction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingToolCall {
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: String,
}

#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<u32, PendingToolCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn get(&self, index: u32) -> Option<&PendingToolCall> {
        self.calls.get(&index)
    }

    /// Merge one fragment. Present id/name overwrite; arguments append.
    pub fn push(&mut self, fragment: ToolCallFragment) {
        tracing::trace!(index = fragment.index, "Tool call fragment");
        let call = self.calls.entry(fragment.index).or_default();
        if let Some(id) = fragment.id.filter(|id| !id.is_empty()) {
            call.id = Some(id);
        }
        if let Some(name) = fragment.name.filter(|name| !name.is_empty()) {
            call.name = Some(name);
        }
        if let Some(arguments) = fragment.arguments {
            call.arguments.push_str(&arguments);
        }
    }

    /// Finalize every pending call in index order.
    ///
    /// An argument string that does not parse is recorded on the call instead
    /// of failing the request. Metadata is resolved from `tools` by
    /// namespaced name.
    pub fn finalize(self, tools: &[ToolDefinition]) -> Vec<ToolCallResult> {
        self.calls
            .into_iter()
            .map(|(index, call)| finalize_call(index, call, tools))
            .collect()
    }
}

fn finalize_call(index: u32, call: PendingToolCall, tools: &[ToolDefinition]) -> ToolCallResult {
    let namespaced_name = call.name.unwrap_or_default();
    let (toolset, tool_name) = split_namespaced_name(&namespaced_name);

    let trimmed = call.arguments.trim();
    let (arguments, parse_error) = if trimmed.is_empty() {
        (Some(serde_json::Value::Object(Default::default())), None)
    } else {
        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(value) => (Some(value), None),
            Err(err) => {
                tracing::warn!(
                    index,
                    tool = %namespaced_name,
                    error = %err,
                    "Tool call arguments did not parse"
                );
                (None, Some(err.to_string()))
            }
        }
    };

    let definition = tools
        .iter()
        .find(|tool| tool.namespaced_name() == namespaced_name);

    ToolCallResult {
        id: call
            .id
            .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple())),
        namespaced_name,
        toolset,
        tool_name,
        arguments,
        parse_error,
        raw_arguments: call.arguments,
        description: definition.map(|tool| tool.description.clone()),
        input_schema: definition.map(|tool| tool.input_schema.clone()),
    }
}
