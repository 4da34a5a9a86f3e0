use keystone_agent::{GenerationParams, ModelClient};
use keystone_core::{AgentContext, AgentError, ProjectInput};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::debug;

/// What a JSON-producing agent expects back from the model.
#[derive(Debug, Clone, Copy)]
pub struct JsonTask {
    pub temperature: f32,
    /// Keys the reply object must contain.
    pub required_keys: &'static [&'static str],
    /// Completion marker stamped onto the agent's output as `status`.
    pub status: &'static str,
}

fn fence_pattern() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n?(.*?)\s*```\s*$").ok())
        .as_ref()
}

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    fence_pattern()
        .and_then(|re| re.captures(raw))
        .and_then(|caps| caps.get(1))
        .map_or_else(|| raw.trim(), |m| m.as_str().trim())
}

/// Parse a model reply into a JSON object that has every key in `required`.
pub fn parse_reply(raw: &str, required: &[&str]) -> Result<Map<String, Value>, AgentError> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| AgentError::malformed(format!("reply is not valid JSON: {e}")))?;
    let Value::Object(map) = value else {
        return Err(AgentError::malformed("reply is not a JSON object"));
    };

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|key| !map.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(AgentError::malformed(format!(
            "reply is missing required keys: {}",
            missing.join(", ")
        )));
    }
    Ok(map)
}

/// Ask the model for a JSON object and validate it against `task`.
///
/// The returned object carries `status` set to the task's completion marker.
pub async fn ask_json(
    client: &dyn ModelClient,
    agent: &str,
    prompt: &str,
    task: &JsonTask,
) -> Result<Map<String, Value>, AgentError> {
    debug!(agent = %agent, prompt_len = prompt.len(), "Requesting JSON analysis");
    let raw = client
        .generate_text(prompt, &GenerationParams::json(task.temperature))
        .await?;
    let mut map = parse_reply(&raw, task.required_keys)?;
    map.insert("status".into(), Value::String(task.status.into()));
    Ok(map)
}

/// Appended to every JSON prompt.
pub fn json_instruction(task: &JsonTask) -> String {
    format!(
        "\n\nRespond STRICTLY with a single JSON object containing the keys: {}.",
        task.required_keys
            .iter()
            .map(|k| format!("'{k}'"))
            .collect::<Vec<_>>()
            .join(", ")
    )
}

/// The brief rendered for inclusion in a prompt.
pub fn brief_json(input: &ProjectInput) -> String {
    serde_json::to_string_pretty(input).unwrap_or_default()
}

/// A dependency's output rendered for inclusion in a prompt, with failed
/// dependencies shown as an unavailability marker.
pub fn upstream_block(ctx: &AgentContext, agent: &str) -> String {
    serde_json::to_string_pretty(&ctx.upstream_json(agent)).unwrap_or_default()
}

/// Comma-joined strings of a dependency's list field, or `fallback`.
pub fn upstream_list(ctx: &AgentContext, agent: &str, field: &str, fallback: &str) -> String {
    let items: Vec<&str> = ctx
        .dependency(agent)
        .and_then(|d| d.get(field))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}
