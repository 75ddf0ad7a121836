//! Structured output over tool calling
//!
//! The model is handed a single `submit_*` tool whose input schema is the
//! requested type and is forced to call it. The tool input is then
//! deserialized into that type.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::{CompletionRequest, LlmClient, LlmError, Message, ToolChoice, ToolDefinition};

/// A type the model can be asked to produce
pub trait StructuredOutput: DeserializeOwned {
    /// Type name used in tool names and error messages
    const NAME: &'static str;

    /// Name of the submit tool offered to the model
    fn tool_name() -> String {
        format!("submit_{}", to_snake_case(Self::NAME))
    }

    /// Tool description shown to the model
    fn description() -> &'static str;

    /// JSON Schema of the tool input
    fn schema() -> Value;
}

/// Ask the model for an instance of `T`
///
/// Returns `Ok(None)` when the model produced nothing usable: no submit call
/// and no JSON body. A submit call whose input does not deserialize is an
/// error rather than nothing.
pub async fn complete_structured<T: StructuredOutput>(
    llm: &dyn LlmClient,
    system_prompt: &str,
    user_prompt: &str,
    max_tokens: u32,
) -> Result<Option<T>, LlmError> {
    let tool_name = T::tool_name();
    debug!(schema = T::NAME, %tool_name, "complete_structured: called");

    let request = CompletionRequest {
        system_prompt: system_prompt.to_string(),
        messages: vec![Message::user(user_prompt)],
        tools: vec![ToolDefinition::new(&tool_name, T::description(), T::schema())],
        tool_choice: ToolChoice::Tool(tool_name.clone()),
        max_tokens,
    };

    let response = llm.complete(request).await?;

    if let Some(call) = response.tool_calls.iter().find(|c| c.name == tool_name) {
        debug!(schema = T::NAME, "complete_structured: found submit call");
        let value = serde_json::from_value(call.input.clone())
            .map_err(|source| LlmError::SchemaMismatch { schema: T::NAME, source })?;
        return Ok(Some(value));
    }

    // Some providers answer in plain text despite the forced tool
    if let Some(content) = &response.content
        && let Some(json) = extract_json(content)
        && let Ok(value) = serde_json::from_str::<T>(json)
    {
        debug!(schema = T::NAME, "complete_structured: parsed JSON from text content");
        return Ok(Some(value));
    }

    warn!(
        schema = T::NAME,
        tool_calls = response.tool_calls.len(),
        has_content = response.content.is_some(),
        "complete_structured: model returned nothing usable"
    );
    Ok(None)
}

/// Find the JSON object in a text reply, tolerating markdown fences
fn extract_json(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, ToolCall};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Greeting {
        text: String,
    }

    impl StructuredOutput for Greeting {
        const NAME: &'static str = "GreetingCard";

        fn description() -> &'static str {
            "Submit a greeting"
        }

        fn schema() -> Value {
            serde_json::json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"]
            })
        }
    }

    #[test]
    fn test_tool_name() {
        assert_eq!(Greeting::tool_name(), "submit_greeting_card");
        assert_eq!(to_snake_case("TaskPlan"), "task_plan");
        assert_eq!(to_snake_case("Plan"), "plan");
    }

    #[test]
    fn test_extract_json_from_fenced_block() {
        let text = "Here you go:\n```json\n{\"text\": \"hi\"}\n```";
        assert_eq!(extract_json(text), Some("{\"text\": \"hi\"}"));
        assert_eq!(extract_json("no json here"), None);
    }

    #[tokio::test]
    async fn test_submit_call_is_parsed() {
        let llm = MockLlmClient::new(vec![CompletionResponse::tool_use(vec![ToolCall::new(
            "call_1",
            "submit_greeting_card",
            serde_json::json!({"text": "hello"}),
        )])]);

        let result = complete_structured::<Greeting>(&llm, "system", "say hi", 1000)
            .await
            .unwrap();

        assert_eq!(result, Some(Greeting { text: "hello".to_string() }));

        let request = &llm.requests()[0];
        assert_eq!(request.tools.len(), 1);
        assert_eq!(request.tool_choice, ToolChoice::Tool("submit_greeting_card".to_string()));
    }

    #[tokio::test]
    async fn test_json_text_fallback() {
        let llm = MockLlmClient::new(vec![CompletionResponse::text("```json\n{\"text\": \"fallback\"}\n```")]);

        let result = complete_structured::<Greeting>(&llm, "system", "say hi", 1000)
            .await
            .unwrap();

        assert_eq!(result, Some(Greeting { text: "fallback".to_string() }));
    }

    #[tokio::test]
    async fn test_nothing_returned() {
        let llm = MockLlmClient::new(vec![CompletionResponse::text("I cannot help with that.")]);

        let result = complete_structured::<Greeting>(&llm, "system", "say hi", 1000)
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_malformed_submit_is_error() {
        let llm = MockLlmClient::new(vec![CompletionResponse::tool_use(vec![ToolCall::new(
            "call_1",
            "submit_greeting_card",
            serde_json::json!({"wrong": 1}),
        )])]);

        let result = complete_structured::<Greeting>(&llm, "system", "say hi", 1000).await;

        assert!(matches!(result, Err(LlmError::SchemaMismatch { schema: "GreetingCard", .. })));
    }
}
