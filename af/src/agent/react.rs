//! ReactAgent - LLM turns interleaved with tool execution

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{AgentError, AgentOutcome, ToolAgent};
use crate::llm::{CompletionRequest, CompletionResponse, ContentBlock, LlmClient, Message, StopReason, ToolChoice};
use crate::tools::{ToolContext, ToolExecutor, ToolResult};

/// Agent that loops until the model stops asking for tools
pub struct ReactAgent {
    llm: Arc<dyn LlmClient>,
    executor: ToolExecutor,
    ctx: ToolContext,
    max_turns: u32,
    max_tokens: u32,
}

impl ReactAgent {
    pub fn new(llm: Arc<dyn LlmClient>, executor: ToolExecutor, ctx: ToolContext) -> Self {
        debug!(root = ?ctx.root, "ReactAgent::new: called");
        Self {
            llm,
            executor,
            ctx,
            max_turns: 25,
            max_tokens: 16384,
        }
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Build assistant message from response
    fn build_assistant_message(response: &CompletionResponse) -> Message {
        let mut blocks = Vec::new();

        if let Some(text) = &response.content {
            blocks.push(ContentBlock::text(text));
        }

        for call in &response.tool_calls {
            blocks.push(ContentBlock::ToolUse {
                id: call.id.clone(),
                name: call.name.clone(),
                input: call.input.clone(),
            });
        }

        Message::assistant_blocks(blocks)
    }

    /// Build user message with tool results
    fn build_tool_result_message(results: &[(String, ToolResult)]) -> Message {
        let blocks: Vec<ContentBlock> = results
            .iter()
            .map(|(id, result)| ContentBlock::tool_result(id, &result.content, result.is_error))
            .collect();

        Message::user_blocks(blocks)
    }

    /// Build the follow-up to a truncated reply
    ///
    /// Tool calls cut off mid-reply are not run, but each still gets an error
    /// result so every tool use in the history is answered.
    fn build_truncation_message(response: &CompletionResponse) -> Message {
        let mut blocks: Vec<ContentBlock> = response
            .tool_calls
            .iter()
            .map(|call| {
                ContentBlock::tool_result(
                    &call.id,
                    "Not executed: the response was truncated before this call was complete.",
                    true,
                )
            })
            .collect();
        blocks.push(ContentBlock::text(
            "Continue from where you left off. Your previous response was truncated.",
        ));

        Message::user_blocks(blocks)
    }
}

#[async_trait::async_trait]
impl ToolAgent for ReactAgent {
    async fn run(&self, system_prompt: &str, user_prompt: &str) -> Result<AgentOutcome, AgentError> {
        debug!(max_turns = self.max_turns, "ReactAgent::run: called");
        let tool_defs = self.executor.definitions();
        let mut messages = vec![Message::user(user_prompt)];
        let mut outcome = AgentOutcome::default();

        loop {
            if outcome.turns >= self.max_turns {
                warn!(max_turns = self.max_turns, "Agent reached max turns without finishing");
                outcome.hit_turn_limit = true;
                break;
            }
            outcome.turns += 1;

            let request = CompletionRequest {
                system_prompt: system_prompt.to_string(),
                messages: messages.clone(),
                tools: tool_defs.clone(),
                tool_choice: ToolChoice::Auto,
                max_tokens: self.max_tokens,
            };

            let response = self.llm.complete(request).await.map_err(|source| AgentError::Llm {
                turn: outcome.turns,
                source,
            })?;
            outcome.usage.add(&response.usage);
            if response.content.is_some() {
                outcome.final_text = response.content.clone();
            }

            messages.push(Self::build_assistant_message(&response));

            match response.stop_reason {
                StopReason::ToolUse if !response.tool_calls.is_empty() => {
                    let results = self.executor.execute_all(&response.tool_calls, &self.ctx).await;

                    for (call, (_, result)) in response.tool_calls.iter().zip(&results) {
                        outcome.tool_calls.push(call.name.clone());
                        if call.name == "write_file"
                            && !result.is_error
                            && let Some(path) = call.input["path"].as_str()
                            && let Ok(resolved) = self.ctx.validate_path(Path::new(path))
                        {
                            info!(%path, "Agent wrote file");
                            outcome.written_paths.push(resolved);
                        }
                    }

                    messages.push(Self::build_tool_result_message(&results));
                }
                StopReason::MaxTokens => {
                    if !response.tool_calls.is_empty() {
                        warn!(
                            count = response.tool_calls.len(),
                            "Reply truncated, skipping its tool calls"
                        );
                    }
                    messages.push(Self::build_truncation_message(&response));
                }
                StopReason::ToolUse | StopReason::EndTurn | StopReason::StopSequence => break,
            }
        }

        debug!(
            turns = outcome.turns,
            tool_calls = outcome.tool_calls.len(),
            written = outcome.written_paths.len(),
            "ReactAgent::run: finished"
        );
        Ok(outcome)
    }
}
