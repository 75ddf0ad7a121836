//! Planner stage - user request to Plan

use std::sync::Arc;

use tracing::{debug, info};

use super::{PipelineError, PipelineState, StageOutput};
use crate::domain::Plan;
use crate::llm::{LlmClient, complete_structured};
use crate::prompts::PromptLoader;

const SYSTEM_PROMPT: &str = "You turn app requests into project plans. Answer by calling the provided tool.";

pub struct Planner {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    max_tokens: u32,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, max_tokens: u32) -> Self {
        Self {
            llm,
            prompts,
            max_tokens,
        }
    }

    /// Ask the model for a Plan; nothing back is `PlanningFailed`
    pub async fn run(&self, state: &PipelineState) -> Result<StageOutput, PipelineError> {
        debug!(run_id = %state.run_id, "Planner::run: called");
        let prompt = self.prompts.planner(&state.user_prompt)?;

        let plan = complete_structured::<Plan>(self.llm.as_ref(), SYSTEM_PROMPT, &prompt, self.max_tokens)
            .await?
            .ok_or(PipelineError::PlanningFailed)?;

        info!(name = %plan.name, files = plan.files.len(), "Planner produced plan");
        Ok(StageOutput::Planned(plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, LlmError, ToolCall};

    fn planner(llm: Arc<MockLlmClient>) -> Planner {
        Planner::new(llm, Arc::new(PromptLoader::embedded_only()), 4096)
    }

    #[tokio::test]
    async fn test_planner_returns_plan() {
        let llm = Arc::new(MockLlmClient::new(vec![CompletionResponse::tool_use(vec![ToolCall::new(
            "call_1",
            "submit_plan",
            serde_json::json!({
                "name": "Todo",
                "description": "todo app",
                "techstack": "html",
                "features": ["add"],
                "files": [{"path": "index.html", "purpose": "markup"}]
            }),
        )])]));

        let state = PipelineState::new("Build a todo app");
        let output = planner(llm.clone()).run(&state).await.unwrap();

        let StageOutput::Planned(plan) = output else {
            panic!("expected a plan");
        };
        assert_eq!(plan.name, "Todo");

        let request = &llm.requests()[0];
        assert_eq!(request.tools[0].name, "submit_plan");
        let user = request.messages[0].content.as_text().unwrap();
        assert!(user.contains("Build a todo app"));
    }

    #[tokio::test]
    async fn test_planner_nothing_returned() {
        let llm = Arc::new(MockLlmClient::new(vec![CompletionResponse::text("I cannot help with that.")]));

        let state = PipelineState::new("Build a todo app");
        let result = planner(llm).run(&state).await;

        assert!(matches!(result, Err(PipelineError::PlanningFailed)));
    }

    #[tokio::test]
    async fn test_planner_schema_mismatch_propagates() {
        let llm = Arc::new(MockLlmClient::new(vec![CompletionResponse::tool_use(vec![ToolCall::new(
            "call_1",
            "submit_plan",
            serde_json::json!({"name": "Todo"}),
        )])]));

        let state = PipelineState::new("Build a todo app");
        let result = planner(llm).run(&state).await;

        assert!(matches!(
            result,
            Err(PipelineError::Llm(LlmError::SchemaMismatch { schema: "Plan", .. }))
        ));
    }
}
