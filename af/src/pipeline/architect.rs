//! Architect stage - Plan to TaskPlan

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{PipelineError, PipelineState, Stage, StageOutput};
use crate::domain::TaskPlan;
use crate::llm::{LlmClient, complete_structured};
use crate::prompts::PromptLoader;

const SYSTEM_PROMPT: &str =
    "You break project plans into ordered, file-level implementation tasks. Answer by calling the provided tool.";

pub struct Architect {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    max_tokens: u32,
}

impl Architect {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, max_tokens: u32) -> Self {
        Self {
            llm,
            prompts,
            max_tokens,
        }
    }

    /// Ask the model for a TaskPlan and attach the originating Plan to it
    pub async fn run(&self, state: &PipelineState) -> Result<StageOutput, PipelineError> {
        debug!(run_id = %state.run_id, "Architect::run: called");
        let plan = state
            .plan
            .as_ref()
            .ok_or_else(|| PipelineError::invalid(Stage::Architect, "no plan in state"))?;
        let prompt = self.prompts.architect(plan)?;

        let mut task_plan = complete_structured::<TaskPlan>(self.llm.as_ref(), SYSTEM_PROMPT, &prompt, self.max_tokens)
            .await?
            .ok_or(PipelineError::ArchitectureFailed)?;
        task_plan.plan = Some(plan.clone());

        if task_plan.is_empty() {
            warn!("Architect returned no implementation steps");
        }
        info!(steps = task_plan.len(), "Architect produced task plan");
        Ok(StageOutput::Architected(task_plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{File, Plan};
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, ToolCall};

    fn planned_state() -> PipelineState {
        let mut state = PipelineState::new("Build a todo app");
        state.plan = Some(Plan {
            name: "Todo".to_string(),
            description: "todo app".to_string(),
            techstack: "html, css, js".to_string(),
            features: vec!["add".to_string()],
            files: vec![File {
                path: "index.html".to_string(),
                purpose: "markup".to_string(),
            }],
        });
        state
    }

    fn architect(llm: Arc<MockLlmClient>) -> Architect {
        Architect::new(llm, Arc::new(PromptLoader::embedded_only()), 4096)
    }

    #[tokio::test]
    async fn test_architect_attaches_plan() {
        let llm = Arc::new(MockLlmClient::new(vec![CompletionResponse::tool_use(vec![ToolCall::new(
            "call_1",
            "submit_task_plan",
            serde_json::json!({
                "implementation_steps": [
                    {"filepath": "index.html", "task_description": "Create markup"}
                ]
            }),
        )])]));

        let state = planned_state();
        let output = architect(llm.clone()).run(&state).await.unwrap();

        let StageOutput::Architected(task_plan) = output else {
            panic!("expected a task plan");
        };
        assert_eq!(task_plan.len(), 1);
        assert_eq!(task_plan.plan, state.plan);

        let user = llm.requests()[0].messages[0].content.as_text().unwrap().to_string();
        assert!(user.contains("- index.html: markup"));
    }

    #[tokio::test]
    async fn test_architect_accepts_json_text_reply() {
        let llm = Arc::new(MockLlmClient::new(vec![CompletionResponse::text(
            "```json\n{\"implementation_steps\": []}\n```",
        )]));

        let output = architect(llm).run(&planned_state()).await.unwrap();
        assert!(matches!(output, StageOutput::Architected(tp) if tp.is_empty()));
    }

    #[tokio::test]
    async fn test_architect_nothing_returned() {
        let llm = Arc::new(MockLlmClient::new(vec![CompletionResponse::text("")]));

        let result = architect(llm).run(&planned_state()).await;
        assert!(matches!(result, Err(PipelineError::ArchitectureFailed)));
    }

    #[tokio::test]
    async fn test_architect_without_plan_is_invalid() {
        let llm = Arc::new(MockLlmClient::new(vec![]));

        let result = architect(llm.clone()).run(&PipelineState::new("todo")).await;
        assert!(matches!(result, Err(PipelineError::InvalidTransition { .. })));
        assert_eq!(llm.call_count(), 0);
    }
}
