//! Pipeline error types

use thiserror::Error;

use super::Stage;
use crate::agent::AgentError;
use crate::llm::LlmError;
use crate::prompts::PromptError;
use crate::tools::ToolError;

/// Errors that abort a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Planner agent failed to generate a plan")]
    PlanningFailed,

    #[error("Architect agent failed to generate a task plan")]
    ArchitectureFailed,

    #[error("Recursion limit of {limit} stage executions reached without finishing")]
    RecursionLimit { limit: u32 },

    #[error("Invalid transition after {stage} stage: {reason}")]
    InvalidTransition { stage: Stage, reason: String },

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

impl PipelineError {
    pub(crate) fn invalid(stage: Stage, reason: impl Into<String>) -> Self {
        PipelineError::InvalidTransition {
            stage,
            reason: reason.into(),
        }
    }
}
