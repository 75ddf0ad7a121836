//! Tool-using agent for the coder stage
//!
//! The coder hands each task to a `ToolAgent`. The production agent is
//! `ReactAgent`, which alternates LLM turns with tool execution until the
//! model ends its turn or the turn budget runs out.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::{LlmError, TokenUsage};

mod react;

pub use react::ReactAgent;

/// Errors that abort an agent run
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM call failed on agent turn {turn}: {source}")]
    Llm {
        turn: u32,
        #[source]
        source: LlmError,
    },
}

/// What happened during one agent run
#[derive(Debug, Clone, Default)]
pub struct AgentOutcome {
    /// LLM turns taken
    pub turns: u32,
    /// Names of every tool called, in order
    pub tool_calls: Vec<String>,
    /// Sandbox-resolved paths of successful `write_file` calls
    pub written_paths: Vec<PathBuf>,
    /// Text of the model's last reply, if any
    pub final_text: Option<String>,
    /// The run stopped because it ran out of turns
    pub hit_turn_limit: bool,
    pub usage: TokenUsage,
}

impl AgentOutcome {
    /// Whether the agent wrote `path`, given as resolved by `ToolContext::validate_path`
    pub fn wrote(&self, path: &Path) -> bool {
        self.written_paths.iter().any(|p| p == path)
    }
}

/// A tool-capable agent that carries out one instruction
#[async_trait]
pub trait ToolAgent: Send + Sync {
    async fn run(&self, system_prompt: &str, user_prompt: &str) -> Result<AgentOutcome, AgentError>;
}
