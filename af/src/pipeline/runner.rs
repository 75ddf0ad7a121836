//! Pipeline runner - drives the stages as a small state machine
//!
//! Planner → Architect → Coder, with the Coder re-entered after every step
//! until it reports done. Each stage execution counts against the
//! recursion limit.

use std::sync::Arc;

use tracing::{debug, info};

use super::{Architect, Coder, PipelineError, PipelineState, Planner, Stage, StageOutput};
use crate::agent::{ReactAgent, ToolAgent};
use crate::config::Config;
use crate::llm::LlmClient;
use crate::prompts::PromptLoader;
use crate::tools::{ToolContext, ToolExecutor};

pub const DEFAULT_RECURSION_LIMIT: u32 = 100;

/// Next node in the pipeline graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Stage(Stage),
    End,
}

impl Node {
    fn after(stage: Stage, state: &PipelineState) -> Node {
        match stage {
            Stage::Planner => Node::Stage(Stage::Architect),
            Stage::Architect => Node::Stage(Stage::Coder),
            Stage::Coder if state.is_done() => Node::End,
            Stage::Coder => Node::Stage(Stage::Coder),
        }
    }
}

/// The three-stage app generation pipeline
pub struct Pipeline {
    planner: Planner,
    architect: Architect,
    coder: Coder,
    recursion_limit: u32,
}

impl Pipeline {
    pub fn new(planner: Planner, architect: Architect, coder: Coder) -> Self {
        Self {
            planner,
            architect,
            coder,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Wire the production stages from configuration
    ///
    /// The coder agent is a `ReactAgent` with the file tools, scoped to
    /// `pipeline.project-dir`.
    pub fn from_config(llm: Arc<dyn LlmClient>, config: &Config) -> Self {
        debug!("Pipeline::from_config: called");
        let prompts = Arc::new(PromptLoader::new(config.prompts.dir.clone()));
        let max_tokens = config.llm.max_tokens;
        let ctx = ToolContext::new(config.pipeline.project_dir.clone());

        let agent: Arc<dyn ToolAgent> = Arc::new(
            ReactAgent::new(llm.clone(), ToolExecutor::coder(), ctx.clone())
                .with_max_turns(config.pipeline.max_agent_turns)
                .with_max_tokens(max_tokens),
        );

        Self::new(
            Planner::new(llm.clone(), prompts.clone(), max_tokens),
            Architect::new(llm, prompts.clone(), max_tokens),
            Coder::new(agent, ctx, prompts),
        )
        .with_recursion_limit(config.pipeline.recursion_limit)
    }

    pub fn with_recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Run every stage until the coder reports done
    pub async fn run(&self, user_prompt: &str) -> Result<PipelineState, PipelineError> {
        let mut state = PipelineState::new(user_prompt);
        info!(run_id = %state.run_id, recursion_limit = self.recursion_limit, "Pipeline run started");
        self.drive(&mut state, |_| false).await?;
        info!(
            run_id = %state.run_id,
            stages = state.stage_count,
            "Pipeline run finished"
        );
        Ok(state)
    }

    /// Run only the Planner and Architect
    pub async fn plan(&self, user_prompt: &str) -> Result<PipelineState, PipelineError> {
        let mut state = PipelineState::new(user_prompt);
        info!(run_id = %state.run_id, "Planning run started");
        self.drive(&mut state, |node| node == Node::Stage(Stage::Coder)).await?;
        Ok(state)
    }

    async fn drive(&self, state: &mut PipelineState, stop_before: impl Fn(Node) -> bool) -> Result<(), PipelineError> {
        let mut node = Node::Stage(Stage::Planner);

        while let Node::Stage(stage) = node {
            if stop_before(node) {
                break;
            }
            if state.stage_count >= self.recursion_limit {
                return Err(PipelineError::RecursionLimit {
                    limit: self.recursion_limit,
                });
            }
            state.stage_count += 1;
            debug!(%stage, count = state.stage_count, "Pipeline::drive: executing stage");

            let output = self.execute(stage, state).await?;
            state.apply(output)?;
            node = Node::after(stage, state);
        }

        Ok(())
    }

    async fn execute(&self, stage: Stage, state: &PipelineState) -> Result<StageOutput, PipelineError> {
        match stage {
            Stage::Planner => self.planner.run(state).await,
            Stage::Architect => self.architect.run(state).await,
            Stage::Coder => self.coder.run(state).await,
        }
    }
}
