//! Coder stage - one implementation step per execution

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{PipelineError, PipelineState, Stage, StageOutput};
use crate::agent::ToolAgent;
use crate::domain::CoderState;
use crate::prompts::PromptLoader;
use crate::tools::ToolContext;
use crate::tools::builtin::read_existing;

pub struct Coder {
    agent: Arc<dyn ToolAgent>,
    ctx: ToolContext,
    prompts: Arc<PromptLoader>,
}

impl Coder {
    pub fn new(agent: Arc<dyn ToolAgent>, ctx: ToolContext, prompts: Arc<PromptLoader>) -> Self {
        Self { agent, ctx, prompts }
    }

    /// Run the step under the cursor, or report done when none remain
    ///
    /// The cursor advances whether or not the agent wrote the file.
    pub async fn run(&self, state: &PipelineState) -> Result<StageOutput, PipelineError> {
        debug!(run_id = %state.run_id, "Coder::run: called");
        let mut coder_state = match &state.coder_state {
            Some(coder_state) => coder_state.clone(),
            None => {
                let task_plan = state
                    .task_plan
                    .clone()
                    .ok_or_else(|| PipelineError::invalid(Stage::Coder, "no task plan in state"))?;
                CoderState::new(task_plan)
            }
        };

        let Some(task) = coder_state.current_task().cloned() else {
            info!(steps = coder_state.task_plan.len(), "Coder finished all steps");
            return Ok(StageOutput::Done(coder_state));
        };

        let step = coder_state.current_step_idx + 1;
        let total = coder_state.task_plan.len();
        info!(step, total, filepath = %task.filepath, "Coder starting step");

        let existing = read_existing(&self.ctx, &task.filepath).await?;
        let system_prompt = self.prompts.coder_system()?;
        let user_prompt = self.prompts.coder_task(&task, &existing)?;

        let outcome = self.agent.run(&system_prompt, &user_prompt).await?;
        let target = self.ctx.validate_path(Path::new(&task.filepath))?;
        if !outcome.wrote(&target) {
            warn!(
                filepath = %task.filepath,
                tool_calls = outcome.tool_calls.len(),
                "Agent finished step without writing its target file"
            );
        }

        coder_state.advance();
        debug!(idx = coder_state.current_step_idx, "Coder::run: step complete");
        Ok(StageOutput::Coded(coder_state))
    }
}
