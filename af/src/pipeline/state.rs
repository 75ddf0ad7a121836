//! Pipeline state and the per-stage results merged into it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::PipelineError;
use crate::domain::{CoderState, Plan, TaskPlan};

/// The three pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Planner,
    Architect,
    Coder,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Planner => write!(f, "planner"),
            Stage::Architect => write!(f, "architect"),
            Stage::Coder => write!(f, "coder"),
        }
    }
}

/// Terminal status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Done,
}

/// What a single stage execution produced
#[derive(Debug, Clone)]
pub enum StageOutput {
    /// Planner produced the plan
    Planned(Plan),
    /// Architect produced the task plan, plan already attached
    Architected(TaskPlan),
    /// Coder finished one step and moved the cursor
    Coded(CoderState),
    /// Coder found no steps left
    Done(CoderState),
}

impl StageOutput {
    pub fn stage(&self) -> Stage {
        match self {
            StageOutput::Planned(_) => Stage::Planner,
            StageOutput::Architected(_) => Stage::Architect,
            StageOutput::Coded(_) | StageOutput::Done(_) => Stage::Coder,
        }
    }
}

/// Everything the stages share during one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub run_id: String,
    pub user_prompt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_plan: Option<TaskPlan>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coder_state: Option<CoderState>,

    #[serde(default)]
    pub status: Option<Status>,

    /// Stage executions so far, checked against the recursion limit
    #[serde(default)]
    pub stage_count: u32,

    pub started_at: DateTime<Utc>,

    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl PipelineState {
    pub fn new(user_prompt: impl Into<String>) -> Self {
        let user_prompt = user_prompt.into();
        debug!(prompt_len = user_prompt.len(), "PipelineState::new: called");
        Self {
            run_id: Uuid::now_v7().to_string(),
            user_prompt,
            plan: None,
            task_plan: None,
            coder_state: None,
            status: None,
            stage_count: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == Some(Status::Done)
    }

    /// Merge a stage's output into the state
    ///
    /// Stages must run Planner, Architect, then Coder. Anything else is an
    /// `InvalidTransition` and leaves the state untouched.
    pub fn apply(&mut self, output: StageOutput) -> Result<(), PipelineError> {
        let stage = output.stage();
        debug!(%stage, "PipelineState::apply: called");

        match output {
            StageOutput::Planned(plan) => {
                if self.plan.is_some() {
                    return Err(PipelineError::invalid(stage, "plan already set"));
                }
                self.plan = Some(plan);
            }
            StageOutput::Architected(task_plan) => {
                if self.plan.is_none() {
                    return Err(PipelineError::invalid(stage, "no plan to architect"));
                }
                if self.task_plan.is_some() {
                    return Err(PipelineError::invalid(stage, "task plan already set"));
                }
                self.task_plan = Some(task_plan);
            }
            StageOutput::Coded(coder_state) => {
                self.check_coder_state(stage, &coder_state)?;
                if self.is_done() {
                    return Err(PipelineError::invalid(stage, "run already done"));
                }
                self.coder_state = Some(coder_state);
            }
            StageOutput::Done(coder_state) => {
                self.check_coder_state(stage, &coder_state)?;
                if !coder_state.is_done() {
                    return Err(PipelineError::invalid(
                        stage,
                        format!(
                            "done reported at step {} of {}",
                            coder_state.current_step_idx,
                            coder_state.task_plan.len()
                        ),
                    ));
                }
                self.coder_state = Some(coder_state);
                if !self.is_done() {
                    self.status = Some(Status::Done);
                    self.finished_at = Some(Utc::now());
                }
            }
        }

        Ok(())
    }

    fn check_coder_state(&self, stage: Stage, coder_state: &CoderState) -> Result<(), PipelineError> {
        if self.task_plan.is_none() {
            return Err(PipelineError::invalid(stage, "no task plan to code"));
        }
        if coder_state.current_step_idx > coder_state.task_plan.len() {
            return Err(PipelineError::invalid(
                stage,
                format!(
                    "step index {} past {} steps",
                    coder_state.current_step_idx,
                    coder_state.task_plan.len()
                ),
            ));
        }
        if let Some(previous) = &self.coder_state
            && coder_state.current_step_idx < previous.current_step_idx
        {
            return Err(PipelineError::invalid(stage, "step index moved backwards"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{File, ImplementationTask};

    fn plan() -> Plan {
        Plan {
            name: "Todo".to_string(),
            description: "A todo app".to_string(),
            techstack: "html".to_string(),
            features: vec![],
            files: vec![File {
                path: "index.html".to_string(),
                purpose: "markup".to_string(),
            }],
        }
    }

    fn task_plan(n: usize) -> TaskPlan {
        TaskPlan::new(
            (0..n)
                .map(|i| ImplementationTask {
                    filepath: format!("file{}.js", i),
                    task_description: "write it".to_string(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = PipelineState::new("Build a todo app");
        assert!(state.plan.is_none());
        assert!(state.status.is_none());
        assert_eq!(state.stage_count, 0);
        assert!(Uuid::parse_str(&state.run_id).is_ok());
    }

    #[test]
    fn test_planned_sets_plan_exactly() {
        let mut state = PipelineState::new("todo");
        state.apply(StageOutput::Planned(plan())).unwrap();
        assert_eq!(state.plan, Some(plan()));
    }

    #[test]
    fn test_architect_before_planner_rejected() {
        let mut state = PipelineState::new("todo");
        let result = state.apply(StageOutput::Architected(task_plan(1)));
        assert!(matches!(
            result,
            Err(PipelineError::InvalidTransition {
                stage: Stage::Architect,
                ..
            })
        ));
        assert!(state.task_plan.is_none());
    }

    #[test]
    fn test_coder_before_architect_rejected() {
        let mut state = PipelineState::new("todo");
        state.apply(StageOutput::Planned(plan())).unwrap();
        let result = state.apply(StageOutput::Coded(CoderState::new(task_plan(1))));
        assert!(result.is_err());
    }

    #[test]
    fn test_done_requires_exhausted_steps() {
        let mut state = PipelineState::new("todo");
        state.apply(StageOutput::Planned(plan())).unwrap();
        state.apply(StageOutput::Architected(task_plan(2))).unwrap();

        let result = state.apply(StageOutput::Done(CoderState::new(task_plan(2))));
        assert!(result.is_err());
        assert!(!state.is_done());
    }

    #[test]
    fn test_done_is_idempotent() {
        let mut state = PipelineState::new("todo");
        state.apply(StageOutput::Planned(plan())).unwrap();
        state.apply(StageOutput::Architected(task_plan(0))).unwrap();

        state.apply(StageOutput::Done(CoderState::new(task_plan(0)))).unwrap();
        let finished_at = state.finished_at;
        assert!(state.is_done());

        state.apply(StageOutput::Done(CoderState::new(task_plan(0)))).unwrap();
        assert!(state.is_done());
        assert_eq!(state.finished_at, finished_at);
    }

    #[test]
    fn test_cursor_cannot_move_backwards() {
        let mut state = PipelineState::new("todo");
        state.apply(StageOutput::Planned(plan())).unwrap();
        state.apply(StageOutput::Architected(task_plan(2))).unwrap();

        let mut coder = CoderState::new(task_plan(2));
        coder.advance();
        state.apply(StageOutput::Coded(coder)).unwrap();

        let result = state.apply(StageOutput::Coded(CoderState::new(task_plan(2))));
        assert!(result.is_err());
    }

    #[test]
    fn test_status_serializes_upper_case() {
        assert_eq!(serde_json::to_value(Status::Done).unwrap(), "DONE");
    }
}
