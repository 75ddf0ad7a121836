//! CoderState - cursor over the TaskPlan

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ImplementationTask, TaskPlan};

/// Progress of the coder loop
///
/// `current_step_idx` stays within `0..=implementation_steps.len()`; the
/// loop is done exactly when it equals the length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoderState {
    pub task_plan: TaskPlan,

    #[serde(default)]
    pub current_step_idx: usize,

    /// Content of the file being edited; carried but not read by the loop
    #[serde(default)]
    pub current_file_content: Option<String>,
}

impl CoderState {
    pub fn new(task_plan: TaskPlan) -> Self {
        debug!(steps = task_plan.len(), "CoderState::new: called");
        Self {
            task_plan,
            current_step_idx: 0,
            current_file_content: None,
        }
    }

    /// All steps have been attempted
    pub fn is_done(&self) -> bool {
        self.current_step_idx >= self.task_plan.len()
    }

    /// Task at the cursor, if any remain
    pub fn current_task(&self) -> Option<&ImplementationTask> {
        self.task_plan.implementation_steps.get(self.current_step_idx)
    }

    /// Move the cursor forward one step, never past the end
    pub fn advance(&mut self) {
        if !self.is_done() {
            self.current_step_idx += 1;
        }
        debug!(idx = self.current_step_idx, "CoderState::advance: cursor moved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(path: &str) -> ImplementationTask {
        ImplementationTask {
            filepath: path.to_string(),
            task_description: format!("Create {}", path),
        }
    }

    #[test]
    fn test_new_starts_at_zero() {
        let state = CoderState::new(TaskPlan::new(vec![task("index.html")]));
        assert_eq!(state.current_step_idx, 0);
        assert!(state.current_file_content.is_none());
        assert!(!state.is_done());
        assert_eq!(state.current_task().unwrap().filepath, "index.html");
    }

    #[test]
    fn test_advance_reaches_done() {
        let mut state = CoderState::new(TaskPlan::new(vec![task("index.html"), task("app.js")]));
        state.advance();
        assert_eq!(state.current_task().unwrap().filepath, "app.js");
        assert_eq!(state.current_step_idx, 1);
        state.advance();
        assert!(state.is_done());
        assert!(state.current_task().is_none());
    }

    #[test]
    fn test_advance_at_done_is_noop() {
        let mut state = CoderState::new(TaskPlan::new(vec![]));
        assert!(state.is_done());
        state.advance();
        assert_eq!(state.current_step_idx, 0);
    }
}
