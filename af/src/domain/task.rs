//! TaskPlan - the Architect's ordered list of per-file tasks

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Plan;
use crate::llm::StructuredOutput;

/// One unit of work: a file and what to do to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationTask {
    /// Path to the file to be modified
    pub filepath: String,
    /// Detailed description of the change to make
    pub task_description: String,
}

/// Ordered implementation steps for a plan
///
/// Attributes the model adds beyond `implementation_steps` are kept in
/// `extra` and written back out flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPlan {
    pub implementation_steps: Vec<ImplementationTask>,

    /// Originating plan, attached after the Architect returns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl TaskPlan {
    pub fn new(implementation_steps: Vec<ImplementationTask>) -> Self {
        Self {
            implementation_steps,
            plan: None,
            extra: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.implementation_steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.implementation_steps.is_empty()
    }
}

impl StructuredOutput for TaskPlan {
    const NAME: &'static str = "TaskPlan";

    fn description() -> &'static str {
        "Submit the ordered implementation steps, one per file change."
    }

    fn schema() -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "implementation_steps": {
                    "type": "array",
                    "description": "A list of steps to be taken to implement the plan",
                    "items": {
                        "type": "object",
                        "properties": {
                            "filepath": {
                                "type": "string",
                                "description": "The path to the file to be modified"
                            },
                            "task_description": {
                                "type": "string",
                                "description": "A detailed description of the task to be performed on the file"
                            }
                        },
                        "required": ["filepath", "task_description"]
                    }
                }
            },
            "required": ["implementation_steps"]
        })
    }
}
