//! Domain types for AppForge
//!
//! The three artifacts the pipeline threads between stages: the `Plan`
//! from the Planner, the `TaskPlan` from the Architect, and the coder's
//! `CoderState` cursor over it.

mod coder;
mod plan;
mod task;

pub use coder::CoderState;
pub use plan::{File, Plan};
pub use task::{ImplementationTask, TaskPlan};
