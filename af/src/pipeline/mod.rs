//! App generation pipeline
//!
//! Three stages run strictly in sequence over a shared `PipelineState`:
//! the Planner turns the request into a `Plan`, the Architect expands it
//! into a `TaskPlan`, and the Coder works through the tasks one step per
//! execution. Each stage returns a `StageOutput` that the runner merges
//! into the state after validating the transition.

mod architect;
mod coder;
mod error;
mod planner;
mod runner;
mod state;

pub use architect::Architect;
pub use coder::Coder;
pub use error::PipelineError;
pub use planner::Planner;
pub use runner::{DEFAULT_RECURSION_LIMIT, Pipeline};
pub use state::{PipelineState, Stage, StageOutput, Status};
