//! AppForge - a three-stage LLM pipeline that generates an app
//!
//! A Planner turns a natural-language request into a `Plan`, an Architect
//! expands the plan into an ordered `TaskPlan`, and a Coder loop hands
//! each task to a tool-using agent that reads and writes the project files.
//!
//! ```text
//! request ──▶ Planner ──▶ Architect ──▶ Coder ⟲ ──▶ done
//!               Plan       TaskPlan     CoderState
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod domain;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod tools;

pub use agent::{AgentError, AgentOutcome, ReactAgent, ToolAgent};
pub use config::Config;
pub use domain::{CoderState, File, ImplementationTask, Plan, TaskPlan};
pub use llm::{LlmClient, LlmError, create_client};
pub use pipeline::{Pipeline, PipelineError, PipelineState, Stage, StageOutput, Status};
