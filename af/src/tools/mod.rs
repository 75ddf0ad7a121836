//! Tool system for the coder agent
//!
//! Tools give the coder file system access to the generated project. Every
//! tool call runs against a `ToolContext` scoped to the project directory,
//! and tools cannot escape that sandbox.

mod context;
mod error;
mod executor;
mod traits;

pub mod builtin;

pub use context::ToolContext;
pub use error::ToolError;
pub use executor::ToolExecutor;
pub use traits::{Tool, ToolResult};
