//! Embedded prompts
//!
//! These are compiled into the binary from .hbs files at build time.

use tracing::debug;

pub const PLANNER: &str = include_str!("../../prompts/planner.hbs");
pub const ARCHITECT: &str = include_str!("../../prompts/architect.hbs");
pub const CODER_SYSTEM: &str = include_str!("../../prompts/coder-system.hbs");
pub const CODER_TASK: &str = include_str!("../../prompts/coder-task.hbs");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "planner" => Some(PLANNER),
        "architect" => Some(ARCHITECT),
        "coder-system" => Some(CODER_SYSTEM),
        "coder-task" => Some(CODER_TASK),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
