//! Prompt Template System
//!
//! Template loading chain:
//! 1. `{prompts.dir}/{name}.hbs` (user override)
//! 2. Embedded fallback compiled into the binary
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{PromptError, PromptLoader};
