//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to
//! embedded defaults, then renders them with Handlebars.

use std::path::PathBuf;

use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::embedded;
use crate::domain::{ImplementationTask, Plan};

/// Errors from loading or rendering a template
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt template not found: {0}")]
    NotFound(String),

    #[error("Failed to read prompt {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render template {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },
}

#[derive(Serialize)]
struct PlannerContext<'a> {
    user_prompt: &'a str,
}

#[derive(Serialize)]
struct ArchitectContext<'a> {
    plan: &'a Plan,
}

#[derive(Serialize)]
struct CoderTaskContext<'a> {
    task_description: &'a str,
    filepath: &'a str,
    existing_content: &'a str,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    hbs: Handlebars<'static>,
    /// Override directory holding `{name}.hbs` files
    dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that prefers templates found in `dir`
    pub fn new(dir: Option<PathBuf>) -> Self {
        debug!(?dir, "PromptLoader::new: called");
        let dir = dir.filter(|d| {
            let exists = d.is_dir();
            if !exists {
                debug!(?d, "PromptLoader::new: override directory missing, using embedded prompts");
            }
            exists
        });

        let mut hbs = Handlebars::new();
        // Prompts are plain text; HTML escaping would mangle file content
        hbs.register_escape_fn(handlebars::no_escape);

        Self { hbs, dir }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        Self::new(None)
    }

    /// Load a template by name
    ///
    /// Checks `{dir}/{name}.hbs` first, then the embedded fallback.
    fn load_template(&self, name: &str) -> Result<String, PromptError> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(dir) = &self.dir {
            let path = dir.join(format!("{}.hbs", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path).map_err(|source| PromptError::Read { path, source });
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| PromptError::NotFound(name.to_string()))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String, PromptError> {
        debug!(%name, "PromptLoader::render: called");
        let template = self.load_template(name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|source| PromptError::Render {
                name: name.to_string(),
                source: Box::new(source),
            })
    }

    pub fn planner(&self, user_prompt: &str) -> Result<String, PromptError> {
        self.render("planner", &PlannerContext { user_prompt })
    }

    pub fn architect(&self, plan: &Plan) -> Result<String, PromptError> {
        self.render("architect", &ArchitectContext { plan })
    }

    pub fn coder_system(&self) -> Result<String, PromptError> {
        self.render("coder-system", &serde_json::json!({}))
    }

    /// The per-step instruction handed to the coder agent
    pub fn coder_task(&self, task: &ImplementationTask, existing_content: &str) -> Result<String, PromptError> {
        self.render(
            "coder-task",
            &CoderTaskContext {
                task_description: &task.task_description,
                filepath: &task.filepath,
                existing_content,
            },
        )
    }
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}
