//! Integration tests for the AppForge pipeline
//!
//! These run the real stages, agent and file tools against a scripted LLM
//! and a temporary project directory.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use appforge::config::Config;
use appforge::llm::{
    CompletionRequest, CompletionResponse, ContentBlock, LlmClient, LlmError, MessageContent, ToolCall, ToolChoice,
};
use appforge::{Pipeline, PipelineError};

// =============================================================================
// Scripted LLM
// =============================================================================

/// Answers each stage the way a well-behaved model would
///
/// Structured calls get the canned plan or task plan. Coder turns write the
/// file named in the instruction, then end the turn once the tool result
/// comes back.
struct ScriptedLlm {
    files: Vec<&'static str>,
    return_plan: bool,
    calls: AtomicUsize,
    architect_calls: AtomicUsize,
}

impl ScriptedLlm {
    fn new(files: Vec<&'static str>) -> Self {
        Self {
            files,
            return_plan: true,
            calls: AtomicUsize::new(0),
            architect_calls: AtomicUsize::new(0),
        }
    }

    fn without_plan() -> Self {
        Self {
            return_plan: false,
            ..Self::new(vec![])
        }
    }

    fn plan(&self) -> CompletionResponse {
        let files: Vec<_> = self
            .files
            .iter()
            .map(|f| json!({"path": f, "purpose": format!("{} for the todo app", f)}))
            .collect();
        CompletionResponse::tool_use(vec![ToolCall::new(
            "plan",
            "submit_plan",
            json!({
                "name": "Colourful Todo",
                "description": "A colourful modern todo app",
                "techstack": "html, css, javascript",
                "features": ["add task", "complete task", "delete task"],
                "files": files
            }),
        )])
    }

    fn task_plan(&self) -> CompletionResponse {
        let steps: Vec<_> = self
            .files
            .iter()
            .map(|f| json!({"filepath": f, "task_description": format!("Implement {}", f)}))
            .collect();
        CompletionResponse::tool_use(vec![ToolCall::new(
            "tasks",
            "submit_task_plan",
            json!({"implementation_steps": steps}),
        )])
    }

    fn coder_turn(&self, request: &CompletionRequest) -> CompletionResponse {
        let last = request.messages.last().map(|m| &m.content);
        match last {
            Some(MessageContent::Text(instruction)) => {
                let path = instruction
                    .lines()
                    .find_map(|l| l.strip_prefix("File: "))
                    .unwrap_or("unknown.txt");
                CompletionResponse::tool_use(vec![ToolCall::new(
                    format!("write-{}", path),
                    "write_file",
                    json!({"path": path, "content": format!("/* {} */\n", path)}),
                )])
            }
            Some(MessageContent::Blocks(blocks))
                if blocks.iter().any(|b| matches!(b, ContentBlock::ToolResult { .. })) =>
            {
                CompletionResponse::text("Saved.")
            }
            _ => CompletionResponse::text(""),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &request.tool_choice {
            ToolChoice::Tool(name) if name == "submit_plan" => {
                if self.return_plan {
                    Ok(self.plan())
                } else {
                    Ok(CompletionResponse::text("Sorry, I can't plan that."))
                }
            }
            ToolChoice::Tool(name) if name == "submit_task_plan" => {
                self.architect_calls.fetch_add(1, Ordering::SeqCst);
                Ok(self.task_plan())
            }
            ToolChoice::Tool(name) => Err(LlmError::InvalidResponse(format!("unexpected tool {}", name))),
            ToolChoice::Auto => Ok(self.coder_turn(&request)),
        }
    }
}

fn config_for(project_dir: &Path) -> Config {
    let mut config = Config::default();
    config.pipeline.project_dir = project_dir.to_path_buf();
    config
}

// =============================================================================
// Pipeline Tests
// =============================================================================

#[tokio::test]
async fn test_todo_app_generates_three_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let project_dir = temp_dir.path().join("generated_project");
    let llm = Arc::new(ScriptedLlm::new(vec!["index.html", "style.css", "app.js"]));

    let pipeline = Pipeline::from_config(llm.clone(), &config_for(&project_dir));
    let state = pipeline
        .run("Build a colourful modern todo app in html css and js")
        .await
        .expect("Pipeline should finish");

    assert!(state.is_done());
    let coder_state = state.coder_state.as_ref().expect("coder state");
    assert_eq!(coder_state.current_step_idx, 3);
    assert_eq!(coder_state.task_plan.implementation_steps.len(), 3);
    assert_eq!(state.task_plan.as_ref().and_then(|t| t.plan.as_ref()), state.plan.as_ref());

    for file in ["index.html", "style.css", "app.js"] {
        let content = std::fs::read_to_string(project_dir.join(file)).expect("generated file");
        assert_eq!(content, format!("/* {} */\n", file));
    }

    // planner + architect + (write, finish) per step
    assert_eq!(llm.calls.load(Ordering::SeqCst), 2 + 3 * 2);
}

#[tokio::test]
async fn test_planner_failure_never_reaches_architect() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let llm = Arc::new(ScriptedLlm::without_plan());

    let pipeline = Pipeline::from_config(llm.clone(), &config_for(temp_dir.path()));
    let result = pipeline.run("Build something").await;

    assert!(matches!(result, Err(PipelineError::PlanningFailed)));
    assert_eq!(llm.architect_calls.load(Ordering::SeqCst), 0);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_task_plan_writes_nothing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let project_dir = temp_dir.path().join("generated_project");
    let llm = Arc::new(ScriptedLlm::new(vec![]));

    let pipeline = Pipeline::from_config(llm.clone(), &config_for(&project_dir));
    let state = pipeline.run("Build nothing").await.expect("Pipeline should finish");

    assert!(state.is_done());
    assert_eq!(state.coder_state.expect("coder state").current_step_idx, 0);
    assert!(!project_dir.exists());
    assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_recursion_limit_from_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let llm = Arc::new(ScriptedLlm::new(vec!["index.html", "style.css", "app.js"]));

    let mut config = config_for(temp_dir.path());
    config.pipeline.recursion_limit = 5;

    let result = Pipeline::from_config(llm, &config).run("todo").await;
    assert!(matches!(result, Err(PipelineError::RecursionLimit { limit: 5 })));
}

#[tokio::test]
async fn test_plan_only_does_not_touch_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let project_dir = temp_dir.path().join("generated_project");
    let llm = Arc::new(ScriptedLlm::new(vec!["index.html"]));

    let state = Pipeline::from_config(llm, &config_for(&project_dir))
        .plan("todo")
        .await
        .expect("Planning should finish");

    let task_plan = state.task_plan.expect("task plan");
    assert_eq!(task_plan.implementation_steps[0].filepath, "index.html");
    assert!(state.coder_state.is_none());
    assert!(!project_dir.exists());
}
