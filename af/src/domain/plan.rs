//! Plan - the Planner's structured description of the app to build

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::StructuredOutput;

/// A file the app needs, with the reason it exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// Path of the file to be created or modified
    pub path: String,
    /// What the file does in the application
    pub purpose: String,
}

/// Project plan produced once from the user's request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Name of the project
    pub name: String,
    /// Outline of the app to be built
    pub description: String,
    /// Technology stack, e.g. "html, css, javascript"
    pub techstack: String,
    /// Features to include
    pub features: Vec<String>,
    /// Files to create, each with a path and purpose
    pub files: Vec<File>,
}

impl StructuredOutput for Plan {
    const NAME: &'static str = "Plan";

    fn description() -> &'static str {
        "Submit the project plan: name, description, tech stack, features and the files to create."
    }

    fn schema() -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "The name of the project."
                },
                "description": {
                    "type": "string",
                    "description": "An outline description of the app to be built, e.g. 'A todo list app with user authentication'"
                },
                "techstack": {
                    "type": "string",
                    "description": "The technology stack to be used, e.g. 'python', 'javascript', 'react', 'nodejs'"
                },
                "features": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Features to be included, e.g. 'user login', 'task creation', 'task deletion'"
                },
                "files": {
                    "type": "array",
                    "description": "Files to be created for the application, each with path and purpose",
                    "items": {
                        "type": "object",
                        "properties": {
                            "path": {
                                "type": "string",
                                "description": "The path to the file to be created or modified"
                            },
                            "purpose": {
                                "type": "string",
                                "description": "The purpose of the file in the application"
                            }
                        },
                        "required": ["path", "purpose"]
                    }
                }
            },
            "required": ["name", "description", "techstack", "features", "files"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_deserializes_from_submit_input() {
        let input = serde_json::json!({
            "name": "Todo",
            "description": "A colourful todo app",
            "techstack": "html, css, javascript",
            "features": ["add task", "delete task"],
            "files": [
                {"path": "index.html", "purpose": "markup"},
                {"path": "style.css", "purpose": "styles"}
            ]
        });

        let plan: Plan = serde_json::from_value(input).unwrap();
        assert_eq!(plan.name, "Todo");
        assert_eq!(plan.features.len(), 2);
        assert_eq!(plan.files[1].path, "style.css");
    }

    #[test]
    fn test_plan_missing_field_is_rejected() {
        let input = serde_json::json!({"name": "Todo"});
        assert!(serde_json::from_value::<Plan>(input).is_err());
    }

    #[test]
    fn test_plan_tool_name() {
        assert_eq!(Plan::tool_name(), "submit_plan");
        let required = Plan::schema()["required"].as_array().unwrap().len();
        assert_eq!(required, 5);
    }
}
