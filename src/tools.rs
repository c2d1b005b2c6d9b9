//! The tool catalog: backend relays plus Gemini planning helpers.
//!
//! Each registration is pure wiring - the envelope behavior (validation,
//! error folding, empty-result handling) lives in [`crate::registry`].

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::backend::{BackendClient, ProjectFilters, TaskFilters};
use crate::error::ToolError;
use crate::gemini::{GeminiClient, GeminiError};
use crate::prompts;
use crate::registry::{FieldKind, FieldSpec, ToolRegistry, ToolSpec};

/// Which subset of tools a server instance registers.
///
/// The deployment historically ran as separate backend-only and planner-only
/// servers; `all` serves the combined catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ToolSet {
    All,
    Backend,
    Planner,
}

impl ToolSet {
    pub fn serves_backend(self) -> bool {
        matches!(self, Self::All | Self::Backend)
    }

    pub fn serves_planner(self) -> bool {
        matches!(self, Self::All | Self::Planner)
    }
}

/// Build a registry for the selected tool set. Clients are per-concern; a
/// tool group is only registered when its client is configured.
pub fn build_registry(
    tools: ToolSet,
    backend: Option<BackendClient>,
    gemini: Option<GeminiClient>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    if tools.serves_backend() {
        if let Some(backend) = backend {
            register_backend_tools(&mut registry, backend);
        }
    }
    if tools.serves_planner() {
        if let Some(gemini) = gemini {
            register_planner_tools(&mut registry, gemini);
        }
    }
    registry
}

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

fn arg_str(args: &Map<String, Value>, name: &str) -> String {
    args.get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn arg_str_list(args: &Map<String, Value>, name: &str) -> Vec<String> {
    args.get(name)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn register_backend_tools(registry: &mut ToolRegistry, backend: BackendClient) {
    let client = backend.clone();
    registry.register(ToolSpec {
        name: "query_tasks",
        description: "Fetch tasks with optional filters",
        fields: vec![
            FieldSpec::optional(
                "assigned_to",
                FieldKind::String,
                "Person the task is assigned to",
            ),
            FieldSpec::optional("status", FieldKind::String, "Task status filter"),
            FieldSpec::optional(
                "project_id",
                FieldKind::Integer,
                "Only tasks in this project",
            ),
            FieldSpec::optional("title", FieldKind::String, "Task title filter"),
            FieldSpec::optional("due_date", FieldKind::String, "Due date (YYYY-MM-DD)"),
        ],
        success_key: "tasks",
        empty_message: Some("No matching tasks found."),
        handler: Arc::new(move |args| {
            let backend = client.clone();
            Box::pin(async move {
                let filters: TaskFilters = serde_json::from_value(Value::Object(args))
                    .map_err(|e| ToolError::validation(e.to_string()))?;
                let tasks = backend.query_tasks(&filters).await?;
                Ok(Value::Array(tasks))
            })
        }),
    });

    let client = backend.clone();
    registry.register(ToolSpec {
        name: "query_projects",
        description: "Fetch projects with optional filters",
        fields: vec![
            FieldSpec::optional("name", FieldKind::String, "Project name filter"),
            FieldSpec::optional("status", FieldKind::String, "Project status filter"),
            FieldSpec::optional("start_date", FieldKind::String, "Start date (YYYY-MM-DD)"),
            FieldSpec::optional("end_date", FieldKind::String, "End date (YYYY-MM-DD)"),
        ],
        success_key: "projects",
        empty_message: Some("No matching projects found."),
        handler: Arc::new(move |args| {
            let backend = client.clone();
            Box::pin(async move {
                let filters: ProjectFilters = serde_json::from_value(Value::Object(args))
                    .map_err(|e| ToolError::validation(e.to_string()))?;
                let projects = backend.query_projects(&filters).await?;
                Ok(Value::Array(projects))
            })
        }),
    });

    let client = backend.clone();
    registry.register(ToolSpec {
        name: "create_project",
        description: "Create a new project",
        fields: vec![
            FieldSpec::required("name", FieldKind::String, "Project name"),
            FieldSpec::required("start_date", FieldKind::String, "Start date (YYYY-MM-DD)"),
            FieldSpec::optional("description", FieldKind::String, "Project description"),
            FieldSpec::optional("end_date", FieldKind::String, "End date (YYYY-MM-DD)"),
            FieldSpec::optional("status", FieldKind::String, "Project status"),
        ],
        success_key: "project",
        empty_message: None,
        handler: Arc::new(move |args| {
            let backend = client.clone();
            Box::pin(async move {
                let project = backend.create_project(&Value::Object(args)).await?;
                Ok(project)
            })
        }),
    });

    registry.register(ToolSpec {
        name: "create_task",
        description: "Create a new task in a project",
        fields: vec![
            FieldSpec::required("title", FieldKind::String, "Task title"),
            FieldSpec::required(
                "project_id",
                FieldKind::Integer,
                "Project the task belongs to",
            ),
            FieldSpec::optional(
                "assigned_to",
                FieldKind::String,
                "Person the task is assigned to",
            ),
            FieldSpec::optional("status", FieldKind::String, "Task status"),
            FieldSpec::optional("due_date", FieldKind::String, "Due date (YYYY-MM-DD)"),
        ],
        success_key: "task",
        empty_message: None,
        handler: Arc::new(move |args| {
            let backend = backend.clone();
            Box::pin(async move {
                let task = backend.create_task(&Value::Object(args)).await?;
                Ok(task)
            })
        }),
    });
}

fn register_planner_tools(registry: &mut ToolRegistry, gemini: GeminiClient) {
    let client = gemini.clone();
    registry.register(ToolSpec {
        name: "gemini_planner",
        description: "Plan which tool to use based on a natural language question",
        fields: vec![FieldSpec::required(
            "question",
            FieldKind::String,
            "The user's natural language question",
        )],
        success_key: "plan",
        empty_message: None,
        handler: Arc::new(move |args| {
            let gemini = client.clone();
            Box::pin(async move {
                let question = arg_str(&args, "question");
                let prompt = prompts::plan_prompt(&question, &today());
                let plan = gemini.complete_json(&prompt, 0.0).await?;
                Ok(plan)
            })
        }),
    });

    let client = gemini.clone();
    registry.register(ToolSpec {
        name: "gemini_answer",
        description: "Answer a question using a tool_result",
        fields: vec![
            FieldSpec::required("question", FieldKind::String, "The user's question"),
            FieldSpec::required(
                "tool_result",
                FieldKind::String,
                "Raw tool result to summarize (JSON string)",
            ),
            FieldSpec::required(
                "previous_node",
                FieldKind::String,
                "The workflow step that produced the result",
            ),
        ],
        success_key: "answer",
        empty_message: None,
        handler: Arc::new(move |args| {
            let gemini = client.clone();
            Box::pin(async move {
                let prompt = prompts::answer_prompt(
                    &arg_str(&args, "question"),
                    &arg_str(&args, "tool_result"),
                    &arg_str(&args, "previous_node"),
                    &today(),
                );
                let answer = gemini.complete(&prompt, 0.0).await?;
                Ok(json!(answer))
            })
        }),
    });

    let client = gemini.clone();
    registry.register(ToolSpec {
        name: "gemini_clarify",
        description: "Ask clarifying questions when fields are missing",
        fields: vec![
            FieldSpec::required(
                "missing_fields",
                FieldKind::StringArray,
                "Names of the required fields the user did not provide",
            ),
            FieldSpec::required(
                "original_question",
                FieldKind::String,
                "The user's original message",
            ),
        ],
        success_key: "clarification",
        empty_message: None,
        handler: Arc::new(move |args| {
            let gemini = client.clone();
            Box::pin(async move {
                let missing = arg_str_list(&args, "missing_fields");
                let prompt = prompts::clarify_prompt(
                    &missing,
                    &arg_str(&args, "original_question"),
                    &today(),
                );
                let clarification = gemini.complete(&prompt, 0.0).await?;
                Ok(json!(clarification))
            })
        }),
    });

    registry.register(ToolSpec {
        name: "gemini_duplicate_analyzer",
        description: "Check if a new item is a duplicate of existing items",
        fields: vec![
            FieldSpec::required("new_item", FieldKind::String, "The candidate record (JSON)"),
            FieldSpec::required(
                "existing_items",
                FieldKind::String,
                "Existing records to compare against (JSON)",
            ),
            FieldSpec::required("item_type", FieldKind::String, "Either 'project' or 'task'"),
        ],
        success_key: "result",
        empty_message: None,
        handler: Arc::new(move |args| {
            let gemini = gemini.clone();
            Box::pin(async move {
                let new_item = arg_str(&args, "new_item");
                let existing_items = arg_str(&args, "existing_items");
                let item_type = arg_str(&args, "item_type");

                let prompt = prompts::duplicate_prompt(&new_item, &existing_items, &item_type);
                // Fail open on unparseable output: flag as a duplicate and let
                // the user decide, rather than blocking the creation flow.
                let mut verdict = match gemini.complete_json(&prompt, 0.0).await {
                    Ok(value) => value,
                    Err(GeminiError::InvalidJson { .. }) => json!({
                        "duplicate": true,
                        "reason": "Could not parse model output, let user decide",
                    }),
                    Err(err) => return Err(err.into()),
                };
                if let Some(object) = verdict.as_object_mut() {
                    object.insert("newItem".to_string(), json!(new_item));
                    object.insert("existingItems".to_string(), json!(existing_items));
                }
                Ok(verdict)
            })
        }),
    });
}
