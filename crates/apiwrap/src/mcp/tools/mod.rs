mod freshrss;
mod ticktick;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// Re-export types needed by tool handlers
pub use super::{JsonRpcError, Tool, INTERNAL_ERROR, INVALID_PARAMS};

// MCP Protocol types for tools
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Serialize)]
pub struct ToolsCapability {}

#[derive(Debug, Serialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
pub struct ToolsList {
    pub tools: Vec<Tool>,
}

#[derive(Debug, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct CallToolResult {
    pub content: Vec<Content>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum Content {
    #[serde(rename = "text")]
    Text { text: String },
}

/// Deserialize tool arguments; a missing object counts as `{}`.
pub fn parse_arguments<T: DeserializeOwned>(
    arguments: Option<serde_json::Value>,
) -> Result<T, JsonRpcError> {
    let arguments = match arguments {
        None | Some(serde_json::Value::Null) => serde_json::json!({}),
        Some(value) => value,
    };
    serde_json::from_value(arguments)
        .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("Invalid arguments: {e}")))
}

/// Map a failed provider call to an execution error.
pub fn execution_error(e: impl std::fmt::Display) -> JsonRpcError {
    JsonRpcError::new(INTERNAL_ERROR, format!("Tool execution error: {e}"))
}

/// Wrap `data` as pretty JSON text content.
pub fn text_result<T: Serialize>(data: &T) -> Result<serde_json::Value, JsonRpcError> {
    let json_string = serde_json::to_string_pretty(data)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, format!("Serialization error: {e}")))?;

    let result = CallToolResult {
        content: vec![Content::Text { text: json_string }],
        is_error: None,
    };

    serde_json::to_value(result)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, format!("Internal error: {e}")))
}

pub fn handle_initialize() -> Result<serde_json::Value, JsonRpcError> {
    let result = InitializeResult {
        protocol_version: "2024-11-05".to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability {}),
        },
        server_info: ServerInfo {
            name: "apiwrap".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    };

    serde_json::to_value(result)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, format!("Internal error: {e}")))
}

pub fn handle_tools_list() -> Result<serde_json::Value, JsonRpcError> {
    let id_list_schema = serde_json::json!({
        "oneOf": [
            {"type": "integer"},
            {"type": "array", "items": {"type": "integer"}}
        ]
    });

    let tools = vec![
        Tool {
            name: "freshrss_feeds".to_string(),
            description: "List the feeds of a FreshRSS instance, each with the id of the category it belongs to. Requires FRESHRSS_BASE_URL, FRESHRSS_USERNAME and FRESHRSS_PASSWORD environment variables.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        Tool {
            name: "freshrss_categories".to_string(),
            description: "List the categories of a FreshRSS instance, each with the ids of its feeds.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        Tool {
            name: "freshrss_items".to_string(),
            description: "List FreshRSS items, optionally restricted to feeds or categories and filtered by read/starred state.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "feed_ids": id_list_schema.clone(),
                    "category_ids": id_list_schema,
                    "read": {
                        "type": "boolean",
                        "description": "Only read (true) or unread (false) items"
                    },
                    "starred": {
                        "type": "boolean",
                        "description": "Only starred (true) or unstarred (false) items"
                    },
                    "id_only": {
                        "type": "boolean",
                        "description": "Return item ids only (default: false)"
                    }
                },
                "required": []
            }),
        },
        Tool {
            name: "ticktick_tasks".to_string(),
            description: "List the tasks of a TickTick project, or the direct subtasks of one task when parent_id is given. Requires TICKTICK_ACCESS_TOKEN.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "project_id": {"type": "string"},
                    "parent_id": {
                        "type": "string",
                        "description": "Only return children of this task"
                    }
                },
                "required": ["project_id"]
            }),
        },
        Tool {
            name: "ticktick_update_task".to_string(),
            description: "Update a TickTick task. priority and status accept symbolic names or raw wire values.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "project_id": {"type": "string"},
                    "task_id": {"type": "string"},
                    "title": {"type": "string"},
                    "content": {"type": "string"},
                    "due_date": {"type": "string"},
                    "priority": {
                        "type": "string",
                        "description": "none, low, medium or high"
                    },
                    "status": {
                        "type": "string",
                        "description": "wont_do, normal or completed"
                    }
                },
                "required": ["project_id", "task_id"]
            }),
        },
        Tool {
            name: "ticktick_wont_do".to_string(),
            description: "Mark a TickTick task as \"won't do\". Open subtasks are marked first; completed or abandoned subtasks are left alone.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "project_id": {"type": "string"},
                    "task_id": {"type": "string"}
                },
                "required": ["project_id", "task_id"]
            }),
        },
        Tool {
            name: "ticktick_checklist".to_string(),
            description: "Read or change the checklist of a TickTick task. 'add' appends items with the given titles, 'complete' completes the given item ids (all items when omitted), 'delete' removes the given item id (all items when omitted).".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "project_id": {"type": "string"},
                    "task_id": {"type": "string"},
                    "action": {
                        "type": "string",
                        "enum": ["list", "add", "complete", "delete"]
                    },
                    "titles": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Titles of new items (add)"
                    },
                    "item_ids": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Items to complete (complete)"
                    },
                    "item_id": {
                        "type": "string",
                        "description": "Item to delete (delete)"
                    }
                },
                "required": ["project_id", "task_id", "action"]
            }),
        },
    ];

    let result = ToolsList { tools };

    serde_json::to_value(result)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, format!("Internal error: {e}")))
}

pub async fn handle_tools_call(
    params: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    let params: CallToolParams = serde_json::from_value(params.unwrap_or(serde_json::Value::Null))
        .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("Invalid params: {e}")))?;

    match params.name.as_str() {
        "freshrss_feeds" => freshrss::handle_feeds(global).await,
        "freshrss_categories" => freshrss::handle_categories(global).await,
        "freshrss_items" => freshrss::handle_items(params.arguments, global).await,
        "ticktick_tasks" => ticktick::handle_tasks(params.arguments, global).await,
        "ticktick_update_task" => ticktick::handle_update_task(params.arguments, global).await,
        "ticktick_wont_do" => ticktick::handle_wont_do(params.arguments, global).await,
        "ticktick_checklist" => ticktick::handle_checklist(params.arguments, global).await,
        _ => Err(JsonRpcError::new(
            INVALID_PARAMS,
            format!("Unknown tool: {}", params.name),
        )),
    }
}
