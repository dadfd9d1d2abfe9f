use std::collections::HashSet;

use apiwrap_core::ticktick::{ChecklistIntent, TaskUpdate};
use serde::Deserialize;

use super::{execution_error, parse_arguments, text_result, JsonRpcError, INVALID_PARAMS};
use crate::prelude::eprintln;
use crate::ticktick::TickTick;

fn client() -> Result<TickTick, JsonRpcError> {
    TickTick::from_env().map_err(execution_error)
}

pub async fn handle_tasks(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct TasksArgs {
        project_id: String,
        parent_id: Option<String>,
    }

    let args: TasksArgs = parse_arguments(arguments)?;

    if global.verbose {
        eprintln!(
            "Calling ticktick_tasks: project_id={}, parent_id={:?}",
            args.project_id, args.parent_id
        );
    }

    let client = client()?;
    let tasks = match &args.parent_id {
        Some(parent_id) => client.get_child_tasks(&args.project_id, parent_id).await,
        None => client.get_tasks(&args.project_id).await,
    }
    .map_err(execution_error)?;

    text_result(&tasks)
}

pub async fn handle_update_task(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct UpdateArgs {
        project_id: String,
        task_id: String,
        title: Option<String>,
        content: Option<String>,
        due_date: Option<String>,
        priority: Option<String>,
        status: Option<String>,
    }

    let args: UpdateArgs = parse_arguments(arguments)?;

    if global.verbose {
        eprintln!(
            "Calling ticktick_update_task: project_id={}, task_id={}, priority={:?}, status={:?}",
            args.project_id, args.task_id, args.priority, args.status
        );
    }

    let update = TaskUpdate {
        title: args.title,
        content: args.content,
        due_date: args.due_date,
        priority: args.priority,
        status: args.status,
        ..TaskUpdate::new(args.project_id, args.task_id)
    };
    let task = client()?
        .update_task(&update)
        .await
        .map_err(execution_error)?;

    text_result(&task)
}

pub async fn handle_wont_do(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct WontDoArgs {
        project_id: String,
        task_id: String,
    }

    let args: WontDoArgs = parse_arguments(arguments)?;

    if global.verbose {
        eprintln!(
            "Calling ticktick_wont_do: project_id={}, task_id={}",
            args.project_id, args.task_id
        );
    }

    let task = client()?
        .wont_do_task(&args.project_id, &args.task_id)
        .await
        .map_err(execution_error)?;

    text_result(&task)
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum ChecklistAction {
    List,
    Add,
    Complete,
    Delete,
}

pub async fn handle_checklist(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct ChecklistArgs {
        project_id: String,
        task_id: String,
        action: ChecklistAction,
        #[serde(default)]
        titles: Vec<String>,
        item_ids: Option<Vec<String>>,
        item_id: Option<String>,
    }

    let args: ChecklistArgs = parse_arguments(arguments)?;

    if global.verbose {
        eprintln!(
            "Calling ticktick_checklist: project_id={}, task_id={}, action={:?}",
            args.project_id, args.task_id, args.action
        );
    }

    let intent = match args.action {
        ChecklistAction::List => {
            let items = client()?
                .get_checklist_items(&args.project_id, &args.task_id)
                .await
                .map_err(execution_error)?;
            return text_result(&items);
        }
        ChecklistAction::Add if args.titles.is_empty() => {
            return Err(JsonRpcError::new(
                INVALID_PARAMS,
                "'titles' is required for action 'add'",
            ));
        }
        ChecklistAction::Add => ChecklistIntent::Add(args.titles),
        ChecklistAction::Complete => ChecklistIntent::Complete(
            args.item_ids
                .map(|ids| ids.into_iter().collect::<HashSet<_>>()),
        ),
        ChecklistAction::Delete => ChecklistIntent::Delete(args.item_id),
    };

    let task = client()?
        .apply_checklist(&args.project_id, &args.task_id, &intent)
        .await
        .map_err(execution_error)?;

    text_result(&task.items)
}
