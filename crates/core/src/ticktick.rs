//! Transformation functions for the TickTick Open API
//!
//! TickTick's write API replaces a task's whole checklist on every update and
//! has no notion of cascading a status to subtasks. This module computes the
//! next full checklist for a caller intent and plans which subtasks a
//! "won't do" transition has to touch. The shell performs the requests.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ErrorContext, Provider};
use crate::mapping::{resolve, symbol_for, EnumTable, WireValue};

pub const API_ROOT: &str = "https://api.ticktick.com/open/v1";
pub const AUTHORIZE_URL: &str = "https://ticktick.com/oauth/authorize";
pub const TOKEN_URL: &str = "https://ticktick.com/oauth/token";

// =============================================================================
// Enumerations
// =============================================================================

pub const TASK_STATUS: EnumTable = &[("wont_do", -1), ("normal", 0), ("completed", 2)];
pub const TASK_PRIORITY: EnumTable = &[("none", 0), ("low", 1), ("medium", 3), ("high", 5)];
pub const CHECKLIST_ITEM_STATUS: EnumTable = &[("normal", 0), ("completed", 1)];

/// Wire status of a task that is neither completed nor abandoned.
pub const TASK_STATUS_NORMAL: i64 = 0;
/// Wire status of a completed checklist item.
pub const CHECKLIST_ITEM_COMPLETED: i64 = 1;

pub fn resolve_priority(symbol: &str) -> WireValue {
    resolve(TASK_PRIORITY, symbol)
}

pub fn resolve_task_status(symbol: &str) -> WireValue {
    resolve(TASK_STATUS, symbol)
}

pub fn resolve_checklist_status(symbol: &str) -> WireValue {
    resolve(CHECKLIST_ITEM_STATUS, symbol)
}

/// Symbolic name of a wire priority, falling back to the raw number.
pub fn priority_label(priority: Option<i64>) -> String {
    let wire = priority.unwrap_or(0);
    symbol_for(TASK_PRIORITY, wire)
        .map(str::to_string)
        .unwrap_or_else(|| wire.to_string())
}

/// Symbolic name of a wire task status, falling back to the raw number.
pub fn status_label(status: Option<i64>) -> String {
    let wire = status.unwrap_or(TASK_STATUS_NORMAL);
    symbol_for(TASK_STATUS, wire)
        .map(str::to_string)
        .unwrap_or_else(|| wire.to_string())
}

/// Kind of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    Task,
    Note,
}

impl ProjectKind {
    pub fn as_wire(self) -> &'static str {
        match self {
            ProjectKind::Task => "TASK",
            ProjectKind::Note => "NOTE",
        }
    }
}

impl FromStr for ProjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "task" => Ok(ProjectKind::Task),
            "note" => Ok(ProjectKind::Note),
            other => Err(format!("Unknown project kind '{other}' (expected task or note)")),
        }
    }
}

/// How a project is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    List,
    Kanban,
    Timeline,
}

impl ViewMode {
    pub fn as_wire(self) -> &'static str {
        match self {
            ViewMode::List => "LIST",
            ViewMode::Kanban => "KANBAN",
            ViewMode::Timeline => "TIMELINE",
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "list" => Ok(ViewMode::List),
            "kanban" => Ok(ViewMode::Kanban),
            "timeline" => Ok(ViewMode::Timeline),
            other => Err(format!(
                "Unknown view mode '{other}' (expected list, kanban or timeline)"
            )),
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

// =============================================================================
// API Types
// =============================================================================

/// Project (list) record
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Response of `GET /project/{id}/data`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProjectData {
    #[serde(default)]
    pub project: Option<Project>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Task record. Unknown fields survive a read-modify-write round trip.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Checklist (subtask) item. `id` is assigned by TickTick on first save.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChecklistItem {
    /// Item that does not exist yet on the server.
    pub fn stub(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == Some(CHECKLIST_ITEM_COMPLETED)
    }
}

// =============================================================================
// Payload Builders
// =============================================================================

/// Fields for a new project
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub color: Option<String>,
    pub kind: ProjectKind,
    pub view_mode: ViewMode,
}

/// Fields to change on an existing project. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub kind: Option<ProjectKind>,
    pub view_mode: Option<ViewMode>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none() && self.kind.is_none() && self.view_mode.is_none()
    }
}

pub fn build_create_project_payload(project: &NewProject) -> serde_json::Value {
    let mut payload = serde_json::Map::new();
    payload.insert("name".into(), project.name.clone().into());
    payload.insert("kind".into(), project.kind.as_wire().into());
    payload.insert("viewMode".into(), project.view_mode.as_wire().into());
    if let Some(color) = &project.color {
        payload.insert("color".into(), color.clone().into());
    }
    serde_json::Value::Object(payload)
}

pub fn build_update_project_payload(update: &ProjectUpdate) -> serde_json::Value {
    let mut payload = serde_json::Map::new();
    if let Some(name) = &update.name {
        payload.insert("name".into(), name.clone().into());
    }
    if let Some(color) = &update.color {
        payload.insert("color".into(), color.clone().into());
    }
    if let Some(kind) = update.kind {
        payload.insert("kind".into(), kind.as_wire().into());
    }
    if let Some(view_mode) = update.view_mode {
        payload.insert("viewMode".into(), view_mode.as_wire().into());
    }
    serde_json::Value::Object(payload)
}

/// Fields for a new task. `priority` is a symbol (`none`, `low`, ...) or a raw wire value.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub priority: String,
    pub project_id: Option<String>,
    pub content: Option<String>,
    pub desc: Option<String>,
    pub is_all_day: bool,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
    pub time_zone: Option<String>,
    pub reminders: Vec<String>,
    pub sort_order: Option<i64>,
    pub repeat_flag: Option<String>,
    pub parent_id: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            priority: "none".to_string(),
            project_id: None,
            content: None,
            desc: None,
            is_all_day: false,
            start_date: None,
            due_date: None,
            time_zone: None,
            reminders: Vec::new(),
            sort_order: None,
            repeat_flag: None,
            parent_id: None,
        }
    }
}

/// Fields to change on an existing task. `None` leaves a field untouched.
///
/// `status` and `priority` are symbols or raw wire values. `items`, when set,
/// replaces the whole checklist, so `Some(vec![])` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub project_id: String,
    pub task_id: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub desc: Option<String>,
    pub is_all_day: Option<bool>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
    pub time_zone: Option<String>,
    pub status: Option<String>,
    pub reminders: Option<Vec<String>>,
    pub repeat_flag: Option<String>,
    pub sort_order: Option<i64>,
    pub priority: Option<String>,
    pub items: Option<Vec<ChecklistItem>>,
}

impl TaskUpdate {
    pub fn new(project_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            task_id: task_id.into(),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn with_items(mut self, items: Vec<ChecklistItem>) -> Self {
        self.items = Some(items);
        self
    }
}

fn insert_opt(payload: &mut serde_json::Map<String, serde_json::Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        payload.insert(key.to_string(), value.clone().into());
    }
}

fn wire_json(value: WireValue) -> serde_json::Value {
    match value {
        WireValue::Int(i) => i.into(),
        WireValue::Text(s) => s.into(),
    }
}

pub fn build_create_task_payload(task: &NewTask) -> serde_json::Value {
    let mut payload = serde_json::Map::new();
    payload.insert("title".into(), task.title.clone().into());
    payload.insert("priority".into(), wire_json(resolve_priority(&task.priority)));
    insert_opt(&mut payload, "projectId", &task.project_id);
    insert_opt(&mut payload, "content", &task.content);
    insert_opt(&mut payload, "desc", &task.desc);
    if task.is_all_day {
        payload.insert("isAllDay".into(), true.into());
    }
    insert_opt(&mut payload, "startDate", &task.start_date);
    insert_opt(&mut payload, "dueDate", &task.due_date);
    insert_opt(&mut payload, "timeZone", &task.time_zone);
    if !task.reminders.is_empty() {
        payload.insert("reminders".into(), task.reminders.clone().into());
    }
    insert_opt(&mut payload, "repeatFlag", &task.repeat_flag);
    if let Some(sort_order) = task.sort_order {
        payload.insert("sortOrder".into(), sort_order.into());
    }
    insert_opt(&mut payload, "parentId", &task.parent_id);
    serde_json::Value::Object(payload)
}

/// Partial update body. A checklist that cannot be serialized fails the
/// update instead of being sent as an empty list.
pub fn build_update_task_payload(update: &TaskUpdate) -> Result<serde_json::Value, ApiError> {
    let mut payload = serde_json::Map::new();
    payload.insert("id".into(), update.task_id.clone().into());
    payload.insert("projectId".into(), update.project_id.clone().into());
    insert_opt(&mut payload, "title", &update.title);
    insert_opt(&mut payload, "content", &update.content);
    insert_opt(&mut payload, "desc", &update.desc);
    if let Some(is_all_day) = update.is_all_day {
        payload.insert("isAllDay".into(), is_all_day.into());
    }
    insert_opt(&mut payload, "startDate", &update.start_date);
    insert_opt(&mut payload, "dueDate", &update.due_date);
    insert_opt(&mut payload, "timeZone", &update.time_zone);
    if let Some(status) = &update.status {
        payload.insert("status".into(), wire_json(resolve_task_status(status)));
    }
    if let Some(reminders) = &update.reminders {
        payload.insert("reminders".into(), reminders.clone().into());
    }
    insert_opt(&mut payload, "repeatFlag", &update.repeat_flag);
    if let Some(sort_order) = update.sort_order {
        payload.insert("sortOrder".into(), sort_order.into());
    }
    if let Some(priority) = &update.priority {
        payload.insert("priority".into(), wire_json(resolve_priority(priority)));
    }
    if let Some(items) = &update.items {
        let items = serde_json::to_value(items).map_err(|e| {
            ErrorContext::new(Provider::TickTick).decode("encode checklist items", e)
        })?;
        payload.insert("items".into(), items);
    }
    Ok(serde_json::Value::Object(payload))
}

// =============================================================================
// Hierarchy
// =============================================================================

/// Direct children of `parent_id` among the tasks of one project.
pub fn select_child_tasks(tasks: &[Task], parent_id: &str) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| task.parent_id.as_deref() == Some(parent_id))
        .cloned()
        .collect()
}

/// Ids of the children a "won't do" transition of `parent_id` has to update first.
///
/// Only children still in the normal status are touched; completed or already
/// abandoned children keep their status. Children without an id are skipped.
pub fn plan_wont_do_cascade(tasks: &[Task], parent_id: &str) -> Vec<String> {
    select_child_tasks(tasks, parent_id)
        .into_iter()
        .filter(|child| child.status == Some(TASK_STATUS_NORMAL))
        .filter_map(|child| child.id)
        .collect()
}

// =============================================================================
// Checklist Reconciliation
// =============================================================================

/// What the caller wants to do to a task's checklist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecklistIntent {
    /// Append new items with these titles.
    Add(Vec<String>),
    /// Complete the listed items, or all items when `None`.
    Complete(Option<HashSet<String>>),
    /// Delete the item with this id, or all items when `None`.
    Delete(Option<String>),
}

impl ChecklistIntent {
    /// Operation name used when a step of the sequence fails
    pub fn describe(&self) -> &'static str {
        match self {
            ChecklistIntent::Add(_) => "create checklist item",
            ChecklistIntent::Complete(_) => "complete checklist items",
            ChecklistIntent::Delete(_) => "delete checklist item",
        }
    }
}

/// Compute the full checklist to submit for `intent`, given the current one.
///
/// TickTick only accepts whole-checklist replacements, so the result is
/// always the complete next state, never a diff.
pub fn reconcile_checklist(current: Vec<ChecklistItem>, intent: &ChecklistIntent) -> Vec<ChecklistItem> {
    match intent {
        ChecklistIntent::Add(titles) => current
            .into_iter()
            .chain(titles.iter().map(ChecklistItem::stub))
            .collect(),
        ChecklistIntent::Complete(targets) => current
            .into_iter()
            .map(|mut item| {
                let selected = match targets {
                    None => true,
                    Some(ids) => item.id.as_ref().is_some_and(|id| ids.contains(id)),
                };
                if selected {
                    item.status = Some(CHECKLIST_ITEM_COMPLETED);
                }
                item
            })
            .collect(),
        ChecklistIntent::Delete(None) => Vec::new(),
        ChecklistIntent::Delete(Some(target)) => current
            .into_iter()
            .filter(|item| item.id.as_deref() != Some(target.as_str()))
            .collect(),
    }
}

// =============================================================================
// OAuth
// =============================================================================

/// Scope string TickTick expects: `tasks:read tasks:write`.
pub fn scope_string(scopes: &[String]) -> String {
    scopes
        .iter()
        .map(|scope| format!("tasks:{scope}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// URL the user opens to authorize the application.
pub fn authorize_url(client_id: &str, redirect_uri: &str, scopes: &[String]) -> Result<String, ApiError> {
    let scope = scope_string(scopes);
    url::Url::parse_with_params(
        AUTHORIZE_URL,
        &[
            ("response_type", "code"),
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
        ],
    )
    .map(|url| url.to_string())
    .map_err(|e| ErrorContext::new(Provider::TickTick).precondition(format!("Invalid authorize URL: {e}")))
}

/// Form fields of the authorization-code exchange.
pub fn token_request_form(
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
    scopes: &[String],
) -> Vec<(String, String)> {
    vec![
        ("client_id".to_string(), client_id.to_string()),
        ("client_secret".to_string(), client_secret.to_string()),
        ("code".to_string(), code.to_string()),
        ("grant_type".to_string(), "authorization_code".to_string()),
        ("scope".to_string(), scope_string(scopes)),
        ("redirect_uri".to_string(), redirect_uri.to_string()),
    ]
}

/// Pull the access token out of a token response.
pub fn extract_access_token(response: &serde_json::Value) -> Result<String, ApiError> {
    response
        .get("access_token")
        .and_then(|token| token.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ErrorContext::new(Provider::TickTick)
                .decode("obtain access token", format!("no access_token in {response}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, status: i64) -> ChecklistItem {
        ChecklistItem {
            id: Some(id.to_string()),
            title: format!("item {id}"),
            status: Some(status),
            extra: Default::default(),
        }
    }

    fn task(id: &str, parent: Option<&str>, status: i64) -> Task {
        Task {
            id: Some(id.to_string()),
            project_id: Some("p1".to_string()),
            parent_id: parent.map(str::to_string),
            title: format!("task {id}"),
            status: Some(status),
            ..Default::default()
        }
    }

    fn ids(set: &[&str]) -> HashSet<String> {
        set.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_priority() {
        assert_eq!(resolve_priority("high"), WireValue::Int(5));
        assert_eq!(resolve_priority("medium"), WireValue::Int(3));
        assert_eq!(resolve_priority("none"), WireValue::Int(0));
        assert_eq!(
            resolve_priority("unknown-symbol"),
            WireValue::Text("unknown-symbol".to_string())
        );
    }

    #[test]
    fn test_resolve_status_tables() {
        assert_eq!(resolve_task_status("wont_do"), WireValue::Int(-1));
        assert_eq!(resolve_task_status("completed"), WireValue::Int(2));
        assert_eq!(resolve_checklist_status("completed"), WireValue::Int(1));
        assert_eq!(resolve_task_status("2"), WireValue::Int(2));
    }

    #[test]
    fn test_labels() {
        assert_eq!(priority_label(Some(5)), "high");
        assert_eq!(priority_label(None), "none");
        assert_eq!(priority_label(Some(4)), "4");
        assert_eq!(status_label(Some(-1)), "wont_do");
        assert_eq!(status_label(None), "normal");
    }

    #[test]
    fn test_reconcile_add_appends_stubs() {
        let existing = vec![item("a", 0), item("b", 1)];

        let next = reconcile_checklist(
            existing.clone(),
            &ChecklistIntent::Add(vec!["t1".to_string(), "t2".to_string()]),
        );

        assert_eq!(next.len(), 4);
        assert_eq!(&next[..2], &existing[..]);
        assert_eq!(next[2], ChecklistItem::stub("t1"));
        assert_eq!(next[3], ChecklistItem::stub("t2"));
        assert_eq!(
            serde_json::to_value(&next[2]).unwrap(),
            serde_json::json!({"title": "t1"})
        );
    }

    #[test]
    fn test_reconcile_complete_all_is_idempotent() {
        let existing = vec![item("a", 0), item("b", 1), item("c", 0)];
        let intent = ChecklistIntent::Complete(None);

        let once = reconcile_checklist(existing, &intent);
        let twice = reconcile_checklist(once.clone(), &intent);

        assert!(once.iter().all(ChecklistItem::is_completed));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_reconcile_complete_by_ids_only_touches_targets() {
        let existing = vec![item("1", 0), item("2", 0)];

        let next = reconcile_checklist(existing, &ChecklistIntent::Complete(Some(ids(&["2"]))));

        assert_eq!(next[0].status, Some(0));
        assert_eq!(next[1].status, Some(1));
    }

    #[test]
    fn test_reconcile_complete_ignores_items_without_id() {
        let existing = vec![ChecklistItem::stub("new"), item("x", 0)];

        let next = reconcile_checklist(existing, &ChecklistIntent::Complete(Some(ids(&["x"]))));

        assert_eq!(next[0].status, None);
        assert_eq!(next[1].status, Some(1));
    }

    #[test]
    fn test_reconcile_delete_all() {
        let next = reconcile_checklist(vec![item("1", 0)], &ChecklistIntent::Delete(None));
        assert!(next.is_empty());
    }

    #[test]
    fn test_reconcile_delete_by_id_excludes_only_target() {
        // The target must disappear exactly once; it is never re-appended.
        let existing = vec![item("1", 0), item("2", 1), item("3", 0)];

        let next = reconcile_checklist(existing, &ChecklistIntent::Delete(Some("2".to_string())));

        let remaining: Vec<_> = next.iter().filter_map(|i| i.id.as_deref()).collect();
        assert_eq!(remaining, vec!["1", "3"]);
    }

    #[test]
    fn test_reconcile_delete_unknown_id_keeps_list() {
        let existing = vec![item("1", 0)];
        let next = reconcile_checklist(existing.clone(), &ChecklistIntent::Delete(Some("9".to_string())));
        assert_eq!(next, existing);
    }

    #[test]
    fn test_plan_wont_do_cascade_skips_finished_children() {
        let tasks = vec![
            task("P", None, 0),
            task("A", Some("P"), 0),
            task("B", Some("P"), 2),
            task("C", Some("other"), 0),
        ];

        assert_eq!(plan_wont_do_cascade(&tasks, "P"), vec!["A".to_string()]);
    }

    #[test]
    fn test_plan_wont_do_cascade_skips_children_without_id() {
        let mut orphan = task("X", Some("P"), 0);
        orphan.id = None;

        assert!(plan_wont_do_cascade(&[orphan], "P").is_empty());
    }

    #[test]
    fn test_select_child_tasks() {
        let tasks = vec![task("A", Some("P"), 0), task("B", None, 0), task("C", Some("P"), 2)];

        let children: Vec<_> = select_child_tasks(&tasks, "P")
            .into_iter()
            .filter_map(|t| t.id)
            .collect();

        assert_eq!(children, vec!["A", "C"]);
    }

    #[test]
    fn test_build_create_task_payload_minimal() {
        let payload = build_create_task_payload(&NewTask::new("Buy milk"));
        assert_eq!(payload, serde_json::json!({"title": "Buy milk", "priority": 0}));
    }

    #[test]
    fn test_build_create_task_payload_full() {
        let mut task = NewTask::new("Write report");
        task.priority = "high".to_string();
        task.project_id = Some("p1".to_string());
        task.is_all_day = true;
        task.due_date = Some("2024-01-01T00:00:00+0000".to_string());
        task.reminders = vec!["TRIGGER:P0DT9H0M0S".to_string()];
        task.parent_id = Some("t0".to_string());

        let payload = build_create_task_payload(&task);

        assert_eq!(payload["priority"], 5);
        assert_eq!(payload["projectId"], "p1");
        assert_eq!(payload["isAllDay"], true);
        assert_eq!(payload["reminders"][0], "TRIGGER:P0DT9H0M0S");
        assert_eq!(payload["parentId"], "t0");
        assert!(payload.get("content").is_none());
    }

    #[test]
    fn test_build_update_task_payload_resolves_enums() {
        let mut update = TaskUpdate::new("p1", "t1").with_status("wont_do");
        update.priority = Some("low".to_string());

        let payload = build_update_task_payload(&update).unwrap();

        assert_eq!(
            payload,
            serde_json::json!({"id": "t1", "projectId": "p1", "status": -1, "priority": 1})
        );
    }

    #[test]
    fn test_build_update_task_payload_submits_empty_checklist() {
        let payload = build_update_task_payload(&TaskUpdate::new("p1", "t1").with_items(vec![])).unwrap();
        assert_eq!(payload["items"], serde_json::json!([]));
    }

    #[test]
    fn test_build_update_task_payload_leaves_checklist_alone_without_items() {
        let payload = build_update_task_payload(&TaskUpdate::new("p1", "t1").with_status("normal"))
            .unwrap();
        assert!(payload.get("items").is_none());
        assert_eq!(payload["status"], 0);
    }

    #[test]
    fn test_build_update_task_payload_keeps_item_fields() {
        let mut existing = item("1", 0);
        existing
            .extra
            .insert("sortOrder".to_string(), serde_json::json!(42));

        let payload = build_update_task_payload(&TaskUpdate::new("p1", "t1").with_items(vec![existing]))
                .unwrap();

        assert_eq!(
            payload["items"],
            serde_json::json!([{"id": "1", "title": "item 1", "status": 0, "sortOrder": 42}])
        );
    }

    #[test]
    fn test_project_payloads() {
        let payload = build_create_project_payload(&NewProject {
            name: "Inbox 2".to_string(),
            color: None,
            kind: ProjectKind::Note,
            view_mode: ViewMode::Kanban,
        });
        assert_eq!(
            payload,
            serde_json::json!({"name": "Inbox 2", "kind": "NOTE", "viewMode": "KANBAN"})
        );

        let update = ProjectUpdate {
            color: Some("#F18181".to_string()),
            view_mode: Some(ViewMode::Timeline),
            ..Default::default()
        };
        assert_eq!(
            build_update_project_payload(&update),
            serde_json::json!({"color": "#F18181", "viewMode": "TIMELINE"})
        );
        assert!(ProjectUpdate::default().is_empty());
    }

    #[test]
    fn test_project_kind_and_view_mode_from_str() {
        assert_eq!("Task".parse::<ProjectKind>().unwrap(), ProjectKind::Task);
        assert_eq!("timeline".parse::<ViewMode>().unwrap(), ViewMode::Timeline);
        assert!("board".parse::<ViewMode>().is_err());
    }

    #[test]
    fn test_task_roundtrip_preserves_unknown_fields() {
        let json = serde_json::json!({
            "id": "t1",
            "projectId": "p1",
            "title": "Task",
            "status": 0,
            "priority": 3,
            "tags": ["home"],
            "items": [{"id": "i1", "title": "sub", "status": 0, "sortOrder": 1}]
        });

        let task: Task = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(task.items.len(), 1);
        assert_eq!(task.priority, Some(3));
        assert_eq!(serde_json::to_value(&task).unwrap(), json);
    }

    #[test]
    fn test_authorize_url() {
        let url = authorize_url(
            "client",
            "http://localhost:8080/callback",
            &["read".to_string(), "write".to_string()],
        )
        .unwrap();

        assert!(url.starts_with("https://ticktick.com/oauth/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fcallback"));
        assert!(url.contains("scope=tasks%3Aread+tasks%3Awrite"));
    }

    #[test]
    fn test_token_request_form() {
        let form = token_request_form("c", "s", "abc", "http://cb", &["read".to_string()]);
        assert!(form.contains(&("grant_type".to_string(), "authorization_code".to_string())));
        assert!(form.contains(&("scope".to_string(), "tasks:read".to_string())));
    }

    #[test]
    fn test_extract_access_token() {
        let ok = serde_json::json!({"access_token": "tok", "token_type": "bearer"});
        assert_eq!(extract_access_token(&ok).unwrap(), "tok");

        let missing = serde_json::json!({"error": "invalid_grant"});
        assert!(extract_access_token(&missing).is_err());
    }
}
