//! TickTick Open API adapter

use std::collections::HashSet;

use apiwrap_core::error::Provider;
use apiwrap_core::ticktick::{
    build_create_project_payload, build_create_task_payload, build_update_project_payload,
    build_update_task_payload, plan_wont_do_cascade, reconcile_checklist, select_child_tasks,
    ChecklistIntent, ChecklistItem, NewProject, NewTask, Project, ProjectData, ProjectUpdate,
    Task, TaskUpdate, API_ROOT,
};

use crate::http::{segment, Transport};
use crate::prelude::*;

/// Flow that produces a TickTick access token
pub const AUTH_FLOW: &str = "apiwrap ticktick auth";

/// Adapter for one TickTick account
#[derive(Debug, Clone)]
pub struct TickTick {
    transport: Transport,
    root: String,
}

impl TickTick {
    pub fn new(access_token: &str) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(Provider::TickTick, Some(access_token))?,
            root: API_ROOT.to_string(),
        })
    }

    /// Build the adapter from `TICKTICK_ACCESS_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("TICKTICK_ACCESS_TOKEN")
            .ok()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                apiwrap_core::error::ErrorContext::new(Provider::TickTick)
                    .missing_access_token(AUTH_FLOW)
            })?;
        Self::new(&token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.root, path)
    }

    // --- Projects ---

    pub async fn get_projects(&self) -> Result<Vec<Project>, ApiError> {
        let request = self.transport.get(&self.url("/project"));
        self.transport.json(request, "get projects").await
    }

    pub async fn get_project_data(&self, project_id: &str) -> Result<ProjectData, ApiError> {
        let url = self.url(&format!("/project/{}/data", segment(project_id)));
        self.transport
            .json(self.transport.get(&url), "get project")
            .await
    }

    pub async fn create_project(&self, project: &NewProject) -> Result<Project, ApiError> {
        let request = self
            .transport
            .post(&self.url("/project"))
            .json(&build_create_project_payload(project));
        self.transport.json(request, "create project").await
    }

    pub async fn update_project(
        &self,
        project_id: &str,
        update: &ProjectUpdate,
    ) -> Result<Project, ApiError> {
        let url = self.url(&format!("/project/{}", segment(project_id)));
        let request = self
            .transport
            .post(&url)
            .json(&build_update_project_payload(update));
        self.transport.json(request, "update project").await
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<serde_json::Value, ApiError> {
        let url = self.url(&format!("/project/{}", segment(project_id)));
        self.transport
            .json_or_null(self.transport.delete(&url), "delete project")
            .await
    }

    // --- Tasks ---

    /// Tasks of a project; a project without tasks yields an empty list.
    pub async fn get_tasks(&self, project_id: &str) -> Result<Vec<Task>, ApiError> {
        Ok(self.get_project_data(project_id).await?.tasks)
    }

    pub async fn get_task(&self, project_id: &str, task_id: &str) -> Result<Task, ApiError> {
        let url = self.url(&format!(
            "/project/{}/task/{}",
            segment(project_id),
            segment(task_id)
        ));
        self.transport.json(self.transport.get(&url), "get task").await
    }

    pub async fn get_child_tasks(
        &self,
        project_id: &str,
        task_id: &str,
    ) -> Result<Vec<Task>, ApiError> {
        let tasks = self.get_tasks(project_id).await?;
        Ok(select_child_tasks(&tasks, task_id))
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        let request = self
            .transport
            .post(&self.url("/task"))
            .json(&build_create_task_payload(task));
        self.transport.json(request, "create task").await
    }

    pub async fn update_task(&self, update: &TaskUpdate) -> Result<Task, ApiError> {
        let url = self.url(&format!("/task/{}", segment(&update.task_id)));
        let request = self
            .transport
            .post(&url)
            .json(&build_update_task_payload(update)?);
        self.transport.json(request, "update task").await
    }

    pub async fn delete_task(
        &self,
        project_id: &str,
        task_id: &str,
    ) -> Result<serde_json::Value, ApiError> {
        let url = self.url(&format!(
            "/project/{}/task/{}",
            segment(project_id),
            segment(task_id)
        ));
        self.transport
            .json_or_null(self.transport.delete(&url), "delete task")
            .await
    }

    pub async fn complete_task(
        &self,
        project_id: &str,
        task_id: &str,
    ) -> Result<serde_json::Value, ApiError> {
        let url = self.url(&format!(
            "/project/{}/task/{}/complete",
            segment(project_id),
            segment(task_id)
        ));
        self.transport
            .send(self.transport.post(&url), "complete task")
            .await?;
        Ok(serde_json::json!({ "status": "success" }))
    }

    /// Mark a task as "won't do", after every child still open.
    ///
    /// Children are updated one at a time before the parent. The first failure
    /// stops the sequence; children already updated keep their new status.
    pub async fn wont_do_task(&self, project_id: &str, task_id: &str) -> Result<Task, ApiError> {
        let errors = self.transport.errors();
        let tasks = self
            .get_tasks(project_id)
            .await
            .map_err(|e| errors.reconciliation("set task to wont do", e))?;

        for child_id in plan_wont_do_cascade(&tasks, task_id) {
            log::debug!("Cascading wont_do from {task_id} to child {child_id}");
            self.update_task(&TaskUpdate::new(project_id, child_id).with_status("wont_do"))
                .await?;
        }

        self.update_task(&TaskUpdate::new(project_id, task_id).with_status("wont_do"))
            .await
    }

    // --- Checklist ---

    pub async fn get_checklist_items(
        &self,
        project_id: &str,
        task_id: &str,
    ) -> Result<Vec<ChecklistItem>, ApiError> {
        Ok(self.get_task(project_id, task_id).await?.items)
    }

    /// Fetch the task, compute the next checklist and write it back in one update.
    pub async fn apply_checklist(
        &self,
        project_id: &str,
        task_id: &str,
        intent: &ChecklistIntent,
    ) -> Result<Task, ApiError> {
        let current = self
            .get_task(project_id, task_id)
            .await
            .map_err(|e| self.transport.errors().reconciliation(intent.describe(), e))?;

        let items = reconcile_checklist(current.items, intent);
        self.update_task(&TaskUpdate::new(project_id, task_id).with_items(items))
            .await
    }

    pub async fn add_checklist_items(
        &self,
        project_id: &str,
        task_id: &str,
        titles: Vec<String>,
    ) -> Result<Task, ApiError> {
        self.apply_checklist(project_id, task_id, &ChecklistIntent::Add(titles))
            .await
    }

    pub async fn complete_checklist_items(
        &self,
        project_id: &str,
        task_id: &str,
        item_ids: Option<HashSet<String>>,
    ) -> Result<Task, ApiError> {
        self.apply_checklist(project_id, task_id, &ChecklistIntent::Complete(item_ids))
            .await
    }

    pub async fn delete_checklist_items(
        &self,
        project_id: &str,
        task_id: &str,
        item_id: Option<String>,
    ) -> Result<Task, ApiError> {
        self.apply_checklist(project_id, task_id, &ChecklistIntent::Delete(item_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    /// One request as the fake server saw it.
    #[derive(Debug, Clone)]
    struct Recorded {
        method: String,
        path: String,
        body: serde_json::Value,
    }

    type Requests = Arc<Mutex<Vec<Recorded>>>;

    /// Answers `(method, path)` with a status and a body.
    type Route = fn(&str, &str) -> (u16, String);

    /// Serve `route` on a loopback port, one request per connection.
    async fn serve(route: Route) -> (TickTick, Requests) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests: Requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let (read, mut write) = stream.into_split();
                let mut reader = BufReader::new(read);

                let mut request_line = String::new();
                reader.read_line(&mut request_line).await.unwrap();
                let mut parts = request_line.split_whitespace();
                let method = parts.next().unwrap_or_default().to_string();
                let path = parts.next().unwrap_or_default().to_string();

                let mut length = 0;
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).await.unwrap();
                    let header = header.trim_end();
                    if header.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = header.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            length = value.trim().parse().unwrap();
                        }
                    }
                }

                let mut body = vec![0; length];
                reader.read_exact(&mut body).await.unwrap();
                let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);

                let (status, response) = route(&method, &path);
                log.lock().unwrap().push(Recorded { method, path, body });

                let reply = format!(
                    "HTTP/1.1 {status} Fake\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{response}",
                    response.len()
                );
                write.write_all(reply.as_bytes()).await.unwrap();
                write.shutdown().await.ok();
            }
        });

        let client = TickTick {
            transport: Transport::local(Provider::TickTick).unwrap(),
            root: format!("http://{addr}"),
        };
        (client, requests)
    }

    fn sent(requests: &Requests) -> Vec<Recorded> {
        requests.lock().unwrap().clone()
    }

    fn calls(requests: &Requests) -> Vec<String> {
        sent(requests)
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    fn project_with_children() -> String {
        serde_json::json!({
            "project": {"id": "p", "name": "Inbox"},
            "tasks": [
                {"id": "P", "projectId": "p", "title": "parent", "status": 0},
                {"id": "A", "projectId": "p", "parentId": "P", "title": "open", "status": 0},
                {"id": "B", "projectId": "p", "parentId": "P", "title": "done", "status": 2},
                {"id": "C", "projectId": "p", "parentId": "P", "title": "open too", "status": 0},
                {"id": "X", "projectId": "p", "title": "unrelated", "status": 0}
            ]
        })
        .to_string()
    }

    fn updated_task(path: &str) -> String {
        let id = path.trim_start_matches("/task/");
        serde_json::json!({"id": id, "projectId": "p", "status": -1}).to_string()
    }

    #[tokio::test]
    async fn test_wont_do_updates_open_children_before_parent() {
        let (client, requests) = serve(|method, path| match (method, path) {
            ("GET", "/project/p/data") => (200, project_with_children()),
            ("POST", path) => (200, updated_task(path)),
            _ => (404, String::new()),
        })
        .await;

        let task = client.wont_do_task("p", "P").await.unwrap();

        assert_eq!(task.id.as_deref(), Some("P"));
        assert_eq!(
            calls(&requests),
            vec![
                "GET /project/p/data",
                "POST /task/A",
                "POST /task/C",
                "POST /task/P"
            ]
        );
        for update in sent(&requests).iter().skip(1) {
            assert_eq!(update.body["status"], -1);
            assert_eq!(update.body["projectId"], "p");
        }
    }

    #[tokio::test]
    async fn test_wont_do_stops_at_failing_child() {
        let (client, requests) = serve(|method, path| match (method, path) {
            ("GET", "/project/p/data") => (200, project_with_children()),
            ("POST", "/task/C") => (500, "boom".to_string()),
            ("POST", path) => (200, updated_task(path)),
            _ => (404, String::new()),
        })
        .await;

        let err = client.wont_do_task("p", "P").await.unwrap_err();

        assert!(matches!(
            &err,
            ApiError::Transport { provider: Provider::TickTick, status: 500, body, .. } if body == "boom"
        ));
        assert_eq!(
            calls(&requests),
            vec!["GET /project/p/data", "POST /task/A", "POST /task/C"]
        );
    }

    #[tokio::test]
    async fn test_wont_do_fails_when_project_read_fails() {
        let (client, requests) = serve(|_, _| (503, "unavailable".to_string())).await;

        let err = client.wont_do_task("p", "P").await.unwrap_err();

        assert!(matches!(err, ApiError::Reconciliation { .. }));
        assert_eq!(err.status(), Some(503));
        assert_eq!(calls(&requests), vec!["GET /project/p/data"]);
    }

    #[tokio::test]
    async fn test_non_success_status_yields_transport_error() {
        let (client, _) = serve(|_, _| (500, "internal".to_string())).await;

        let err = client.get_task("p", "t").await.unwrap_err();

        match err {
            ApiError::Transport {
                provider,
                context,
                status,
                body,
            } => {
                assert_eq!(provider, Provider::TickTick);
                assert_eq!(context, "get task");
                assert_eq!(status, 500);
                assert_eq!(body, "internal");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_checklist_read_failure_never_writes() {
        let (client, requests) = serve(|_, _| (404, "task not found".to_string())).await;

        let err = client
            .delete_checklist_items("p", "t", Some("i1".to_string()))
            .await
            .unwrap_err();

        match &err {
            ApiError::Reconciliation { action, source, .. } => {
                assert_eq!(action, "delete checklist item");
                assert!(matches!(**source, ApiError::Transport { status: 404, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(calls(&requests), vec!["GET /project/p/task/t"]);
    }

    #[tokio::test]
    async fn test_checklist_delete_submits_remaining_items() {
        let (client, requests) = serve(|method, _| match method {
            "GET" => (
                200,
                serde_json::json!({
                    "id": "t",
                    "projectId": "p",
                    "title": "groceries",
                    "items": [
                        {"id": "i1", "title": "milk", "status": 0},
                        {"id": "i2", "title": "eggs", "status": 1, "sortOrder": 7}
                    ]
                })
                .to_string(),
            ),
            _ => (
                200,
                serde_json::json!({
                    "id": "t",
                    "projectId": "p",
                    "items": [{"id": "i2", "title": "eggs", "status": 1}]
                })
                .to_string(),
            ),
        })
        .await;

        let task = client
            .delete_checklist_items("p", "t", Some("i1".to_string()))
            .await
            .unwrap();

        assert_eq!(task.items.len(), 1);
        assert_eq!(
            calls(&requests),
            vec!["GET /project/p/task/t", "POST /task/t"]
        );
        let update = &sent(&requests)[1];
        assert_eq!(
            update.body["items"],
            serde_json::json!([{"id": "i2", "title": "eggs", "status": 1, "sortOrder": 7}])
        );
    }
}
