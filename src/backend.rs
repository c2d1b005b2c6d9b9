//! HTTP client for the project/task REST backend.
//!
//! The backend owns all persistence; this client only translates filter
//! structs into query parameters and creation payloads into JSON bodies.
//! Records come back as raw `serde_json::Value`s and are forwarded to callers
//! verbatim.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Backend client errors.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl BackendError {
    /// Structured error detail from the backend response body, when present.
    ///
    /// The backend reports validation failures as `{"error": "..."}` (or
    /// FastAPI-style `{"detail": "..."}`); transport-level failures have no
    /// structured detail.
    pub fn detail(&self) -> Option<String> {
        let Self::Status { body, .. } = self else {
            return None;
        };
        let parsed: Value = serde_json::from_str(body).ok()?;
        let detail = parsed.get("error").or_else(|| parsed.get("detail"))?;
        match detail {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Optional filters for `GET /tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilters {
    pub assigned_to: Option<String>,
    pub status: Option<String>,
    pub project_id: Option<i64>,
    pub title: Option<String>,
    /// YYYY-MM-DD
    pub due_date: Option<String>,
}

impl TaskFilters {
    /// Only fields that are present and non-empty become query parameters;
    /// "no filter" must never be sent as "filter = empty string".
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        push_str(&mut params, "assigned_to", &self.assigned_to);
        push_str(&mut params, "status", &self.status);
        if let Some(project_id) = self.project_id {
            params.push(("project_id", project_id.to_string()));
        }
        push_str(&mut params, "title", &self.title);
        push_str(&mut params, "due_date", &self.due_date);
        params
    }
}

/// Optional filters for `GET /projects`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFilters {
    pub name: Option<String>,
    pub status: Option<String>,
    /// YYYY-MM-DD
    pub start_date: Option<String>,
    /// YYYY-MM-DD
    pub end_date: Option<String>,
}

impl ProjectFilters {
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        push_str(&mut params, "name", &self.name);
        push_str(&mut params, "status", &self.status);
        push_str(&mut params, "start_date", &self.start_date);
        push_str(&mut params, "end_date", &self.end_date);
        params
    }
}

fn push_str(params: &mut Vec<(&'static str, String)>, name: &'static str, value: &Option<String>) {
    if let Some(value) = value {
        if !value.is_empty() {
            params.push((name, value.clone()));
        }
    }
}

/// HTTP client for the project/task backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    /// Handle a response, converting error statuses to `BackendError`.
    async fn handle_response(&self, response: reqwest::Response) -> Result<Value, BackendError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(BackendError::Status { status, body })
        }
    }

    async fn get_list(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<Vec<Value>, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url);
        if !params.is_empty() {
            request = request.query(params);
        }
        let response = request.send().await?;
        let data = self.handle_response(response).await?;
        // The backend returns null for "nothing matched"; treat it as empty.
        match data {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            other => Err(BackendError::Status {
                status: StatusCode::OK,
                body: format!("expected a JSON array, got: {other}"),
            }),
        }
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(body).send().await?;
        self.handle_response(response).await
    }

    /// Fetch tasks with optional filters.
    pub async fn query_tasks(&self, filters: &TaskFilters) -> Result<Vec<Value>, BackendError> {
        tracing::debug!(?filters, "query_tasks");
        self.get_list("/tasks", &filters.query_params()).await
    }

    /// Fetch projects with optional filters.
    pub async fn query_projects(
        &self,
        filters: &ProjectFilters,
    ) -> Result<Vec<Value>, BackendError> {
        tracing::debug!(?filters, "query_projects");
        self.get_list("/projects", &filters.query_params()).await
    }

    /// Create a project; the full field set goes out as the request body and
    /// the created record comes back verbatim.
    pub async fn create_project(&self, fields: &Value) -> Result<Value, BackendError> {
        tracing::debug!(%fields, "create_project");
        self.post_json("/projects", fields).await
    }

    /// Create a task within a project.
    pub async fn create_task(&self, fields: &Value) -> Result<Value, BackendError> {
        tracing::debug!(%fields, "create_task");
        self.post_json("/tasks", fields).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_filters_skip_absent_and_empty_fields() {
        let filters = TaskFilters {
            assigned_to: Some("Bob".to_string()),
            status: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            filters.query_params(),
            vec![("assigned_to", "Bob".to_string())]
        );
    }

    #[test]
    fn empty_task_filters_produce_no_params() {
        assert!(TaskFilters::default().query_params().is_empty());
    }

    #[test]
    fn project_id_zero_is_still_forwarded() {
        let filters = TaskFilters {
            project_id: Some(0),
            ..Default::default()
        };
        assert_eq!(filters.query_params(), vec![("project_id", "0".to_string())]);
    }

    #[test]
    fn detail_reads_error_then_detail_key() {
        let err = BackendError::Status {
            status: StatusCode::BAD_REQUEST,
            body: r#"{"error": "duplicate name"}"#.to_string(),
        };
        assert_eq!(err.detail().as_deref(), Some("duplicate name"));

        let err = BackendError::Status {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: r#"{"detail": "project_id must be an integer"}"#.to_string(),
        };
        assert_eq!(err.detail().as_deref(), Some("project_id must be an integer"));
    }

    #[test]
    fn detail_is_none_for_unstructured_bodies() {
        let err = BackendError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: "<html>502</html>".to_string(),
        };
        assert!(err.detail().is_none());
    }
}
