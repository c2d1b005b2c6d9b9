use std::sync::{Arc, Mutex};

use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use taskbridge::backend::{BackendClient, ProjectFilters, TaskFilters};

type Captured = Arc<Mutex<Vec<String>>>;

/// Spawn a backend that records each raw query string it receives.
async fn spawn_capturing_backend() -> (BackendClient, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));

    async fn capture(
        State(captured): State<Captured>,
        RawQuery(query): RawQuery,
    ) -> Json<Value> {
        captured.lock().unwrap().push(query.unwrap_or_default());
        Json(json!([]))
    }

    let router = Router::new()
        .route("/tasks", get(capture))
        .route("/projects", get(capture))
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock backend");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock backend died");
    });

    (BackendClient::new(format!("http://{addr}")), captured)
}

async fn spawn_backend(router: Router) -> BackendClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock backend");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock backend died");
    });
    BackendClient::new(format!("http://{addr}"))
}

mod query_parameters {
    use super::*;

    #[tokio::test]
    async fn only_present_filters_become_parameters() {
        let (client, captured) = spawn_capturing_backend().await;

        let filters = TaskFilters {
            status: Some("complete".to_string()),
            ..Default::default()
        };
        client.query_tasks(&filters).await.expect("query failed");

        assert_eq!(*captured.lock().unwrap(), vec!["status=complete"]);
    }

    #[tokio::test]
    async fn empty_filters_send_no_query_string() {
        let (client, captured) = spawn_capturing_backend().await;

        client
            .query_tasks(&TaskFilters::default())
            .await
            .expect("query failed");

        assert_eq!(*captured.lock().unwrap(), vec![""]);
    }

    #[tokio::test]
    async fn empty_string_filters_are_dropped() {
        let (client, captured) = spawn_capturing_backend().await;

        let filters = ProjectFilters {
            name: Some(String::new()),
            status: Some("block".to_string()),
            ..Default::default()
        };
        client.query_projects(&filters).await.expect("query failed");

        assert_eq!(*captured.lock().unwrap(), vec!["status=block"]);
    }
}

mod responses {
    use super::*;

    #[tokio::test]
    async fn null_body_is_treated_as_an_empty_list() {
        let client = spawn_backend(
            Router::new().route("/tasks", get(|| async { Json(Value::Null) })),
        )
        .await;

        let tasks = client
            .query_tasks(&TaskFilters::default())
            .await
            .expect("query failed");
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn non_array_body_is_an_error() {
        let client = spawn_backend(
            Router::new().route("/tasks", get(|| async { Json(json!({"rows": []})) })),
        )
        .await;

        let err = client
            .query_tasks(&TaskFilters::default())
            .await
            .expect_err("object body should be rejected");
        assert!(err.to_string().contains("expected a JSON array"));
    }

    #[tokio::test]
    async fn create_sends_fields_verbatim_and_returns_the_record() {
        let sent: Captured = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route(
                "/projects",
                post(
                    |State(sent): State<Captured>, Json(body): Json<Value>| async move {
                        sent.lock().unwrap().push(body.to_string());
                        let mut record = body;
                        record["id"] = json!(12);
                        Json(record)
                    },
                ),
            )
            .with_state(sent.clone());
        let client = spawn_backend(router).await;

        let fields = json!({"name": "Eagle", "start_date": "2026-09-01"});
        let record = client.create_project(&fields).await.expect("create failed");

        assert_eq!(record["id"], 12);
        assert_eq!(record["name"], "Eagle");
        let sent = sent.lock().unwrap();
        let forwarded: Value = serde_json::from_str(&sent[0]).expect("captured body is JSON");
        assert_eq!(forwarded, fields);
    }

    #[tokio::test]
    async fn structured_error_detail_is_preferred_over_the_raw_body() {
        let client = spawn_backend(Router::new().route(
            "/tasks",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"detail": "project_id must reference an existing project"})),
                )
            }),
        ))
        .await;

        let err = client
            .create_task(&json!({"title": "t", "project_id": 999}))
            .await
            .expect_err("422 should be an error");
        assert_eq!(
            err.detail().as_deref(),
            Some("project_id must reference an existing project")
        );
    }
}
