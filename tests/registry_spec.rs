use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use speculate2::speculate;
use tokio_test::block_on;

use taskbridge::error::ToolError;
use taskbridge::registry::{FieldKind, FieldSpec, ToolRegistry, ToolSpec};

/// A registry with one configurable tool whose handler counts invocations.
fn registry_with_tool(
    fields: Vec<FieldSpec>,
    empty_message: Option<&'static str>,
    result: Result<Value, &'static str>,
    calls: Arc<AtomicUsize>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(ToolSpec {
        name: "probe",
        description: "test probe",
        fields,
        success_key: "records",
        empty_message,
        handler: Arc::new(move |_args| {
            calls.fetch_add(1, Ordering::SeqCst);
            let result = result.clone();
            Box::pin(async move {
                result.map_err(|message| ToolError::Downstream {
                    message: message.to_string(),
                })
            })
        }),
    });
    registry
}

/// Unwrap the single text content block and parse its JSON body.
fn envelope_body(result: &Value) -> Value {
    let text = result["content"][0]["text"]
        .as_str()
        .expect("envelope should hold one text block");
    assert_eq!(result["content"].as_array().map(Vec::len), Some(1));
    assert_eq!(result["content"][0]["type"], "text");
    serde_json::from_str(text).expect("envelope text should be JSON")
}

speculate! {
    describe "validation" {
        it "rejects a missing required field without invoking the handler" {
            let calls = Arc::new(AtomicUsize::new(0));
            let registry = registry_with_tool(
                vec![FieldSpec::required("title", FieldKind::String, "t")],
                None,
                Ok(json!({"id": 1})),
                calls.clone(),
            );

            let result = block_on(registry.call("probe", json!({}))).expect("tool exists");
            let body = envelope_body(&result);

            assert_eq!(body["isError"], true);
            assert_eq!(
                body["error"],
                "Invalid arguments: missing or invalid fields: title"
            );
            assert_eq!(calls.load(Ordering::SeqCst), 0);
        }

        it "collects every offending field in one message" {
            let calls = Arc::new(AtomicUsize::new(0));
            let registry = registry_with_tool(
                vec![
                    FieldSpec::required("title", FieldKind::String, "t"),
                    FieldSpec::required("project_id", FieldKind::Integer, "p"),
                ],
                None,
                Ok(json!({"id": 1})),
                calls,
            );

            let result = block_on(registry.call("probe", json!({"project_id": "nope"})))
                .expect("tool exists");
            let body = envelope_body(&result);

            assert_eq!(
                body["error"],
                "Invalid arguments: missing or invalid fields: title, project_id"
            );
        }

        it "rejects a type mismatch on an optional field" {
            let calls = Arc::new(AtomicUsize::new(0));
            let registry = registry_with_tool(
                vec![FieldSpec::optional("status", FieldKind::String, "s")],
                None,
                Ok(json!([])),
                calls.clone(),
            );

            let result = block_on(registry.call("probe", json!({"status": 7})))
                .expect("tool exists");
            let body = envelope_body(&result);

            assert_eq!(body["isError"], true);
            assert_eq!(calls.load(Ordering::SeqCst), 0);
        }

        it "treats an explicit null as an absent optional field" {
            let calls = Arc::new(AtomicUsize::new(0));
            let registry = registry_with_tool(
                vec![FieldSpec::optional("status", FieldKind::String, "s")],
                None,
                Ok(json!({"ok": true})),
                calls.clone(),
            );

            let result = block_on(registry.call("probe", json!({"status": null})))
                .expect("tool exists");
            let body = envelope_body(&result);

            assert_eq!(body["isError"], false);
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    describe "envelope" {
        it "wraps a successful payload under the tool's success key" {
            let calls = Arc::new(AtomicUsize::new(0));
            let registry = registry_with_tool(
                vec![],
                None,
                Ok(json!([{"id": 1}, {"id": 2}])),
                calls,
            );

            let result = block_on(registry.call("probe", json!({}))).expect("tool exists");
            let body = envelope_body(&result);

            assert_eq!(body["isError"], false);
            assert_eq!(body["records"], json!([{"id": 1}, {"id": 2}]));
            assert!(body.get("error").is_none());
        }

        it "reports an empty result as an error when the tool declares a message" {
            let calls = Arc::new(AtomicUsize::new(0));
            let registry = registry_with_tool(
                vec![],
                Some("No matching records found."),
                Ok(json!([])),
                calls,
            );

            let result = block_on(registry.call("probe", json!({}))).expect("tool exists");
            let body = envelope_body(&result);

            assert_eq!(body["isError"], true);
            assert_eq!(body["error"], "No matching records found.");
            assert!(body.get("records").is_none());
        }

        it "keeps an empty result as success when no empty message is declared" {
            let calls = Arc::new(AtomicUsize::new(0));
            let registry = registry_with_tool(vec![], None, Ok(json!([])), calls);

            let result = block_on(registry.call("probe", json!({}))).expect("tool exists");
            let body = envelope_body(&result);

            assert_eq!(body["isError"], false);
            assert_eq!(body["records"], json!([]));
        }

        it "folds a handler error into the error envelope" {
            let calls = Arc::new(AtomicUsize::new(0));
            let registry = registry_with_tool(
                vec![],
                None,
                Err("Backend error: name already exists"),
                calls,
            );

            let result = block_on(registry.call("probe", json!({}))).expect("tool exists");
            let body = envelope_body(&result);

            assert_eq!(body["isError"], true);
            assert_eq!(body["error"], "Backend error: name already exists");
        }
    }

    describe "lookup" {
        it "returns None for an unknown tool name" {
            let calls = Arc::new(AtomicUsize::new(0));
            let registry = registry_with_tool(vec![], None, Ok(json!([])), calls);

            assert!(block_on(registry.call("nonexistent", json!({}))).is_none());
        }

        it "lists registered tools with their schemas" {
            let calls = Arc::new(AtomicUsize::new(0));
            let registry = registry_with_tool(
                vec![
                    FieldSpec::required("title", FieldKind::String, "the title"),
                    FieldSpec::optional("status", FieldKind::String, "the status"),
                ],
                None,
                Ok(json!([])),
                calls,
            );

            let catalog = registry.catalog();
            let tools = catalog["tools"].as_array().expect("tools array");
            assert_eq!(tools.len(), 1);
            assert_eq!(tools[0]["name"], "probe");
            let schema = &tools[0]["inputSchema"];
            assert_eq!(schema["type"], "object");
            assert_eq!(schema["properties"]["title"]["type"], "string");
            assert_eq!(schema["required"], json!(["title"]));
        }
    }
}
