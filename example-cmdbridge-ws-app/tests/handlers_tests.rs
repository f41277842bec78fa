use cmdbridge::dispatch::RpcDispatcher;
use cmdbridge::envelope::RpcRequest;
use cmdbridge::error::ErrorCode;
use example_cmdbridge_ws_app::{InMemoryDocument, build_registry};
use serde_json::{Value, json};
use std::sync::Arc;

fn request(id: &str, method: &str, params: Value) -> RpcRequest {
    match params {
        Value::Object(map) => RpcRequest::new(id, method, map),
        _ => RpcRequest::new(id, method, Default::default()),
    }
}

fn dispatcher_over(document: Arc<InMemoryDocument>) -> RpcDispatcher {
    RpcDispatcher::new(Arc::new(build_registry(document).unwrap()))
}

#[tokio::test]
async fn test_registry_lists_example_commands() {
    let registry = build_registry(Arc::new(InMemoryDocument::new("Doc"))).unwrap();
    assert_eq!(
        registry.list(),
        vec![
            "create_rectangle",
            "delay",
            "echo",
            "fail",
            "get_document_info",
            "ping"
        ]
    );
}

#[tokio::test]
async fn test_create_rectangle_updates_document() {
    let document = Arc::new(InMemoryDocument::new("Doc"));
    let dispatcher = dispatcher_over(document.clone());

    let response = dispatcher
        .dispatch(
            request(
                "r1",
                "create_rectangle",
                json!({ "x": 10, "y": 20, "width": 100, "height": 50 }),
            ),
            "client-test",
        )
        .await;
    assert_eq!(
        response.result(),
        Some(&json!({ "id": "1:1", "name": "Rectangle 1" }))
    );

    let info = dispatcher
        .dispatch(request("r2", "get_document_info", json!({})), "client-test")
        .await;
    assert_eq!(info.result(), Some(&json!({ "name": "Doc", "nodeCount": 1 })));

    let nodes = document.nodes().await;
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].width, 100.0);
    assert_eq!(nodes[0].y, 20.0);
}

#[tokio::test]
async fn test_create_rectangle_rejects_non_positive_size() {
    let document = Arc::new(InMemoryDocument::new("Doc"));
    let dispatcher = dispatcher_over(document.clone());

    let response = dispatcher
        .dispatch(
            request("r1", "create_rectangle", json!({ "width": 0, "height": 50 })),
            "client-test",
        )
        .await;
    let error = response.error().unwrap();
    assert_eq!(error.code, ErrorCode::InvalidParams.code());
    assert_eq!(error.data, Some(json!({ "field": "width" })));

    // The document was never touched.
    assert!(document.nodes().await.is_empty());
}

#[tokio::test]
async fn test_full_document_reports_execution_error() {
    let document = Arc::new(InMemoryDocument::with_capacity("Tiny", 1));
    let dispatcher = dispatcher_over(document);

    let params = json!({ "width": 1, "height": 1 });
    let first = dispatcher
        .dispatch(request("a", "create_rectangle", params.clone()), "c")
        .await;
    assert!(first.is_success());

    let second = dispatcher
        .dispatch(request("b", "create_rectangle", params), "c")
        .await;
    assert_eq!(second.id, "b");
    assert_eq!(
        second.error().unwrap().code,
        ErrorCode::ExecutionError.code()
    );
}

#[tokio::test]
async fn test_fail_carries_reason_and_client_id() {
    let dispatcher = dispatcher_over(Arc::new(InMemoryDocument::new("Doc")));

    let response = dispatcher
        .dispatch(request("f", "fail", json!({ "reason": "nope" })), "client-7")
        .await;
    let error = response.error().unwrap();
    assert_eq!(error.code, ErrorCode::ExecutionError.code());
    assert_eq!(error.message, "nope");
    assert_eq!(error.data, Some(json!({ "clientId": "client-7" })));
}

#[tokio::test]
async fn test_echo_requires_message() {
    let dispatcher = dispatcher_over(Arc::new(InMemoryDocument::new("Doc")));

    let response = dispatcher
        .dispatch(request("3", "echo", json!({})), "c")
        .await;
    assert_eq!(response.error().unwrap().code, -32602);
}
