use cmdbridge::caller::CommandCaller;
use cmdbridge::dispatch::{HandlerRegistry, RpcDispatcher};
use cmdbridge::envelope::{BridgeMessage, RpcParams, RpcRequest, RpcResponse};
use cmdbridge::error::{ErrorCode, RpcError};
use cmdbridge::relay::ConnectionState;
use cmdbridge_relay::{BridgePort, RelayChannel, RelayConfig, SandboxHost, bridge_pair};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

fn params(value: Value) -> RpcParams {
    value.as_object().cloned().unwrap_or_default()
}

fn error_code(response: &RpcResponse) -> Option<ErrorCode> {
    response.error().and_then(|error| error.error_code())
}

/// Wires a relay to a live sandbox host that serves `ping` and `sleep`.
fn connect_with_sandbox(config: RelayConfig) -> RelayChannel {
    let mut builder = HandlerRegistry::builder();
    builder
        .register_fn("ping", |_| async { Ok(json!({ "pong": true })) })
        .unwrap()
        .register_fn("sleep", |context| async move {
            let ms = context.params.get("ms").and_then(Value::as_u64).unwrap_or(0);
            sleep(Duration::from_millis(ms)).await;
            Ok(json!(context.request_id))
        })
        .unwrap();
    let dispatcher = RpcDispatcher::new(Arc::new(builder.build()));

    let (relay_port, sandbox_port) = bridge_pair(config.bridge_buffer_size);
    SandboxHost::new(dispatcher, "client-test").spawn(sandbox_port);
    RelayChannel::connect(relay_port, config)
}

/// Wires a relay to a bare port so the test plays the sandbox by hand.
fn connect_with_manual_sandbox(config: RelayConfig) -> (RelayChannel, BridgePort) {
    let (relay_port, sandbox_port) = bridge_pair(config.bridge_buffer_size);
    (RelayChannel::connect(relay_port, config), sandbox_port)
}

#[tokio::test]
async fn test_ping_roundtrip_through_sandbox() {
    let relay = connect_with_sandbox(RelayConfig::default());

    let response = relay
        .round_trip(RpcRequest::new("1", "ping", RpcParams::new()))
        .await;

    assert_eq!(response.id, "1");
    assert_eq!(response.result(), Some(&json!({ "pong": true })));
    assert_eq!(relay.pending_count().await, 0);
}

#[tokio::test]
async fn test_duplicate_id_rejected_while_first_is_pending() {
    let relay = connect_with_sandbox(RelayConfig::default());

    let first = relay
        .forward(RpcRequest::new("4", "sleep", params(json!({ "ms": 50 }))))
        .await
        .unwrap();

    let second = relay
        .forward(RpcRequest::new("4", "ping", RpcParams::new()))
        .await;
    assert_eq!(second.err(), Some(RpcError::DuplicateRequestId("4".into())));

    let response = first.wait().await;
    assert_eq!(response.id, "4");
    assert_eq!(response.result(), Some(&json!("4")));
}

#[tokio::test]
async fn test_out_of_order_completion_keeps_correlation() {
    let relay = connect_with_sandbox(RelayConfig::default());

    let slow = relay
        .forward(RpcRequest::new("slow", "sleep", params(json!({ "ms": 80 }))))
        .await
        .unwrap();
    let fast = relay
        .forward(RpcRequest::new("fast", "sleep", params(json!({ "ms": 1 }))))
        .await
        .unwrap();

    let fast_response = fast.wait().await;
    assert_eq!(fast_response.result(), Some(&json!("fast")));
    // The slow request is still outstanding after the fast one resolved.
    assert_eq!(relay.pending_count().await, 1);

    let slow_response = slow.wait().await;
    assert_eq!(slow_response.result(), Some(&json!("slow")));
}

#[tokio::test]
async fn test_channel_close_fails_outstanding_request() {
    let (relay, sandbox) = connect_with_manual_sandbox(RelayConfig::default());

    let pending = relay
        .forward(RpcRequest::new("5", "ping", RpcParams::new()))
        .await
        .unwrap();

    // The sandbox goes away without answering.
    drop(sandbox);

    let response = timeout(Duration::from_secs(1), pending.wait())
        .await
        .expect("pending request was left dangling");
    assert_eq!(response.id, "5");
    assert_eq!(error_code(&response), Some(ErrorCode::ConnectionClosed));
    assert_eq!(relay.state(), ConnectionState::Disconnected);
    assert_eq!(relay.pending_count().await, 0);
}

#[tokio::test]
async fn test_close_drains_exactly_n_pending_requests() {
    let (relay, _sandbox) = connect_with_manual_sandbox(RelayConfig::default());

    let mut calls = Vec::new();
    for n in 0..5 {
        calls.push(
            relay
                .forward(RpcRequest::new(format!("req-{n}"), "ping", RpcParams::new()))
                .await
                .unwrap(),
        );
    }
    assert_eq!(relay.pending_count().await, 5);

    assert_eq!(relay.on_channel_closed().await, 5);
    assert_eq!(relay.pending_count().await, 0);

    for (n, call) in calls.into_iter().enumerate() {
        let response = call.wait().await;
        assert_eq!(response.id, format!("req-{n}"));
        assert_eq!(error_code(&response), Some(ErrorCode::ConnectionClosed));
    }

    // A second close has nothing left to drain.
    assert_eq!(relay.on_channel_closed().await, 0);
}

#[tokio::test]
async fn test_forward_after_close_is_rejected_immediately() {
    let (relay, _sandbox) = connect_with_manual_sandbox(RelayConfig::default());
    relay.on_channel_closed().await;

    let result = relay
        .forward(RpcRequest::new("late", "ping", RpcParams::new()))
        .await;
    assert_eq!(result.err(), Some(RpcError::ConnectionClosed));

    let response = relay
        .round_trip(RpcRequest::new("late", "ping", RpcParams::new()))
        .await;
    assert_eq!(error_code(&response), Some(ErrorCode::ConnectionClosed));
}

#[tokio::test]
async fn test_deadline_expiry_synthesizes_timeout_and_drops_late_result() {
    let config = RelayConfig {
        request_timeout: Duration::from_millis(50),
        timeout_sweep_interval: Duration::from_millis(10),
        ..RelayConfig::default()
    };
    let (relay, mut sandbox) = connect_with_manual_sandbox(config);

    let pending = relay
        .forward(RpcRequest::new("t", "ping", RpcParams::new()))
        .await
        .unwrap();

    let response = timeout(Duration::from_secs(1), pending.wait())
        .await
        .expect("timeout was never synthesized");
    assert_eq!(error_code(&response), Some(ErrorCode::Timeout));

    // The executor finishing late must not be routed anywhere.
    let forwarded = sandbox.receiver.recv().await.unwrap();
    assert_eq!(forwarded.id(), "t");
    sandbox
        .sender
        .send(BridgeMessage::CommandResult(RpcResponse::success("t", json!("late"))))
        .await
        .unwrap();
    sleep(Duration::from_millis(20)).await;

    assert_eq!(relay.pending_count().await, 0);
    assert!(!relay.on_response(RpcResponse::success("t", json!("late"))).await);
}

#[tokio::test]
async fn test_late_result_never_answers_a_retry_with_the_same_id() {
    let config = RelayConfig {
        request_timeout: Duration::from_millis(50),
        timeout_sweep_interval: Duration::from_millis(10),
        ..RelayConfig::default()
    };
    let (relay, mut sandbox) = connect_with_manual_sandbox(config);

    let first = relay
        .forward(RpcRequest::new("t", "echo", params(json!({ "v": "first" }))))
        .await
        .unwrap();
    let forwarded = sandbox.receiver.recv().await.unwrap();
    assert_eq!(forwarded.id(), "t");

    let response = timeout(Duration::from_secs(1), first.wait())
        .await
        .expect("timeout was never synthesized");
    assert_eq!(error_code(&response), Some(ErrorCode::Timeout));

    // The first run is still executing, so the id is not free yet.
    let early_retry = relay
        .forward(RpcRequest::new("t", "echo", params(json!({ "v": "retry" }))))
        .await;
    assert_eq!(
        early_retry.err(),
        Some(RpcError::DuplicateRequestId("t".into()))
    );

    // The first run finishes late; its result is dropped and frees the id.
    sandbox
        .sender
        .send(BridgeMessage::CommandResult(RpcResponse::success(
            "t",
            json!("result-of-first"),
        )))
        .await
        .unwrap();
    sleep(Duration::from_millis(20)).await;

    let retry = relay
        .forward(RpcRequest::new("t", "echo", params(json!({ "v": "retry" }))))
        .await
        .unwrap();
    match sandbox.receiver.recv().await.unwrap() {
        BridgeMessage::ExecuteCommand(request) => {
            assert_eq!(request.params.get("v"), Some(&json!("retry")));
        }
        other => panic!("expected execute-command, got {other:?}"),
    }
    sandbox
        .sender
        .send(BridgeMessage::CommandResult(RpcResponse::success(
            "t",
            json!("result-of-retry"),
        )))
        .await
        .unwrap();

    let response = timeout(Duration::from_secs(1), retry.wait()).await.unwrap();
    assert_eq!(response.result(), Some(&json!("result-of-retry")));
}

#[tokio::test]
async fn test_pending_bound_rejects_overflow() {
    let config = RelayConfig {
        max_pending_requests: 2,
        ..RelayConfig::default()
    };
    let (relay, _sandbox) = connect_with_manual_sandbox(config);

    let _a = relay
        .forward(RpcRequest::new("a", "ping", RpcParams::new()))
        .await
        .unwrap();
    let _b = relay
        .forward(RpcRequest::new("b", "ping", RpcParams::new()))
        .await
        .unwrap();

    let overflow = relay
        .forward(RpcRequest::new("c", "ping", RpcParams::new()))
        .await;
    assert_eq!(overflow.err(), Some(RpcError::Overloaded { limit: 2 }));
}

#[tokio::test]
async fn test_state_subscribers_observe_disconnect() {
    let (relay, sandbox) = connect_with_manual_sandbox(RelayConfig::default());
    let mut state = relay.subscribe_state();
    assert_eq!(*state.borrow(), ConnectionState::Connected);

    drop(sandbox);
    timeout(Duration::from_secs(1), state.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(*state.borrow(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_relay_serves_as_command_caller() {
    let relay = connect_with_sandbox(RelayConfig::default());

    let value = relay.call("ping", RpcParams::new()).await.unwrap();
    assert_eq!(value, json!({ "pong": true }));

    let err = relay.call("nope", RpcParams::new()).await.unwrap_err();
    assert_eq!(err.error_code(), Some(ErrorCode::MethodNotFound));

    let value = relay
        .call_with_id("mine".into(), "sleep", params(json!({ "ms": 1 })))
        .await
        .unwrap();
    assert_eq!(value, json!("mine"));
}
