use cmdbridge::caller::{CommandCall, CommandCaller};
use cmdbridge::dispatch::HandlerRegistry;
use cmdbridge::envelope::{RpcParams, RpcRequest};
use cmdbridge::error::{ErrorCode, HandlerError, RpcCallerError};
use cmdbridge_relay::RelayConfig;
use cmdbridge_tokio_client::{RpcClient, RpcClientConfig};
use cmdbridge_tokio_server::{
    RelayServer, RelayServerConfig, utils::bind_tcp_listener_on_random_port,
};
use example_cmdbridge_command_definition::{
    Delay, DelayParams, DelayResult, Echo, EchoParams, Fail, FailParams, NoParams, Ping,
    PingResult,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::join;

fn test_registry() -> HandlerRegistry {
    let mut builder = HandlerRegistry::builder();
    builder
        .register_command::<Ping, _, _>(|_, _| async { Ok(PingResult { pong: true }) })
        .unwrap()
        .register_command::<Echo, _, _>(|_, params| async move { Ok(params) })
        .unwrap()
        .register_command::<Delay, _, _>(|_, params| async move {
            tokio::time::sleep(Duration::from_millis(params.ms)).await;
            Ok(DelayResult { slept_ms: params.ms })
        })
        .unwrap()
        .register_command::<Fail, _, _>(|_, params| async move {
            Err(HandlerError::new(params.reason))
        })
        .unwrap();
    builder.build()
}

async fn start_server(config: RelayServerConfig) -> u16 {
    let (listener, port) = bind_tcp_listener_on_random_port().await.unwrap();
    let server = Arc::new(RelayServer::with_config(test_registry(), config));
    tokio::spawn(async move {
        let _ = server.serve_with_listener(listener).await;
    });
    port
}

/// Full caller -> relay -> sandbox -> relay -> caller roundtrips with typed
/// command definitions.
#[tokio::test]
async fn test_success_client_server_roundtrip() {
    let port = start_server(RelayServerConfig::default()).await;
    let client = RpcClient::new("127.0.0.1", port).await.unwrap();

    let (res1, res2, res3, res4) = join!(
        Ping::call(&client, NoParams::default()),
        Echo::call(
            &client,
            EchoParams {
                message: "testing 1 2 3".into()
            }
        ),
        Echo::call(
            &client,
            EchoParams {
                message: "testing 4 5 6".into()
            }
        ),
        Delay::call(&client, DelayParams { ms: 20 }),
    );

    assert_eq!(res1.unwrap(), PingResult { pong: true });
    assert_eq!(res2.unwrap().message, "testing 1 2 3");
    assert_eq!(res3.unwrap().message, "testing 4 5 6");
    assert_eq!(res4.unwrap(), DelayResult { slept_ms: 20 });
    assert_eq!(client.pending_count(), 0);
}

#[tokio::test]
async fn test_error_client_server_roundtrip() {
    let port = start_server(RelayServerConfig::default()).await;
    let client = RpcClient::new("127.0.0.1", port).await.unwrap();

    let err = Fail::call(
        &client,
        FailParams {
            reason: "no selection".into(),
        },
    )
    .await
    .unwrap_err();
    match err {
        RpcCallerError::Remote(error) => {
            assert_eq!(error.code, ErrorCode::ExecutionError.code());
            assert_eq!(error.message, "no selection");
        }
        other => panic!("expected a remote error, got {other:?}"),
    }

    let err = client.call("nonexistent", RpcParams::new()).await.unwrap_err();
    assert_eq!(err.error_code(), Some(ErrorCode::MethodNotFound));

    let err = client.call("echo", RpcParams::new()).await.unwrap_err();
    assert_eq!(err.error_code(), Some(ErrorCode::InvalidParams));
}

#[tokio::test]
async fn test_raw_request_returns_correlated_response() {
    let port = start_server(RelayServerConfig::default()).await;
    let client = RpcClient::new("127.0.0.1", port).await.unwrap();

    let response = client
        .request(RpcRequest::new("1", "ping", RpcParams::new()))
        .await
        .unwrap();
    assert_eq!(response.id, "1");
    assert_eq!(response.result(), Some(&json!({ "pong": true })));
    assert!(response.error().is_none());
}

#[tokio::test]
async fn test_duplicate_id_rejected_locally() {
    let port = start_server(RelayServerConfig::default()).await;
    let client = RpcClient::new("127.0.0.1", port).await.unwrap();

    let mut params = RpcParams::new();
    params.insert("ms".into(), json!(150));

    let (first, second) = join!(
        client.call_with_id("4".into(), "delay", params.clone()),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            client.call_with_id("4".into(), "delay", params.clone()).await
        }
    );

    assert_eq!(first.unwrap(), json!({ "sleptMs": 150 }));
    assert_eq!(
        second.unwrap_err().error_code(),
        Some(ErrorCode::DuplicateRequestId)
    );
}

#[tokio::test]
async fn test_client_side_timeout() {
    let port = start_server(RelayServerConfig::default()).await;
    let client = RpcClient::with_config(
        "127.0.0.1",
        port,
        RpcClientConfig {
            request_timeout: Duration::from_millis(100),
            timeout_sweep_interval: Duration::from_millis(10),
            ..RpcClientConfig::default()
        },
    )
    .await
    .unwrap();

    let err = Delay::call(&client, DelayParams { ms: 1_000 })
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), Some(ErrorCode::Timeout));
    assert!(err.error_code().unwrap().is_retryable());

    // The connection is still usable afterwards.
    assert!(client.is_connected());
    assert_eq!(
        Ping::call(&client, NoParams::default()).await.unwrap(),
        PingResult { pong: true }
    );
}

#[tokio::test]
async fn test_relay_side_timeout_reaches_client() {
    let port = start_server(RelayServerConfig {
        relay: RelayConfig {
            request_timeout: Duration::from_millis(100),
            timeout_sweep_interval: Duration::from_millis(10),
            ..RelayConfig::default()
        },
        ..RelayServerConfig::default()
    })
    .await;
    let client = RpcClient::new("127.0.0.1", port).await.unwrap();

    let err = Delay::call(&client, DelayParams { ms: 1_000 })
        .await
        .unwrap_err();
    match err {
        RpcCallerError::Remote(error) => {
            assert_eq!(error.error_code(), Some(ErrorCode::Timeout));
            assert_eq!(error.data, Some(json!({ "timeoutMs": 100 })));
        }
        other => panic!("expected a remote timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_methods() {
    let port = start_server(RelayServerConfig::default()).await;
    let client = RpcClient::new("127.0.0.1", port).await.unwrap();

    let listing = client
        .call("system.listMethods", RpcParams::new())
        .await
        .unwrap();
    assert_eq!(listing, json!({ "methods": ["delay", "echo", "fail", "ping"] }));
}

#[tokio::test]
async fn test_many_concurrent_calls_are_correlated() {
    let port = start_server(RelayServerConfig::default()).await;
    let client = RpcClient::new("127.0.0.1", port).await.unwrap();

    let calls = (0..50).map(|i| {
        let client = &client;
        async move {
            let echoed = Echo::call(
                client,
                EchoParams {
                    message: format!("message {i}"),
                },
            )
            .await
            .unwrap();
            assert_eq!(echoed.message, format!("message {i}"));
        }
    });
    futures_util::future::join_all(calls).await;
    assert_eq!(client.pending_count(), 0);
}
