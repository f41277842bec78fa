use clap::Parser;
use cmdbridge::caller::{CommandCall, CommandCaller};
use cmdbridge::constants::{DEFAULT_MAX_PENDING_REQUESTS, DEFAULT_REQUEST_TIMEOUT_MS};
use cmdbridge::envelope::RpcParams;
use cmdbridge_relay::RelayConfig;
use cmdbridge_tokio_client::RpcClient;
use cmdbridge_tokio_server::{RelayServer, RelayServerConfig, utils::tcp_listener_to_host_port};
use example_cmdbridge_command_definition::{
    CreateRectangle, CreateRectangleParams, Delay, DelayParams, Echo, EchoParams,
    GetDocumentInfo, NoParams, Ping,
};
use example_cmdbridge_ws_app::{InMemoryDocument, build_registry};
use std::sync::Arc;
use std::time::Duration;
use tokio::join;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cmdbridge-demo", about = "Runs a relay server and drives it with a demo client")]
struct Cli {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// 0 picks a free port.
    #[arg(long, default_value_t = 0)]
    port: u16,

    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
    request_timeout_ms: u64,

    #[arg(long, default_value_t = DEFAULT_MAX_PENDING_REQUESTS)]
    max_pending: usize,

    /// Keep serving after the demo calls instead of exiting.
    #[arg(long)]
    serve: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let listener = TcpListener::bind((cli.host.as_str(), cli.port)).await?;
    let (host, port) = tcp_listener_to_host_port(&listener)?;

    let document = Arc::new(InMemoryDocument::new("Demo"));
    let registry = build_registry(document.clone())?;

    let config = RelayServerConfig {
        relay: RelayConfig {
            request_timeout: Duration::from_millis(cli.request_timeout_ms),
            max_pending_requests: cli.max_pending,
            ..RelayConfig::default()
        },
        ..RelayServerConfig::default()
    };

    // Spawn the server using the pre-bound listener
    let server_task = tokio::spawn({
        let server = Arc::new(RelayServer::with_config(registry, config));
        async move {
            if let Err(err) = server.serve_with_listener(listener).await {
                tracing::error!("Relay server stopped: {}", err);
            }
        }
    });

    {
        let client = RpcClient::new(&host.to_string(), port).await?;
        client.set_state_change_handler(|state| {
            tracing::info!("Client transport state: {:?}", state);
        });

        let methods = client.call("system.listMethods", RpcParams::new()).await?;
        println!("Available methods: {methods}");

        // `join!` will await all responses before proceeding
        let (ping, echo, slow, rect) = join!(
            Ping::call(&client, NoParams::default()),
            Echo::call(
                &client,
                EchoParams {
                    message: "hello through two hops".into()
                }
            ),
            Delay::call(&client, DelayParams { ms: 50 }),
            CreateRectangle::call(
                &client,
                CreateRectangleParams {
                    x: 0.0,
                    y: 0.0,
                    width: 120.0,
                    height: 80.0,
                    name: None,
                }
            ),
        );

        println!("ping: {:?}", ping);
        println!("echo: {:?}", echo);
        println!("delay: {:?}", slow);
        println!("create_rectangle: {:?}", rect);

        let info = GetDocumentInfo::call(&client, NoParams::default()).await;
        println!("get_document_info: {:?}", info);

        let bad = client.call("echo", RpcParams::new()).await;
        println!("echo (no message): {:?}", bad);

        let missing = client.call("does_not_exist", RpcParams::new()).await;
        println!("does_not_exist: {:?}", missing);
    }

    if cli.serve {
        tracing::info!("Serving on ws://{}:{}/ws", host, port);
        server_task.await?;
    } else {
        server_task.abort();
    }

    Ok(())
}
