//! Note: This `RelayServer` does not include authentication, authorization or
//! transport security. It is meant for a trusted local link between a caller
//! and the UI context that hosts the sandbox bridge.

use crate::RelayServerConfig;
use axum::{
    Router,
    extract::ConnectInfo,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use cmdbridge::constants::SYSTEM_LIST_METHODS;
use cmdbridge::dispatch::{HandlerRegistry, RpcDispatcher};
use cmdbridge::envelope::{RpcRequest, RpcResponse};
use cmdbridge::error::RpcError;
use cmdbridge::utils::next_client_id;
use cmdbridge_relay::{RelayChannel, SandboxHost, bridge_pair};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{
    net::{TcpListener, ToSocketAddrs},
    sync::mpsc,
    time::{Instant, MissedTickBehavior, interval},
};

/// Relays WebSocket callers into a sandboxed executor.
///
/// Every accepted socket gets its own client id, its own relay channel (and
/// therefore its own pending-request table) and its own sandbox host task.
/// All of them share one frozen handler registry.
pub struct RelayServer {
    dispatcher: RpcDispatcher,
    config: RelayServerConfig,
}

impl RelayServer {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self::with_config(registry, RelayServerConfig::default())
    }

    pub fn with_config(registry: HandlerRegistry, config: RelayServerConfig) -> Self {
        RelayServer {
            dispatcher: RpcDispatcher::new(Arc::new(registry)),
            config,
        }
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        self.dispatcher.registry()
    }

    /// Binds to an address and starts the relay server.
    pub async fn serve<A: ToSocketAddrs>(self, addr: A) -> Result<SocketAddr, axum::BoxError> {
        let listener = TcpListener::bind(addr).await?;
        Arc::new(self).serve_with_listener(listener).await
    }

    /// Starts the relay server on a specific host and port.
    pub async fn serve_on(self, host: &str, port: u16) -> Result<SocketAddr, axum::BoxError> {
        self.serve(format!("{host}:{port}")).await
    }

    /// Starts the relay server with a pre-bound `TcpListener`.
    ///
    /// This is useful for binding to an ephemeral port (port 0) and reading
    /// the actual address back before serving.
    pub async fn serve_with_listener(
        self: Arc<Self>,
        listener: TcpListener,
    ) -> Result<SocketAddr, axum::BoxError> {
        let address = listener.local_addr()?;
        let app = Router::new().route(
            "/ws",
            get({
                let server = self.clone();
                move |ws, conn| Self::ws_handler(ws, conn, server)
            }),
        );
        tracing::info!(
            "Relay server running on {:?} with {} handler(s)",
            address,
            self.registry().len()
        );
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(address)
    }

    async fn ws_handler(
        ws: WebSocketUpgrade,
        ConnectInfo(addr): ConnectInfo<SocketAddr>,
        server: Arc<RelayServer>,
    ) -> impl IntoResponse {
        tracing::info!("Client connected: {}", addr);
        ws.on_upgrade(move |socket| server.handle_socket(socket, addr))
    }

    /// Builds the per-connection bridge and spawns the tasks that serve it.
    async fn handle_socket(self: Arc<Self>, socket: WebSocket, addr: SocketAddr) {
        let client_id = next_client_id();
        let (sender, receiver) = socket.split();
        let (tx, rx) = mpsc::unbounded_channel::<Message>();

        let (relay_port, sandbox_port) = bridge_pair(self.config.relay.bridge_buffer_size);
        SandboxHost::new(self.dispatcher.clone(), client_id.clone()).spawn(sandbox_port);
        let relay = RelayChannel::connect(relay_port, self.config.relay.clone());

        tracing::debug!("Assigned {} to {}", client_id, addr);

        tokio::spawn(Self::sender_task(sender, rx));
        tokio::spawn(self.receiver_task(relay, receiver, tx, addr));
    }

    /// Writes queued frames (responses and pings) to the socket.
    async fn sender_task(
        mut sender: SplitSink<WebSocket, Message>,
        mut rx: mpsc::UnboundedReceiver<Message>,
    ) {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break; // Exit if the client has disconnected.
            }
        }
    }

    /// Handles all inbound traffic from one client.
    ///
    /// - Sends a Ping every heartbeat interval.
    /// - Disconnects clients that stay silent (no frames, no Pongs) past the
    ///   client timeout.
    /// - Forwards request frames through the relay channel. Each accepted
    ///   request is awaited on its own task, so a slow handler never holds up
    ///   acceptance of the next frame.
    async fn receiver_task(
        self: Arc<Self>,
        relay: RelayChannel,
        mut receiver: SplitStream<WebSocket>,
        tx: mpsc::UnboundedSender<Message>,
        addr: SocketAddr,
    ) {
        let mut heartbeat = interval(self.config.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        heartbeat.tick().await;
        let mut last_seen = Instant::now();

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if last_seen.elapsed() > self.config.client_timeout {
                        tracing::warn!("Client {} timed out. Closing connection.", addr);
                        break;
                    }
                    if tx.send(Message::Ping(Vec::new().into())).is_err() {
                        tracing::info!("Client {} disconnected (failed to send ping).", addr);
                        break;
                    }
                }

                msg = receiver.next() => {
                    last_seen = Instant::now();
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_frame(&relay, text.as_str(), &tx).await;
                        }
                        Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                            Ok(text) => self.handle_frame(&relay, text, &tx).await,
                            Err(_) => {
                                let err = RpcError::Parse("binary frame is not UTF-8".into());
                                send_response(&tx, &RpcResponse::from_error("", &err));
                            }
                        },
                        Some(Ok(Message::Pong(_))) => {
                            tracing::trace!("Received pong from {}", addr);
                        }
                        Some(Ok(Message::Ping(_))) => {}
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!("Client {} initiated close.", addr);
                            break;
                        }
                        None | Some(Err(_)) => {
                            tracing::info!("Client {} disconnected.", addr);
                            break;
                        }
                    }
                }
            }
        }

        let abandoned = relay.on_channel_closed().await;
        if abandoned > 0 {
            tracing::warn!("{} request(s) from {} were still pending.", abandoned, addr);
        }
        tracing::info!("Terminated connection for {}.", addr);
    }

    /// Answers one request frame.
    ///
    /// Frames that do not parse are answered here. The capability listing is
    /// answered here too, without crossing into the sandbox. Everything else
    /// is forwarded; duplicate ids and overflow are rejected by the relay
    /// before anything is sent on.
    async fn handle_frame(
        &self,
        relay: &RelayChannel,
        text: &str,
        tx: &mpsc::UnboundedSender<Message>,
    ) {
        let request = match RpcRequest::from_json_str(text) {
            Ok(request) => request,
            Err(err) => {
                let id = err.request_id().unwrap_or_default().to_string();
                send_response(tx, &RpcResponse::from_error(id, &err));
                return;
            }
        };

        if request.method == SYSTEM_LIST_METHODS {
            let methods = self.registry().list();
            send_response(
                tx,
                &RpcResponse::success(request.id, serde_json::json!({ "methods": methods })),
            );
            return;
        }

        let id = request.id.clone();
        match relay.forward(request).await {
            Ok(pending) => {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let response = pending.wait().await;
                    send_response(&tx, &response);
                });
            }
            Err(err) => {
                tracing::debug!("Rejected request {}: {}", id, err);
                send_response(tx, &RpcResponse::from_error(id, &err));
            }
        }
    }
}

fn send_response(tx: &mpsc::UnboundedSender<Message>, response: &RpcResponse) {
    match response.to_json_string() {
        Ok(text) => {
            // The sender task is gone once the client disconnects.
            let _ = tx.send(Message::Text(text.into()));
        }
        Err(err) => {
            tracing::error!("Failed to encode response {}: {}", response.id, err);
        }
    }
}
