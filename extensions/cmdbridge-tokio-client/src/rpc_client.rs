use crate::RpcClientConfig;
use cmdbridge::caller::CommandCaller;
use cmdbridge::envelope::{RpcRequest, RpcResponse};
use cmdbridge::error::{RpcCallerError, RpcError};
use cmdbridge::relay::{ConnectionState, PendingRequestTable};
use futures_util::{SinkExt, StreamExt};
use std::io;
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};
use std::time::Instant;
use tokio::{
    sync::mpsc::{self, unbounded_channel},
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, protocol::Message as WsMessage},
};

type StateChangeHandler = Box<dyn Fn(ConnectionState) + Send + Sync>;

struct ClientShared {
    pending: Mutex<PendingRequestTable>,
    is_connected: AtomicBool,
    state_change_handler: Mutex<Option<StateChangeHandler>>,
}

impl ClientShared {
    fn pending(&self) -> MutexGuard<'_, PendingRequestTable> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_frame(&self, text: &str) {
        match RpcResponse::from_json_str(text) {
            Ok(response) => {
                self.pending().complete(response);
            }
            Err(err) => {
                tracing::warn!("Dropping undecodable response frame: {}", err);
            }
        }
    }

    /// Fails everything still pending and reports the disconnect, once.
    fn shutdown(&self) {
        if !self.is_connected.swap(false, Ordering::SeqCst) {
            return;
        }
        let drained = self.pending().drain_connection_closed();
        tracing::info!(
            "Connection closed; failed {} pending request(s).",
            drained.len()
        );
        let handler = self
            .state_change_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handler) = handler.as_ref() {
            handler(ConnectionState::Disconnected);
        }
    }
}

/// A WebSocket caller for a relay server.
///
/// Every call is registered in a local pending table before its frame is
/// written, so responses may arrive in any order. Losing the socket fails all
/// outstanding calls with a connection-closed error.
pub struct RpcClient {
    shared: Arc<ClientShared>,
    tx: mpsc::UnboundedSender<WsMessage>,
    task_handles: Vec<JoinHandle<()>>,
}

impl RpcClient {
    pub async fn new(host: &str, port: u16) -> io::Result<RpcClient> {
        Self::with_config(host, port, RpcClientConfig::default()).await
    }

    pub async fn with_config(
        host: &str,
        port: u16,
        config: RpcClientConfig,
    ) -> io::Result<RpcClient> {
        let websocket_url = format!("ws://{host}:{port}/ws");
        let (ws_stream, _) = connect_async(websocket_url.as_str())
            .await
            .map_err(|err| match err {
                WsError::Io(io_err) => io_err,
                other => io::Error::other(other),
            })?;
        tracing::debug!("Connected to {}", websocket_url);

        let (mut sender, mut receiver) = ws_stream.split();
        let (tx, mut rx) = unbounded_channel::<WsMessage>();

        let shared = Arc::new(ClientShared {
            pending: Mutex::new(PendingRequestTable::new(
                config.max_pending_requests,
                config.request_timeout,
            )),
            is_connected: AtomicBool::new(true),
            state_change_handler: Mutex::new(None),
        });

        let mut task_handles = Vec::new();

        // Receive loop
        task_handles.push(tokio::spawn({
            let shared = shared.clone();
            let tx = tx.clone();
            async move {
                while let Some(msg) = receiver.next().await {
                    match msg {
                        Ok(WsMessage::Text(text)) => shared.on_frame(text.as_str()),
                        Ok(WsMessage::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                            Ok(text) => shared.on_frame(text),
                            Err(_) => tracing::warn!("Dropping non-UTF-8 binary frame."),
                        },
                        Ok(WsMessage::Ping(payload)) => {
                            let _ = tx.send(WsMessage::Pong(payload));
                        }
                        Ok(WsMessage::Close(_)) => break,
                        Ok(_) => {}
                        Err(err) => {
                            tracing::debug!("WebSocket receive error: {}", err);
                            break;
                        }
                    }
                }
                shared.shutdown();
            }
        }));

        // Send loop
        task_handles.push(tokio::spawn({
            let shared = shared.clone();
            async move {
                while let Some(msg) = rx.recv().await {
                    if sender.send(msg).await.is_err() {
                        break;
                    }
                }
                shared.shutdown();
            }
        }));

        // Deadline sweeper
        task_handles.push(tokio::spawn({
            let shared = shared.clone();
            let mut ticker = interval(config.timeout_sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            async move {
                loop {
                    ticker.tick().await;
                    if !shared.is_connected.load(Ordering::SeqCst) {
                        break;
                    }
                    let expired = shared.pending().expire_overdue(Instant::now());
                    if !expired.is_empty() {
                        tracing::debug!("Timed out request(s): {:?}", expired);
                    }
                }
            }
        }));

        Ok(RpcClient {
            shared,
            tx,
            task_handles,
        })
    }

    /// Registers a callback for connection state changes.
    ///
    /// If the client is already connected the callback fires immediately with
    /// `Connected`; it fires with `Disconnected` exactly once, when the
    /// connection is lost or the client is dropped.
    pub fn set_state_change_handler(
        &self,
        handler: impl Fn(ConnectionState) + Send + Sync + 'static,
    ) {
        let mut slot = self
            .shared
            .state_change_handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_connected() {
            handler(ConnectionState::Connected);
        }
        *slot = Some(Box::new(handler));
    }

    pub fn is_connected(&self) -> bool {
        self.shared.is_connected.load(Ordering::SeqCst)
    }

    pub fn pending_count(&self) -> usize {
        self.shared.pending().len()
    }
}

#[async_trait::async_trait]
impl CommandCaller for RpcClient {
    async fn request(&self, request: RpcRequest) -> Result<RpcResponse, RpcCallerError> {
        if !self.is_connected() {
            return Err(RpcError::ConnectionClosed.into());
        }

        let text = request.to_json_string().map_err(RpcCallerError::Codec)?;
        // Fails with connection-closed if `shutdown` drained the table since
        // the check above.
        let pending = self.shared.pending().insert(&request.id, &request.method)?;

        if self.tx.send(WsMessage::Text(text.into())).is_err() {
            self.shared
                .pending()
                .fail(&request.id, &RpcError::ConnectionClosed);
        }

        Ok(pending.wait().await)
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        for handle in &self.task_handles {
            handle.abort();
        }
        self.shared.shutdown();
    }
}
