use crate::{BridgePort, RelayConfig};
use cmdbridge::caller::CommandCaller;
use cmdbridge::envelope::{BridgeMessage, RpcRequest, RpcResponse};
use cmdbridge::error::{RpcCallerError, RpcError};
use cmdbridge::relay::{ConnectionState, PendingCall, PendingRequestTable};
use std::sync::Arc;
use std::time::Instant;
use tokio::{
    sync::{Mutex, mpsc, watch},
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

struct RelayShared {
    to_sandbox: mpsc::Sender<BridgeMessage>,
    pending: Mutex<PendingRequestTable>,
    state: watch::Sender<ConnectionState>,
}

impl RelayShared {
    async fn on_response(&self, response: RpcResponse) -> bool {
        self.pending.lock().await.complete(response)
    }

    async fn on_channel_closed(&self) -> usize {
        let previous = self.state.send_replace(ConnectionState::Disconnected);
        let drained = self.pending.lock().await.drain_connection_closed();
        if previous.is_connected() {
            tracing::info!(
                "Relay channel closed; failed {} pending request(s).",
                drained.len()
            );
        }
        drained.len()
    }

    async fn expire_overdue(&self) -> usize {
        self.pending
            .lock()
            .await
            .expire_overdue(Instant::now())
            .len()
    }
}

/// The intermediate hop between a network caller and the sandboxed executor.
///
/// Requests are forwarded as `execute-command` bridge messages; the matching
/// `command-result` messages are correlated back through the pending-request
/// table by id. Two background tasks run for the lifetime of the channel: one
/// reads the return path, the other expires overdue requests. Both are
/// aborted when the channel is dropped, which in turn closes the sandbox's
/// inbound queue.
pub struct RelayChannel {
    shared: Arc<RelayShared>,
    return_task: JoinHandle<()>,
    sweeper_task: JoinHandle<()>,
}

impl RelayChannel {
    /// Starts relaying over `port`. Must be called from within a tokio runtime.
    pub fn connect(port: BridgePort, config: RelayConfig) -> Self {
        let BridgePort {
            sender,
            mut receiver,
        } = port;

        let (state, _) = watch::channel(ConnectionState::Connected);
        let shared = Arc::new(RelayShared {
            to_sandbox: sender,
            pending: Mutex::new(PendingRequestTable::new(
                config.max_pending_requests,
                config.request_timeout,
            )),
            state,
        });

        let return_task = tokio::spawn({
            let shared = shared.clone();
            async move {
                while let Some(message) = receiver.recv().await {
                    match message {
                        BridgeMessage::CommandResult(response) => {
                            shared.on_response(response).await;
                        }
                        BridgeMessage::ExecuteCommand(request) => {
                            tracing::warn!(
                                "Ignoring execute-command {} received on the return path.",
                                request.id
                            );
                        }
                    }
                }
                shared.on_channel_closed().await;
            }
        });

        let sweeper_task = tokio::spawn({
            let shared = shared.clone();
            let mut ticker = interval(config.timeout_sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            async move {
                loop {
                    ticker.tick().await;
                    if !shared.state.borrow().is_connected() {
                        break;
                    }
                    shared.expire_overdue().await;
                }
            }
        });

        Self {
            shared,
            return_task,
            sweeper_task,
        }
    }

    /// Registers `request` as pending and hands it to the sandbox.
    ///
    /// Rejections happen before anything is forwarded: a request whose id is
    /// still pending (or timed out with its result outstanding), a request on
    /// a closed channel, and a request past the pending bound all fail
    /// immediately and leave the table as it was.
    pub async fn forward(&self, request: RpcRequest) -> Result<PendingCall, RpcError> {
        if !self.state().is_connected() {
            return Err(RpcError::ConnectionClosed);
        }

        // Also refused here if the channel closed since the check above; the
        // drain and this insert share the table lock.
        let pending = self
            .shared
            .pending
            .lock()
            .await
            .insert(&request.id, &request.method)?;

        let id = request.id.clone();
        if self
            .shared
            .to_sandbox
            .send(BridgeMessage::ExecuteCommand(request))
            .await
            .is_err()
        {
            tracing::warn!("Sandbox is gone; could not forward request {}.", id);
            self.shared.pending.lock().await.fail(&id, &RpcError::ConnectionClosed);
            self.shared.on_channel_closed().await;
            return Err(RpcError::ConnectionClosed);
        }

        Ok(pending)
    }

    /// Forwards `request` and waits for its terminal response.
    ///
    /// Immediate rejections are turned into an error response for the same
    /// id, so the caller always gets exactly one response back.
    pub async fn round_trip(&self, request: RpcRequest) -> RpcResponse {
        let id = request.id.clone();
        match self.forward(request).await {
            Ok(pending) => pending.wait().await,
            Err(err) => RpcResponse::from_error(id, &err),
        }
    }

    /// Delivers a response from the sandbox. Returns `false` if it was stale.
    pub async fn on_response(&self, response: RpcResponse) -> bool {
        self.shared.on_response(response).await
    }

    /// Marks the channel disconnected and fails every pending request with a
    /// connection-closed error. Returns how many were failed.
    pub async fn on_channel_closed(&self) -> usize {
        self.shared.on_channel_closed().await
    }

    /// Fails every request past its deadline with a timeout error.
    pub async fn expire_overdue(&self) -> usize {
        self.shared.expire_overdue().await
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    pub async fn pending_count(&self) -> usize {
        self.shared.pending.lock().await.len()
    }
}

#[async_trait::async_trait]
impl CommandCaller for RelayChannel {
    async fn request(&self, request: RpcRequest) -> Result<RpcResponse, RpcCallerError> {
        let pending = self.forward(request).await?;
        Ok(pending.wait().await)
    }
}

impl Drop for RelayChannel {
    fn drop(&mut self) {
        self.return_task.abort();
        self.sweeper_task.abort();
    }
}
