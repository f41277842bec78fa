use crate::BridgePort;
use cmdbridge::dispatch::RpcDispatcher;
use cmdbridge::envelope::{BridgeMessage, RpcResponse};
use cmdbridge::error::RpcError;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::collections::HashSet;
use tokio::task::JoinHandle;

/// The sandboxed side of the bridge.
///
/// A single task runs a cooperative loop: it keeps accepting `execute-command`
/// messages while earlier handlers are suspended, and emits one
/// `command-result` per accepted request as each one finishes. A request id
/// that is already executing is answered with a duplicate-id error instead
/// of running its handler a second time.
pub struct SandboxHost {
    dispatcher: RpcDispatcher,
    client_id: String,
}

impl SandboxHost {
    pub fn new(dispatcher: RpcDispatcher, client_id: impl Into<String>) -> Self {
        Self {
            dispatcher,
            client_id: client_id.into(),
        }
    }

    pub fn spawn(self, port: BridgePort) -> JoinHandle<()> {
        tokio::spawn(self.run(port))
    }

    /// Runs until the inbound queue is closed and every accepted request has
    /// been answered, or until the relay stops listening.
    pub async fn run(self, port: BridgePort) {
        let BridgePort {
            sender,
            mut receiver,
        } = port;

        let mut executing: HashSet<String> = HashSet::new();
        let mut in_flight = FuturesUnordered::new();
        let mut inbound_open = true;

        loop {
            tokio::select! {
                message = receiver.recv(), if inbound_open => match message {
                    Some(BridgeMessage::ExecuteCommand(request)) => {
                        if executing.insert(request.id.clone()) {
                            let dispatcher = self.dispatcher.clone();
                            let client_id = self.client_id.clone();
                            in_flight.push(async move {
                                dispatcher.dispatch(request, &client_id).await
                            });
                        } else {
                            tracing::warn!("Request {} is already executing.", request.id);
                            let error = RpcError::DuplicateRequestId(request.id.clone());
                            let response = RpcResponse::from_error(request.id, &error);
                            if sender.send(BridgeMessage::CommandResult(response)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(BridgeMessage::CommandResult(response)) => {
                        tracing::warn!("Ignoring command-result {} sent to the sandbox.", response.id);
                    }
                    None => {
                        inbound_open = false;
                    }
                },

                Some(response) = in_flight.next(), if !in_flight.is_empty() => {
                    executing.remove(&response.id);
                    if sender.send(BridgeMessage::CommandResult(response)).await.is_err() {
                        tracing::info!("Relay for {} stopped listening.", self.client_id);
                        break;
                    }
                }

                else => break,
            }
        }

        tracing::debug!("Sandbox host for {} terminated.", self.client_id);
    }
}
