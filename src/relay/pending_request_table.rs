use crate::envelope::RpcResponse;
use crate::error::RpcError;
use futures::channel::oneshot;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

struct PendingEntry {
    method: String,
    deadline: Instant,
    responder: oneshot::Sender<RpcResponse>,
}

impl PendingEntry {
    fn resolve(self, response: RpcResponse) {
        // The waiting side may have given up already; nothing to do then.
        let _ = self.responder.send(response);
    }
}

/// Outstanding requests on one channel, keyed by request id.
///
/// Each entry leaves the table exactly once: when its response arrives, when
/// its deadline passes, or when the channel goes away. The table is plain
/// data; the owner decides how it is shared.
///
/// An id whose deadline passed stays reserved until the executor's late
/// result for it shows up (and is dropped), or until the table is closed.
/// Until then the id cannot be reused, so the late result can never be
/// matched to a newer request.
pub struct PendingRequestTable {
    entries: HashMap<String, PendingEntry>,
    expired: HashSet<String>,
    closed: bool,
    max_pending: usize,
    request_timeout: Duration,
}

impl PendingRequestTable {
    pub fn new(max_pending: usize, request_timeout: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            expired: HashSet::new(),
            closed: false,
            max_pending,
            request_timeout,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn max_pending(&self) -> usize {
        self.max_pending
    }

    pub fn insert(&mut self, id: &str, method: &str) -> Result<PendingCall, RpcError> {
        self.insert_at(id, method, Instant::now())
    }

    /// Registers `id` as outstanding, accepted at `now`.
    ///
    /// An id that is already pending, or timed out with its result still
    /// outstanding, is refused without touching the table. Once the table is
    /// closed every insert fails with a connection-closed error.
    pub fn insert_at(
        &mut self,
        id: &str,
        method: &str,
        now: Instant,
    ) -> Result<PendingCall, RpcError> {
        if self.closed {
            return Err(RpcError::ConnectionClosed);
        }
        if self.entries.contains_key(id) || self.expired.contains(id) {
            return Err(RpcError::DuplicateRequestId(id.to_string()));
        }
        // Timed-out requests are still running on the executor.
        if self.entries.len() + self.expired.len() >= self.max_pending {
            return Err(RpcError::Overloaded {
                limit: self.max_pending,
            });
        }

        let (responder, receiver) = oneshot::channel();
        self.entries.insert(
            id.to_string(),
            PendingEntry {
                method: method.to_string(),
                deadline: now + self.request_timeout,
                responder,
            },
        );

        Ok(PendingCall {
            id: id.to_string(),
            receiver,
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Hands `response` to whoever is waiting on its id.
    ///
    /// Returns `false` for a response nobody is waiting on (already timed out,
    /// already answered, or never sent); such responses are dropped. A late
    /// result for a timed-out id also releases that id for reuse.
    pub fn complete(&mut self, response: RpcResponse) -> bool {
        match self.entries.remove(&response.id) {
            Some(entry) => {
                tracing::trace!("Completed request {} ({})", response.id, entry.method);
                entry.resolve(response);
                true
            }
            None => {
                if self.expired.remove(&response.id) {
                    tracing::warn!(
                        "Dropping late response for timed-out request {:?}",
                        response.id
                    );
                } else {
                    tracing::warn!("Dropping response for unknown request id {:?}", response.id);
                }
                false
            }
        }
    }

    /// Removes `id` and resolves it with `error`.
    pub fn fail(&mut self, id: &str, error: &RpcError) -> bool {
        match self.entries.remove(id) {
            Some(entry) => {
                entry.resolve(RpcResponse::from_error(id, error));
                true
            }
            None => false,
        }
    }

    /// Resolves every entry whose deadline is at or before `now` with a
    /// timeout error and reserves its id until the late result arrives.
    /// Returns the expired ids.
    pub fn expire_overdue(&mut self, now: Instant) -> Vec<String> {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();

        let error = RpcError::Timeout(self.request_timeout);
        for id in &expired {
            if let Some(entry) = self.entries.remove(id) {
                tracing::warn!("Request {} ({}) timed out", id, entry.method);
                entry.resolve(RpcResponse::from_error(id.as_str(), &error));
                self.expired.insert(id.clone());
            }
        }

        expired
    }

    /// Resolves every entry with a connection-closed error, empties the
    /// table and closes it to further inserts. Returns the drained ids.
    pub fn drain_connection_closed(&mut self) -> Vec<String> {
        self.closed = true;
        self.expired.clear();
        let error = RpcError::ConnectionClosed;
        self.entries
            .drain()
            .map(|(id, entry)| {
                entry.resolve(RpcResponse::from_error(id.as_str(), &error));
                id
            })
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether `id` timed out and its late result has not arrived yet.
    pub fn is_awaiting_late_result(&self, id: &str) -> bool {
        self.expired.contains(id)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.values().map(|entry| entry.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The waiting half of a pending entry.
pub struct PendingCall {
    id: String,
    receiver: oneshot::Receiver<RpcResponse>,
}

impl PendingCall {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resolves once the entry leaves the table.
    ///
    /// If the table itself is dropped with the entry still inside, this
    /// yields a connection-closed error rather than hanging.
    pub async fn wait(self) -> RpcResponse {
        match self.receiver.await {
            Ok(response) => response,
            Err(oneshot::Canceled) => RpcResponse::from_error(self.id, &RpcError::ConnectionClosed),
        }
    }
}
