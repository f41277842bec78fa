use cmdbridge::envelope::BridgeMessage;
use tokio::sync::mpsc;

/// One end of the intra-process bridge: an ordered outbound queue and an
/// ordered inbound queue.
pub struct BridgePort {
    pub sender: mpsc::Sender<BridgeMessage>,
    pub receiver: mpsc::Receiver<BridgeMessage>,
}

/// Creates the two connected ends of a bridge.
///
/// Whatever one port sends, the other receives, in order. Both queues are
/// bounded by `buffer` messages.
pub fn bridge_pair(buffer: usize) -> (BridgePort, BridgePort) {
    let (relay_tx, sandbox_rx) = mpsc::channel(buffer);
    let (sandbox_tx, relay_rx) = mpsc::channel(buffer);

    (
        BridgePort {
            sender: relay_tx,
            receiver: relay_rx,
        },
        BridgePort {
            sender: sandbox_tx,
            receiver: sandbox_rx,
        },
    )
}
