//! In-process endpoint pair.
//!
//! [`MemoryEndpoint::pair`] returns two endpoints wired back to back:
//! whatever one side posts, subscribers of the other side receive, in
//! order. This is the reference transport for tests and for bridging
//! two components inside one process; network adapters live outside
//! the core and only have to honour the [`Endpoint`] contract.

use crate::endpoint::{Endpoint, MessageStream, ENDPOINT_BUFFER};
use crate::error::TransportError;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

/// One side of an in-process endpoint pair.
///
/// Messages posted before the peer subscribes are dropped, matching
/// the bridge's tolerance for early traffic: nothing is pending yet,
/// so nothing is lost that anyone waits for.
///
/// # Example
///
/// ```
/// use tether_transport::MemoryEndpoint;
/// use serde_json::json;
///
/// let (near, far) = MemoryEndpoint::pair();
/// let _incoming = far.subscribe();
/// near.post(json!({"id": 1, "type": "await", "keyChain": []})).unwrap();
/// ```
pub struct MemoryEndpoint {
    /// Delivers to the peer's subscribers.
    outgoing: broadcast::Sender<Value>,
    /// This side's subscribers hang off this sender.
    incoming: broadcast::Sender<Value>,
}

impl MemoryEndpoint {
    /// Creates two endpoints wired back to back.
    #[must_use]
    pub fn pair() -> (Arc<dyn Endpoint>, Arc<dyn Endpoint>) {
        let (near_tx, _) = broadcast::channel(ENDPOINT_BUFFER);
        let (far_tx, _) = broadcast::channel(ENDPOINT_BUFFER);
        let near = Arc::new(Self {
            outgoing: far_tx.clone(),
            incoming: near_tx.clone(),
        });
        let far = Arc::new(Self {
            outgoing: near_tx,
            incoming: far_tx,
        });
        (near, far)
    }
}

impl Endpoint for MemoryEndpoint {
    fn post(&self, message: Value) -> Result<(), TransportError> {
        // A send with no live subscriber only means nobody is listening
        // yet; the message is dropped, not an error.
        let _ = self.outgoing.send(message);
        Ok(())
    }

    fn subscribe(&self) -> MessageStream {
        MessageStream::new(self.incoming.subscribe())
    }
}

impl std::fmt::Debug for MemoryEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEndpoint").finish_non_exhaustive()
    }
}
