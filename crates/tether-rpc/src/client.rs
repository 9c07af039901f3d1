//! The client half of a bridge session.
//!
//! [`wrap`] subscribes a listener on the endpoint and returns the root
//! [`Remote`]. The listener matches `response`/`error` messages by id
//! against the session's pending table; sub-channel traffic and
//! request messages on the same stream belong to other sessions or to
//! a dispatcher sharing the endpoint, and are ignored.
//!
//! The session lives as long as any proxy or in-flight operation
//! refers to it. The listener holds only a weak reference, so a
//! session whose proxies are all gone does not keep itself alive
//! through its own task.

use crate::codec::decode;
use crate::error::RpcError;
use crate::payload::Payload;
use crate::pending::PendingTable;
use crate::remote::Remote;
use std::sync::{Arc, Weak};
use tether_transport::{is_channel_tagged, Endpoint, MessageStream};
use tether_types::{IdAllocator, WireId};
use tether_wire::Message;
use tracing::{debug, warn};

/// Obtains a proxy for the value exposed on the peer of `endpoint`.
///
/// Property access on the returned [`Remote`] is free and local; only
/// terminal operations (`call`, `construct`, awaiting) put messages on
/// the wire. Must be called within a tokio runtime.
///
/// # Example
///
/// ```no_run
/// use tether_rpc::{expose, wrap, Payload};
/// use tether_transport::MemoryEndpoint;
///
/// # async fn demo() -> Result<(), tether_rpc::RpcError> {
/// let (near, far) = MemoryEndpoint::pair();
/// expose(Payload::object([("answer", Payload::from(42i64))]), far);
///
/// let root = wrap(near);
/// let answer = root.get("answer").resolve().await?;
/// assert_eq!(answer.as_i64(), Some(42));
/// # Ok(())
/// # }
/// ```
pub fn wrap(endpoint: Arc<dyn Endpoint>) -> Remote {
    let stream = endpoint.subscribe();
    let session = Arc::new(ClientSession {
        endpoint,
        pending: PendingTable::new(),
        ids: IdAllocator::new(),
    });
    tokio::spawn(listen(Arc::downgrade(&session), stream));
    Remote::root(session)
}

/// Shared state of one `wrap` call.
pub(crate) struct ClientSession {
    endpoint: Arc<dyn Endpoint>,
    pending: PendingTable,
    ids: IdAllocator,
}

impl ClientSession {
    pub(crate) fn endpoint(&self) -> &Arc<dyn Endpoint> {
        &self.endpoint
    }

    pub(crate) fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Issues one request and awaits its terminal outcome.
    ///
    /// The request is registered before it is posted, so a reply can
    /// never race the registration. A failed post is logged and the
    /// request intentionally stays pending: a closed transport must
    /// not crash waiting callers, and the contract has no timeouts.
    pub(crate) async fn round_trip(
        self: &Arc<Self>,
        build: impl FnOnce(WireId) -> Message,
    ) -> Result<Payload, RpcError> {
        let id = self.ids.allocate();
        let message = build(id.clone());
        let raw =
            serde_json::to_value(&message).map_err(|err| RpcError::Protocol(err.to_string()))?;

        let waiter = self.pending.insert(id);
        if let Err(err) = self.endpoint.post(raw) {
            warn!(error = %err, "request could not be posted; it stays pending");
        }

        match waiter.await {
            Ok(Ok(data)) => Ok(decode(data, &self.endpoint)),
            Ok(Err(message)) => Err(RpcError::Remote(message)),
            Err(_) => Err(RpcError::SessionClosed),
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Listener task: routes replies to waiters until the endpoint closes
/// or the session is dropped.
async fn listen(session: Weak<ClientSession>, mut stream: MessageStream) {
    while let Some(raw) = stream.recv().await {
        let Some(session) = session.upgrade() else {
            return;
        };
        if is_channel_tagged(&raw) {
            // Sub-channel traffic; some other session's business.
            continue;
        }
        match serde_json::from_value::<Message>(raw) {
            Ok(Message::Response { id, data }) => {
                session.pending.complete(&id, Ok(data));
            }
            Ok(Message::Error { id, error }) => {
                session.pending.complete(&id, Err(error));
            }
            Ok(_) => {
                // Requests are handled by a dispatcher, if one shares
                // this endpoint.
            }
            Err(err) => {
                debug!(error = %err, "ignoring unparseable message on client stream");
            }
        }
    }
}
