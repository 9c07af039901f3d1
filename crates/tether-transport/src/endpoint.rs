//! The endpoint contract.
//!
//! An [`Endpoint`] is a bidirectional message port: post one
//! structured value, observe incoming values. Delivery is at most once
//! per subscriber and FIFO within one endpoint; nothing is assumed
//! across endpoints. Backpressure and framing are the transport's
//! concern, not the bridge's.
//!
//! Subscription is broadcast fan-out: every [`MessageStream`] obtained
//! from the same endpoint observes every incoming message. Sub-channel
//! filtering composes on top of the stream (see
//! [`create_channel`](crate::create_channel)) so derived endpoints
//! need no pump tasks of their own.

use crate::error::TransportError;
use serde_json::Value;
use tether_types::WireId;
use tokio::sync::broadcast;
use tracing::warn;

/// Field naming the logical channel of an envelope. Reserved: a value
/// carrying this field at top level belongs to a sub-channel, never to
/// the bare stream.
pub const CHANNEL_FIELD: &str = "channel";

/// Field carrying the payload of a sub-channel envelope. Reserved
/// together with [`CHANNEL_FIELD`].
pub const PAYLOAD_FIELD: &str = "payload";

/// Messages buffered per subscriber before the slowest one lags.
pub const ENDPOINT_BUFFER: usize = 64;

/// A duplex message port the bridge can run over.
///
/// Implementations must deliver each posted message at most once to
/// each live subscriber, in posting order. All subscribers within one
/// realm observe the same incoming messages.
pub trait Endpoint: Send + Sync {
    /// Posts one message towards the peer.
    ///
    /// # Errors
    ///
    /// [`TransportError`] if the transport cannot accept the message,
    /// for instance because it is closed.
    fn post(&self, message: Value) -> Result<(), TransportError>;

    /// Subscribes to incoming messages.
    ///
    /// Dropping the returned stream unsubscribes.
    fn subscribe(&self) -> MessageStream;
}

/// Returns `true` if `message` is sub-channel traffic.
///
/// The bare RPC stream ignores such messages; they belong to a derived
/// endpoint.
#[must_use]
pub fn is_channel_tagged(message: &Value) -> bool {
    message
        .as_object()
        .is_some_and(|object| object.contains_key(CHANNEL_FIELD))
}

/// Incoming message stream of an endpoint.
///
/// Carries the broadcast receiver plus the tag filter path accumulated
/// by derived sub-channels: a stream obtained from `(E/a)/b` filters
/// for `channel == a`, descends into the payload, filters for
/// `channel == b`, and surfaces the inner payload.
pub struct MessageStream {
    rx: broadcast::Receiver<Value>,
    filters: Vec<WireId>,
}

impl MessageStream {
    /// Wraps a raw broadcast receiver into an unfiltered stream.
    #[must_use]
    pub fn new(rx: broadcast::Receiver<Value>) -> Self {
        Self {
            rx,
            filters: Vec::new(),
        }
    }

    /// Derives a stream that surfaces only envelopes tagged `tag`,
    /// unwrapped one level.
    #[must_use]
    pub fn filtered(mut self, tag: WireId) -> Self {
        self.filters.push(tag);
        self
    }

    /// Receives the next message visible on this stream.
    ///
    /// Returns `None` once the endpoint is closed. A lagged subscriber
    /// logs and continues with the messages still buffered.
    pub async fn recv(&mut self) -> Option<Value> {
        loop {
            match self.rx.recv().await {
                Ok(raw) => {
                    if let Some(message) = self.unwrap_envelopes(raw) {
                        return Some(message);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "message stream lagged, dropping missed messages");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking receive, for tests and draining.
    pub fn try_recv(&mut self) -> Option<Value> {
        loop {
            match self.rx.try_recv() {
                Ok(raw) => {
                    if let Some(message) = self.unwrap_envelopes(raw) {
                        return Some(message);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "message stream lagged, dropping missed messages");
                }
                Err(_) => return None,
            }
        }
    }

    /// Applies the filter path: each level requires a matching
    /// `channel` tag and descends into `payload`. A message failing
    /// any level is invisible to this stream.
    fn unwrap_envelopes(&self, raw: Value) -> Option<Value> {
        let mut current = raw;
        for tag in &self.filters {
            let mut object = match current {
                Value::Object(object) => object,
                _ => return None,
            };
            if !tag.matches(object.get(CHANNEL_FIELD)?) {
                return None;
            }
            // A tagged envelope without a payload surfaces as null,
            // matching an absent value on the wire.
            current = object.remove(PAYLOAD_FIELD).unwrap_or(Value::Null);
        }
        Some(current)
    }
}

impl std::fmt::Debug for MessageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStream")
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn channel_tag_detection() {
        assert!(is_channel_tagged(&json!({"channel": 1, "payload": {}})));
        assert!(is_channel_tagged(&json!({"channel": "a"})));
        assert!(!is_channel_tagged(&json!({"id": 1, "type": "await"})));
        assert!(!is_channel_tagged(&json!(null)));
        assert!(!is_channel_tagged(&json!([1, 2])));
    }

    #[tokio::test]
    async fn unfiltered_stream_passes_everything() {
        let (tx, rx) = broadcast::channel(8);
        let mut stream = MessageStream::new(rx);

        tx.send(json!({"id": 1})).unwrap();
        tx.send(json!({"channel": 3, "payload": "x"})).unwrap();

        assert_eq!(stream.recv().await, Some(json!({"id": 1})));
        assert_eq!(
            stream.recv().await,
            Some(json!({"channel": 3, "payload": "x"})),
        );
    }

    #[tokio::test]
    async fn filtered_stream_unwraps_matching_envelopes() {
        let (tx, rx) = broadcast::channel(8);
        let mut stream = MessageStream::new(rx).filtered(WireId::Int(3));

        tx.send(json!({"id": 1})).unwrap();
        tx.send(json!({"channel": 4, "payload": "other"})).unwrap();
        tx.send(json!({"channel": 3, "payload": {"id": 2}})).unwrap();

        assert_eq!(stream.recv().await, Some(json!({"id": 2})));
    }

    #[tokio::test]
    async fn nested_filters_compose() {
        let (tx, rx) = broadcast::channel(8);
        let mut stream = MessageStream::new(rx)
            .filtered(WireId::Int(3))
            .filtered(WireId::from("inner"));

        tx.send(json!({
            "channel": 3,
            "payload": {"channel": "inner", "payload": 7},
        }))
        .unwrap();
        tx.send(json!({"channel": 3, "payload": {"id": 9}})).unwrap();

        assert_eq!(stream.recv().await, Some(json!(7)));
        assert_eq!(stream.try_recv(), None);
    }

    #[tokio::test]
    async fn envelope_without_payload_surfaces_null() {
        let (tx, rx) = broadcast::channel(8);
        let mut stream = MessageStream::new(rx).filtered(WireId::Int(1));

        tx.send(json!({"channel": 1})).unwrap();
        assert_eq!(stream.recv().await, Some(Value::Null));
    }

    #[tokio::test]
    async fn closed_sender_ends_stream() {
        let (tx, rx) = broadcast::channel(8);
        let mut stream = MessageStream::new(rx);
        drop(tx);
        assert_eq!(stream.recv().await, None);
    }
}
