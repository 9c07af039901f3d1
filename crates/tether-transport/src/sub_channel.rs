//! Logical sub-channels multiplexed over one endpoint.
//!
//! [`create_channel`] derives endpoint `E/t` from endpoint `E` and tag
//! `t`. Posting `v` on `E/t` posts the envelope
//! `{channel: t, payload: v}` on `E`; a message on `E` surfaces to
//! subscribers of `E/t` exactly when it is an object whose `channel`
//! field equals `t`, and what surfaces is its `payload`, untouched.
//!
//! ```text
//!         E (physical)
//!   ┌───────┼────────────┐
//!   │       │            │
//!  bare    E/1          E/"cb"
//!  stream   │            │
//!          E/1/x   (nesting composes)
//! ```
//!
//! Properties:
//!
//! - untagged messages are invisible to every derived channel
//! - several channels with the same tag each receive a copy
//! - a malformed payload is the consumer's problem, not the
//!   multiplexer's; it passes through unchanged
//! - derived channels are full endpoints, so a bridge session can run
//!   inside one recursively

use crate::endpoint::{Endpoint, MessageStream, CHANNEL_FIELD, PAYLOAD_FIELD};
use crate::error::TransportError;
use serde_json::Value;
use std::sync::Arc;
use tether_types::WireId;

/// A derived endpoint filtering one tag of its parent.
///
/// Obtained through [`create_channel`]; the type is public so adapters
/// can name it, but all behaviour is the [`Endpoint`] contract.
pub struct SubChannel {
    parent: Arc<dyn Endpoint>,
    tag: WireId,
}

impl SubChannel {
    /// Derives a sub-channel of `parent` for `tag`.
    #[must_use]
    pub fn new(parent: Arc<dyn Endpoint>, tag: WireId) -> Self {
        Self { parent, tag }
    }

    /// The tag this channel filters on.
    #[must_use]
    pub fn tag(&self) -> &WireId {
        &self.tag
    }
}

impl Endpoint for SubChannel {
    fn post(&self, message: Value) -> Result<(), TransportError> {
        let mut envelope = serde_json::Map::with_capacity(2);
        envelope.insert(CHANNEL_FIELD.to_string(), self.tag.as_value());
        envelope.insert(PAYLOAD_FIELD.to_string(), message);
        self.parent.post(Value::Object(envelope))
    }

    fn subscribe(&self) -> MessageStream {
        self.parent.subscribe().filtered(self.tag.clone())
    }
}

impl std::fmt::Debug for SubChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubChannel")
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// Derives the logical endpoint `parent/tag`.
///
/// # Example
///
/// ```
/// use tether_transport::{create_channel, MemoryEndpoint};
///
/// let (near, far) = MemoryEndpoint::pair();
/// let _listening = far.subscribe();
///
/// let near_sub = create_channel(near, 7u64);
/// near_sub.post(serde_json::json!("hello")).unwrap();
/// ```
#[must_use]
pub fn create_channel(parent: Arc<dyn Endpoint>, tag: impl Into<WireId>) -> Arc<dyn Endpoint> {
    Arc::new(SubChannel::new(parent, tag.into()))
}
