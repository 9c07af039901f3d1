//! Transport abstraction and channel multiplexing for the tether bridge.
//!
//! The bridge core never touches sockets. It talks to an [`Endpoint`]:
//! post one structured value, subscribe to incoming values. On top of
//! that single contract this crate provides:
//!
//! - [`create_channel`]: logical sub-channels multiplexed over one
//!   endpoint by a `{channel, payload}` envelope, so many independent
//!   bridge sessions share one physical transport
//! - [`MemoryEndpoint`]: an in-process endpoint pair with
//!   message-channel semantics, used by tests and same-process bridges
//!
//! Concrete network transports are adapters outside the core; their
//! only obligation is the [`Endpoint`] contract (at-most-once delivery
//! per subscriber, FIFO per endpoint, broadcast fan-out within a
//! realm).
//!
//! # Usage
//!
//! ```
//! use tether_transport::{create_channel, MemoryEndpoint};
//! use serde_json::json;
//!
//! let (near, far) = MemoryEndpoint::pair();
//!
//! // Derived endpoints carve logical streams out of the pair.
//! let near_control = create_channel(near.clone(), "control");
//! let far_control = create_channel(far.clone(), "control");
//!
//! let mut incoming = far_control.subscribe();
//! near_control.post(json!({"op": "ping"})).unwrap();
//! ```

mod endpoint;
mod error;
mod memory;
mod sub_channel;

pub use endpoint::{
    is_channel_tagged, Endpoint, MessageStream, CHANNEL_FIELD, ENDPOINT_BUFFER, PAYLOAD_FIELD,
};
pub use error::TransportError;
pub use memory::MemoryEndpoint;
pub use sub_channel::{create_channel, SubChannel};
