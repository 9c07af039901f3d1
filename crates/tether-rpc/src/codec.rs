//! Encoding and decoding of payloads at the endpoint boundary.
//!
//! Encoding decides, per value, between the two wire forms:
//!
//! - **inline**: the value is plain data; the transport copies it.
//! - **wrapped**: the value carries behaviour (or is marked); it is
//!   exposed on a fresh sub-channel of the same endpoint and crosses
//!   the wire as `{type:"wraped", id}`. The peer decodes that into a
//!   proxy wrapping the same sub-channel, and a full bridge session
//!   runs inside it recursively.
//!
//! Decoding is the mirror image. Argument vectors go element-wise.

use crate::client::wrap;
use crate::dispatch::expose;
use crate::payload::Payload;
use std::sync::Arc;
use tether_transport::{create_channel, Endpoint};
use tether_types::IdAllocator;
use tether_wire::EncodedValue;

/// Encodes one payload for transfer over `endpoint`.
pub(crate) fn encode(
    payload: Payload,
    endpoint: &Arc<dyn Endpoint>,
    ids: &IdAllocator,
) -> EncodedValue {
    if payload.must_wrap() {
        return encode_wrapped(payload, endpoint, ids);
    }
    match payload.as_inline() {
        Some(data) => EncodedValue::inline(data),
        // A callable below the top level cannot survive a structured
        // copy; wrap instead of losing it.
        None => encode_wrapped(payload, endpoint, ids),
    }
}

/// Wraps unconditionally: allocates an object id, exposes the payload
/// on that sub-channel, and returns the reference encoding.
///
/// Constructed instances come through here regardless of their shape,
/// so a constructor's caller always receives a proxy to the live
/// instance rather than a snapshot.
pub(crate) fn encode_wrapped(
    payload: Payload,
    endpoint: &Arc<dyn Endpoint>,
    ids: &IdAllocator,
) -> EncodedValue {
    let object_id = ids.allocate();
    let sub_channel = create_channel(Arc::clone(endpoint), object_id.clone());
    expose(payload.unmark(), sub_channel);
    EncodedValue::wrapped(object_id)
}

/// Decodes one received value from `endpoint`.
pub(crate) fn decode(encoded: EncodedValue, endpoint: &Arc<dyn Endpoint>) -> Payload {
    match encoded {
        EncodedValue::Inline { data } => Payload::Data(data),
        EncodedValue::Wrapped { id } => {
            Payload::Proxy(wrap(create_channel(Arc::clone(endpoint), id)))
        }
    }
}

/// Element-wise [`encode`] of an argument vector.
pub(crate) fn encode_args(
    args: Vec<Payload>,
    endpoint: &Arc<dyn Endpoint>,
    ids: &IdAllocator,
) -> Vec<EncodedValue> {
    args.into_iter()
        .map(|arg| encode(arg, endpoint, ids))
        .collect()
}

/// Element-wise [`decode`] of an argument vector.
pub(crate) fn decode_args(args: Vec<EncodedValue>, endpoint: &Arc<dyn Endpoint>) -> Vec<Payload> {
    args.into_iter().map(|arg| decode(arg, endpoint)).collect()
}
