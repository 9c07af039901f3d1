//! The server half of a bridge session.
//!
//! [`expose`] binds a root [`Payload`] to an endpoint. Every untagged
//! inbound message is validated, parsed, and served in its own spawned
//! task, so an exposed function that awaits does not stall the stream:
//!
//! ```text
//! endpoint ──► serve loop ──► validate ──► walk chain ──► operate
//!                  │                                        │
//!                  │            response / error  ◄─────────┘
//!                  └──────────── (skip sub-channel traffic)
//! ```
//!
//! The dispatcher owns the root for the lifetime of the endpoint and
//! only traverses it; nothing here mutates exposed state. Errors of
//! any kind are caught, formatted, and sent back under the request id.
//! They never escape into the task.

use crate::codec::{decode_args, encode, encode_wrapped};
use crate::error::DispatchError;
use crate::payload::Payload;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tether_transport::{is_channel_tagged, Endpoint, MessageStream};
use tether_types::{IdAllocator, WireId};
use tether_wire::{parse_message, EncodedValue, Message};
use tracing::{debug, warn};

/// Exposes `root` on `endpoint`.
///
/// Installs the dispatcher and returns; the root itself stays bare.
/// Only the results of operations are wrapped, so the peer's first
/// step is always a request against this root. The exposure lives for
/// the lifetime of the endpoint; there is no release message in this
/// protocol revision. Must be called within a tokio runtime.
///
/// # Example
///
/// ```no_run
/// use tether_rpc::{expose, Payload};
/// use tether_transport::MemoryEndpoint;
///
/// let (_near, far) = MemoryEndpoint::pair();
/// expose(
///     Payload::object([(
///         "ping",
///         Payload::function(|_args| async move { Ok(Payload::from("pong")) }),
///     )]),
///     far,
/// );
/// ```
pub fn expose(root: Payload, endpoint: Arc<dyn Endpoint>) {
    let stream = endpoint.subscribe();
    let session = Arc::new(ServerSession {
        root,
        endpoint,
        ids: IdAllocator::new(),
    });
    tokio::spawn(serve(session, stream));
}

/// Shared state of one `expose` call.
struct ServerSession {
    root: Payload,
    endpoint: Arc<dyn Endpoint>,
    ids: IdAllocator,
}

async fn serve(session: Arc<ServerSession>, mut stream: MessageStream) {
    while let Some(raw) = stream.recv().await {
        if is_channel_tagged(&raw) {
            // Sub-channel traffic; some nested session's business.
            continue;
        }
        // Boxed so nested sessions spawned while serving do not nest
        // this future type into itself.
        let handler: Pin<Box<dyn Future<Output = ()> + Send>> =
            Box::pin(handle(Arc::clone(&session), raw));
        tokio::spawn(handler);
    }
}

/// Serves one inbound message end to end.
async fn handle(session: Arc<ServerSession>, raw: Value) {
    let message = match parse_message(&raw) {
        Ok(message) => message,
        Err(err) => {
            // Reply under the original id when one can be salvaged;
            // otherwise there is no one to address.
            match raw
                .get("id")
                .cloned()
                .and_then(|id| serde_json::from_value::<WireId>(id).ok())
            {
                Some(id) => send_reply(&session, Message::error(id, err.to_string())),
                None => debug!(error = %err, "dropping malformed message without usable id"),
            }
            return;
        }
    };

    let (id, outcome) = match message {
        Message::Await { id, key_chain } => {
            let outcome = perform_await(&session, &key_chain);
            (id, outcome)
        }
        Message::Call { id, key_chain, args } => {
            let outcome = perform_call(&session, &key_chain, args).await;
            (id, outcome)
        }
        Message::Construct { id, key_chain, args } => {
            let outcome = perform_construct(&session, &key_chain, args).await;
            (id, outcome)
        }
        // Replies belong to a client half sharing this endpoint.
        Message::Response { .. } | Message::Error { .. } => return,
    };

    let reply = match outcome {
        Ok(data) => Message::response(id, data),
        Err(err) => Message::error(id, err.to_string()),
    };
    send_reply(&session, reply);
}

fn send_reply(session: &ServerSession, reply: Message) {
    match serde_json::to_value(&reply) {
        Ok(raw) => {
            if let Err(err) = session.endpoint.post(raw) {
                warn!(error = %err, "failed to post reply, dropping it");
            }
        }
        Err(err) => warn!(error = %err, "failed to serialize reply, dropping it"),
    }
}

/// `await`: resolve the chain and encode whatever is there. A proxy at
/// the end of the chain is encoded like any other payload, which wraps
/// it again and hands the caller a proxy to a proxy.
fn perform_await(
    session: &ServerSession,
    key_chain: &[String],
) -> Result<EncodedValue, DispatchError> {
    let target = walk(&session.root, key_chain)?;
    Ok(encode(target, &session.endpoint, &session.ids))
}

/// `call`: the chain must end in a function (or a proxy, which
/// forwards the call to the realm that owns the target).
async fn perform_call(
    session: &ServerSession,
    key_chain: &[String],
    args: Vec<EncodedValue>,
) -> Result<EncodedValue, DispatchError> {
    let target = walk(&session.root, key_chain)?;
    let args = decode_args(args, &session.endpoint);
    let result = match target.unmark() {
        Payload::Function(callable) => callable
            .invoke(args)
            .await
            .map_err(DispatchError::User)?,
        Payload::Proxy(proxy) => proxy
            .call(args)
            .await
            .map_err(|err| DispatchError::User(err.to_string()))?,
        _ => return Err(DispatchError::NotCallable),
    };
    Ok(encode(result, &session.endpoint, &session.ids))
}

/// `construct`: the chain must end in a constructor (or a proxy). The
/// instance is force-wrapped regardless of its shape, so the reply is
/// always a reference to the live object.
async fn perform_construct(
    session: &ServerSession,
    key_chain: &[String],
    args: Vec<EncodedValue>,
) -> Result<EncodedValue, DispatchError> {
    let target = walk(&session.root, key_chain)?;
    let args = decode_args(args, &session.endpoint);
    let instance = match target.unmark() {
        Payload::Constructor(callable) => callable
            .invoke(args)
            .await
            .map_err(DispatchError::User)?,
        Payload::Proxy(proxy) => proxy
            .construct(args)
            .await
            .map_err(|err| DispatchError::User(err.to_string()))?,
        _ => return Err(DispatchError::NotConstructible),
    };
    Ok(encode_wrapped(instance, &session.endpoint, &session.ids))
}

/// Walk cursor: either a payload node or a position inside plain data.
enum Cursor<'a> {
    Node(&'a Payload),
    Data(&'a Value),
}

/// Resolves a key chain against the root by repeated own-member
/// access. Object members and JSON object fields are traversable;
/// prototype-style inheritance does not exist here, so every step is
/// own-or-nothing by construction. A proxy encountered mid-chain
/// absorbs the remaining keys lazily and is returned as the target.
fn walk(root: &Payload, key_chain: &[String]) -> Result<Payload, DispatchError> {
    let mut cursor = Cursor::Node(root);
    for (index, key) in key_chain.iter().enumerate() {
        cursor = match cursor {
            Cursor::Node(node) => match strip_marks(node) {
                Payload::Object(members) => {
                    Cursor::Node(members.get(key).ok_or_else(|| missing(key))?)
                }
                Payload::Data(value) => step_into_data(value, key)?,
                Payload::Proxy(proxy) => {
                    let folded = key_chain[index..]
                        .iter()
                        .fold(proxy.clone(), |p, k| p.get(k));
                    return Ok(Payload::Proxy(folded));
                }
                _ => return Err(missing(key)),
            },
            Cursor::Data(value) => step_into_data(value, key)?,
        };
    }
    Ok(match cursor {
        Cursor::Node(node) => node.clone(),
        Cursor::Data(value) => Payload::Data(value.clone()),
    })
}

fn step_into_data<'a>(value: &'a Value, key: &str) -> Result<Cursor<'a>, DispatchError> {
    match value {
        Value::Object(map) => map.get(key).map(Cursor::Data).ok_or_else(|| missing(key)),
        _ => Err(missing(key)),
    }
}

fn strip_marks(mut node: &Payload) -> &Payload {
    while let Payload::Marked(inner) = node {
        node = inner;
    }
    node
}

fn missing(key: &str) -> DispatchError {
    DispatchError::MissingProperty {
        key: key.to_string(),
    }
}
