//! Remote-object bridge: proxy engine and dispatcher.
//!
//! Tether turns any conforming message endpoint into a bridge between
//! two realms. One side binds a value with [`expose`]; the other side
//! calls [`wrap`] and receives a [`Remote`] that behaves like a local
//! handle on that value:
//!
//! ```text
//! ┌─────────────────┐                       ┌──────────────────┐
//! │  wrap(E)        │   call/construct/     │  expose(root, F) │
//! │  Remote proxy   │ ───────await────────► │  dispatcher      │
//! │  pending table  │ ◄──response/error──── │  chain walk      │
//! └─────────────────┘                       └──────────────────┘
//!          │      sub-channels (wrapped values)      │
//!          └───── recursive sessions over E/oid ─────┘
//! ```
//!
//! Property chains are free; awaiting a chain, calling a function or
//! constructing an instance each cost one request/response round trip.
//! Values that carry behaviour (functions, constructors, marked data)
//! never travel by copy: the sender exposes them on a sub-channel of
//! the same endpoint and the receiver gets a sub-proxy, so callbacks
//! and live objects work in both directions over one transport.
//!
//! # Example
//!
//! ```no_run
//! use tether_rpc::{expose, wrap, Payload};
//! use tether_transport::MemoryEndpoint;
//!
//! # async fn demo() -> Result<(), tether_rpc::RpcError> {
//! let (near, far) = MemoryEndpoint::pair();
//!
//! expose(
//!     Payload::object([(
//!         "add",
//!         Payload::function(|args: Vec<Payload>| async move {
//!             let a = args[0].as_i64().ok_or("a must be a number")?;
//!             let b = args[1].as_i64().ok_or("b must be a number")?;
//!             Ok(Payload::from(a + b))
//!         }),
//!     )]),
//!     far,
//! );
//!
//! let root = wrap(near);
//! let sum = root.get("add").call(vec![2i64.into(), 3i64.into()]).await?;
//! assert_eq!(sum.as_i64(), Some(5));
//! # Ok(())
//! # }
//! ```
//!
//! # Guarantees
//!
//! - one terminal outcome per request: resolve, reject, or (on a
//!   silent transport) pending forever; never two
//! - responses match requests strictly by id, so out-of-order
//!   completion is correct
//! - key chains containing reserved name fragments are rejected
//!   before any dispatch
//! - constructed instances always come back as live references
//!
//! # Related Crates
//!
//! - `tether-transport`: the [`Endpoint`] contract, sub-channels, and
//!   the in-memory pair
//! - `tether-wire`: wire message types and validation
//! - `tether-types`: identifiers and error conventions

mod client;
mod codec;
mod dispatch;
mod error;
mod payload;
mod pending;
mod remote;

pub use client::wrap;
pub use dispatch::expose;
pub use error::{DispatchError, RpcError};
pub use payload::{Callable, Payload};
pub use remote::Remote;

// Re-exports for callers assembling a bridge without naming every
// workspace crate.
pub use tether_transport::{create_channel, Endpoint, MemoryEndpoint, TransportError};
pub use tether_types::{ErrorCode, WireId};
