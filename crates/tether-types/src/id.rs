//! Wire identifiers and the session id allocator.
//!
//! A [`WireId`] names a request, a wrapped object, or a sub-channel tag.
//! On the wire it is a bare JSON integer or string; both sides treat it
//! as opaque and compare it for equality only.
//!
//! # Allocation Regimes
//!
//! [`IdAllocator`] hands out identifiers in two regimes:
//!
//! 1. **Sequential**: a per-session counter, as long as it stays below
//!    [`RANDOM_THRESHOLD`]. Cheap, ordered, unique within the session.
//! 2. **Random**: once the counter approaches the largest integer a
//!    JSON peer can represent exactly ([`SAFE_INTEGER_LIMIT`]), every
//!    further id is a fresh 128-bit random UUID string. The counter
//!    never wraps, so an id is never reused for a different request
//!    or object.
//!
//! Only the issuing side allocates; the peer echoes ids back verbatim.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Largest integer a JSON peer is guaranteed to round-trip exactly
/// (2^53 - 1, the IEEE-754 double safe-integer bound).
pub const SAFE_INTEGER_LIMIT: u64 = 9_007_199_254_740_991;

/// Counter value at which [`IdAllocator`] switches to random ids.
///
/// The margin below [`SAFE_INTEGER_LIMIT`] keeps every id ever emitted
/// by the sequential regime exactly representable on the wire.
pub const RANDOM_THRESHOLD: u64 = SAFE_INTEGER_LIMIT - 1000;

/// Identifier carried on the wire for requests, wrapped objects and
/// sub-channel tags.
///
/// Serialises untagged: `WireId::Int(7)` is the JSON number `7`,
/// `WireId::Str(..)` a JSON string. Field order and casing of the
/// surrounding message are fixed by `tether-wire`.
///
/// # Example
///
/// ```
/// use tether_types::WireId;
///
/// let id = WireId::from(7u64);
/// assert_eq!(serde_json::to_string(&id).unwrap(), "7");
///
/// let id: WireId = serde_json::from_str("\"a1b2\"").unwrap();
/// assert_eq!(id, WireId::Str("a1b2".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    /// Sequential-regime identifier.
    Int(u64),
    /// Random-regime identifier (or any peer-issued string id).
    Str(String),
}

impl WireId {
    /// Returns the id as a JSON value, the form it takes on the wire.
    #[must_use]
    pub fn as_value(&self) -> serde_json::Value {
        match self {
            Self::Int(n) => serde_json::Value::from(*n),
            Self::Str(s) => serde_json::Value::from(s.clone()),
        }
    }

    /// Returns `true` if `value` is this id in wire form.
    ///
    /// Used by the sub-channel multiplexer to match the `channel`
    /// field of an envelope against a tag.
    #[must_use]
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            Self::Int(n) => value.as_u64() == Some(*n),
            Self::Str(s) => value.as_str() == Some(s.as_str()),
        }
    }
}

impl From<u64> for WireId {
    fn from(n: u64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for WireId {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for WireId {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl std::fmt::Display for WireId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Per-session identifier allocator.
///
/// One allocator instance serves one bridge session; requests and
/// wrapped-object exposures draw from the same sequence. The allocator
/// is re-entrancy safe: a handler may allocate while another allocation
/// is in flight on the same session.
///
/// # Example
///
/// ```
/// use tether_types::{IdAllocator, WireId};
///
/// let ids = IdAllocator::new();
/// assert_eq!(ids.allocate(), WireId::Int(1));
/// assert_eq!(ids.allocate(), WireId::Int(2));
/// ```
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    /// Creates an allocator starting at `1`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Creates an allocator with the counter pre-positioned.
    ///
    /// Exists so the random regime can be exercised without issuing
    /// 2^53 requests first.
    #[must_use]
    pub fn starting_at(next: u64) -> Self {
        Self {
            next: AtomicU64::new(next),
        }
    }

    /// Returns a fresh identifier, unique for the allocator's lifetime.
    #[must_use]
    pub fn allocate(&self) -> WireId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        if n >= RANDOM_THRESHOLD {
            WireId::Str(Uuid::new_v4().to_string())
        } else {
            WireId::Int(n)
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
