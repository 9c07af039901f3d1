//! The host-value model.
//!
//! A [`Payload`] is what lives on either side of the bridge: the root
//! a server exposes, the arguments a caller passes, the results that
//! come back. The wire codec classifies each payload as *inline*
//! (plain data, copied by the transport) or *wrapped* (exposed on a
//! sub-channel, reaching the peer as a proxy).
//!
//! # Classification
//!
//! | Payload | Crossing the wire |
//! |---------|-------------------|
//! | `Data` | inline |
//! | `Object` of pure data | inline |
//! | `Object` with a callable member | wrapped |
//! | `Function`, `Constructor` | wrapped |
//! | `Proxy` | wrapped (a chain of proxies is legal) |
//! | `Marked` | wrapped, unconditionally |
//!
//! An object carrying a callable anywhere below its top level cannot
//! survive a structured copy either; the codec wraps it rather than
//! silently losing the callable.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::remote::Remote;

/// An async operation an exposed value offers to the peer.
///
/// Arguments arrive already decoded: plain data as [`Payload::Data`],
/// wrapped arguments (callbacks, marked objects) as [`Payload::Proxy`]
/// handles that call back into the sender's realm. The error string of
/// a failed invocation travels to the caller verbatim as the wire
/// error.
///
/// Closures are the usual implementation, via [`Payload::function`]
/// and [`Payload::constructor`]; implement the trait directly when the
/// operation carries state of its own.
#[async_trait]
pub trait Callable: Send + Sync {
    /// Invokes the operation with decoded arguments.
    async fn invoke(&self, args: Vec<Payload>) -> Result<Payload, String>;
}

struct FnCallable<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Callable for FnCallable<F>
where
    F: Fn(Vec<Payload>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Payload, String>> + Send,
{
    async fn invoke(&self, args: Vec<Payload>) -> Result<Payload, String> {
        (self.f)(args).await
    }
}

/// A value as the bridge sees it.
///
/// # Example
///
/// ```no_run
/// use tether_rpc::Payload;
/// use serde_json::json;
///
/// let root = Payload::object([
///     ("version", Payload::data(json!(1))),
///     (
///         "add",
///         Payload::function(|args: Vec<Payload>| async move {
///             let a = args[0].as_i64().ok_or("a must be a number")?;
///             let b = args[1].as_i64().ok_or("b must be a number")?;
///             Ok(Payload::from(a + b))
///         }),
///     ),
/// ]);
/// ```
#[derive(Clone)]
pub enum Payload {
    /// Plain structured data.
    Data(Value),
    /// Named members, mixing data and callables.
    Object(HashMap<String, Payload>),
    /// An async function; always wrapped on the wire.
    Function(Arc<dyn Callable>),
    /// A constructor; instances it produces always travel wrapped.
    Constructor(Arc<dyn Callable>),
    /// A handle to a value living in the peer's realm.
    Proxy(Remote),
    /// Data explicitly marked to travel by reference instead of copy.
    Marked(Box<Payload>),
}

impl Payload {
    /// Plain data payload.
    #[must_use]
    pub fn data(value: impl Into<Value>) -> Self {
        Self::Data(value.into())
    }

    /// The `null` payload.
    #[must_use]
    pub fn null() -> Self {
        Self::Data(Value::Null)
    }

    /// Object payload from `(key, member)` pairs.
    #[must_use]
    pub fn object<K, I>(members: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Payload)>,
    {
        Self::Object(
            members
                .into_iter()
                .map(|(key, member)| (key.into(), member))
                .collect(),
        )
    }

    /// Function payload from an async closure.
    #[must_use]
    pub fn function<F, Fut>(f: F) -> Self
    where
        F: Fn(Vec<Payload>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Payload, String>> + Send + 'static,
    {
        Self::Function(Arc::new(FnCallable { f }))
    }

    /// Constructor payload from an async closure. The closure builds
    /// and returns the instance, usually a [`Payload::object`] whose
    /// callable members capture shared state.
    #[must_use]
    pub fn constructor<F, Fut>(f: F) -> Self
    where
        F: Fn(Vec<Payload>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Payload, String>> + Send + 'static,
    {
        Self::Constructor(Arc::new(FnCallable { f }))
    }

    /// Marks a payload to travel by reference: the codec wraps it even
    /// when it is plain data that could be copied.
    #[must_use]
    pub fn marked(inner: Payload) -> Self {
        Self::Marked(Box::new(inner))
    }

    /// The inner data of a [`Payload::Data`].
    #[must_use]
    pub fn as_data(&self) -> Option<&Value> {
        match self {
            Self::Data(value) => Some(value),
            _ => None,
        }
    }

    /// Consumes the payload, returning its data if it is plain data.
    #[must_use]
    pub fn into_data(self) -> Option<Value> {
        match self {
            Self::Data(value) => Some(value),
            _ => None,
        }
    }

    /// Integer view of a data payload.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_data().and_then(Value::as_i64)
    }

    /// Float view of a data payload.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.as_data().and_then(Value::as_f64)
    }

    /// String view of a data payload.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_data().and_then(Value::as_str)
    }

    /// Bool view of a data payload.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.as_data().and_then(Value::as_bool)
    }

    /// The proxy handle of a [`Payload::Proxy`].
    #[must_use]
    pub fn as_proxy(&self) -> Option<&Remote> {
        match self {
            Self::Proxy(remote) => Some(remote),
            _ => None,
        }
    }

    /// Returns `true` for functions and constructors.
    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_) | Self::Constructor(_))
    }

    /// Strips `Marked` wrappers.
    pub(crate) fn unmark(self) -> Payload {
        match self {
            Self::Marked(inner) => inner.unmark(),
            other => other,
        }
    }

    /// Classifies the payload for the codec: `true` means it must be
    /// exposed on a sub-channel, never copied.
    ///
    /// Objects are judged by their top-level members; deeper callables
    /// are caught by [`as_inline`](Self::as_inline) failing.
    pub(crate) fn must_wrap(&self) -> bool {
        match self {
            Self::Data(_) => false,
            Self::Object(members) => members
                .values()
                .any(|m| m.is_callable() || matches!(m, Self::Proxy(_) | Self::Marked(_))),
            Self::Function(_) | Self::Constructor(_) | Self::Proxy(_) | Self::Marked(_) => true,
        }
    }

    /// The inline wire form, if one exists: data as-is, objects member
    /// by member. `None` when any member, however deep, is not data.
    pub(crate) fn as_inline(&self) -> Option<Value> {
        match self {
            Self::Data(value) => Some(value.clone()),
            Self::Object(members) => {
                let mut map = serde_json::Map::with_capacity(members.len());
                for (key, member) in members {
                    map.insert(key.clone(), member.as_inline()?);
                }
                Some(Value::Object(map))
            }
            _ => None,
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Data(value)
    }
}

impl From<i64> for Payload {
    fn from(n: i64) -> Self {
        Self::Data(Value::from(n))
    }
}

impl From<f64> for Payload {
    fn from(n: f64) -> Self {
        Self::Data(Value::from(n))
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Self::Data(Value::from(b))
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Self::Data(Value::from(s))
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Self::Data(Value::from(s))
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Data(value) => f.debug_tuple("Data").field(value).finish(),
            Self::Object(members) => {
                let mut keys: Vec<&String> = members.keys().collect();
                keys.sort();
                f.debug_tuple("Object").field(&keys).finish()
            }
            Self::Function(_) => f.write_str("Function"),
            Self::Constructor(_) => f.write_str("Constructor"),
            Self::Proxy(remote) => f.debug_tuple("Proxy").field(remote).finish(),
            Self::Marked(inner) => f.debug_tuple("Marked").field(inner).finish(),
        }
    }
}
