//! The lazy client proxy.
//!
//! A [`Remote`] stands in for a value in the peer's realm. It is the
//! product of a session and an accumulated key chain: [`Remote::get`]
//! extends the chain without touching the wire, and only the terminal
//! operations put a request on the endpoint:
//!
//! | Operation | Wire message |
//! |-----------|--------------|
//! | [`Remote::call`] | `{type:"call", keyChain, args}` |
//! | [`Remote::construct`] | `{type:"construct", keyChain, args}` |
//! | [`Remote::resolve`] or `.await` | `{type:"await", keyChain}` |
//!
//! Children are cached per node: `p.get("k")` returns the same proxy
//! for the same key every time, so proxy identity is stable across
//! repeated access.

use crate::client::ClientSession;
use crate::codec::encode_args;
use crate::error::RpcError;
use crate::payload::Payload;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use tether_wire::Message;

struct RemoteNode {
    session: Arc<ClientSession>,
    path: Vec<String>,
    children: Mutex<HashMap<String, Remote>>,
}

/// Handle to a value living on the other side of the bridge.
///
/// Cloning is shallow; clones share the node, its child cache and its
/// session. Awaiting a `Remote` resolves the value at its chain:
///
/// ```no_run
/// # async fn demo(root: tether_rpc::Remote) -> Result<(), tether_rpc::RpcError> {
/// let value = root.get("config").get("retries").await?;
/// assert_eq!(value.as_i64(), Some(3));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Remote {
    node: Arc<RemoteNode>,
}

impl Remote {
    pub(crate) fn root(session: Arc<ClientSession>) -> Self {
        Self::with_path(session, Vec::new())
    }

    fn with_path(session: Arc<ClientSession>, path: Vec<String>) -> Self {
        Self {
            node: Arc::new(RemoteNode {
                session,
                path,
                children: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn session(&self) -> &Arc<ClientSession> {
        &self.node.session
    }

    /// The key chain from the session root to this proxy.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.node.path
    }

    /// The sub-proxy for member `key`.
    ///
    /// Purely local: no message is posted. Repeated access with the
    /// same key returns the same proxy.
    #[must_use]
    pub fn get(&self, key: impl Into<String>) -> Remote {
        let key = key.into();
        self.node
            .children
            .lock()
            .entry(key.clone())
            .or_insert_with(|| {
                let mut path = self.node.path.clone();
                path.push(key);
                Remote::with_path(Arc::clone(&self.node.session), path)
            })
            .clone()
    }

    /// Returns `true` when both handles are the same proxy node.
    #[must_use]
    pub fn same_proxy(&self, other: &Remote) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Invokes the remote function at this chain.
    ///
    /// Arguments are encoded element-wise; callables and marked
    /// payloads among them are exposed on sub-channels of this
    /// session's endpoint and reach the peer as proxies.
    ///
    /// # Errors
    ///
    /// [`RpcError::Remote`] with the peer's error message, or
    /// [`RpcError::SessionClosed`] if the session collapsed.
    pub async fn call(&self, args: Vec<Payload>) -> Result<Payload, RpcError> {
        let session = self.session();
        let args = encode_args(args, session.endpoint(), session.ids());
        let path = self.node.path.clone();
        session
            .round_trip(move |id| Message::call(id, path, args))
            .await
    }

    /// Instantiates the remote constructor at this chain.
    ///
    /// The reply is always a wrapped instance, so on success the
    /// result is a [`Payload::Proxy`] to the live object.
    ///
    /// # Errors
    ///
    /// As for [`Remote::call`].
    pub async fn construct(&self, args: Vec<Payload>) -> Result<Payload, RpcError> {
        let session = self.session();
        let args = encode_args(args, session.endpoint(), session.ids());
        let path = self.node.path.clone();
        session
            .round_trip(move |id| Message::construct(id, path, args))
            .await
    }

    /// Resolves the value at this chain.
    ///
    /// Equivalent to awaiting the proxy itself.
    ///
    /// # Errors
    ///
    /// As for [`Remote::call`].
    pub async fn resolve(&self) -> Result<Payload, RpcError> {
        let path = self.node.path.clone();
        self.session()
            .round_trip(move |id| Message::await_chain(id, path))
            .await
    }
}

impl IntoFuture for Remote {
    type Output = Result<Payload, RpcError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.resolve().await })
    }
}

impl std::fmt::Debug for Remote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Remote")
            .field("path", &self.node.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::wrap;
    use tether_transport::MemoryEndpoint;

    fn test_root() -> Remote {
        let (near, _far) = MemoryEndpoint::pair();
        wrap(near)
    }

    #[tokio::test]
    async fn chains_accumulate_paths() {
        let root = test_root();
        let deep = root.get("a").get("b").get("c");
        assert_eq!(deep.path(), ["a", "b", "c"]);
        assert!(root.path().is_empty());
    }

    #[tokio::test]
    async fn repeated_access_returns_the_same_proxy() {
        let root = test_root();
        let first = root.get("x");
        let second = root.get("x");
        assert!(first.same_proxy(&second));

        let deep_one = root.get("a").get("b");
        let deep_two = root.get("a").get("b");
        assert!(deep_one.same_proxy(&deep_two));

        assert!(!first.same_proxy(&root.get("y")));
    }

    #[tokio::test]
    async fn clones_share_identity() {
        let root = test_root();
        let a = root.get("a");
        let b = a.clone();
        assert!(a.same_proxy(&b));
    }

    #[tokio::test]
    async fn property_access_posts_nothing() {
        let (near, far) = MemoryEndpoint::pair();
        let mut tap = far.subscribe();
        let root = wrap(near);

        let _chain = root.get("a").get("b").get("c");
        let _again = root.get("a");
        tokio::task::yield_now().await;

        assert_eq!(tap.try_recv(), None);
    }
}
