//! The pending-request table.
//!
//! One entry per in-flight request: id to resolver. An entry is
//! inserted when the request is issued and removed by the first
//! matching response or error; nothing else iterates or mutates the
//! table. The entry is taken out of the map *before* its resolver
//! runs, so a continuation that issues a new request re-entrantly can
//! never observe or disturb its own completed entry.

use parking_lot::Mutex;
use std::collections::HashMap;
use tether_types::WireId;
use tether_wire::EncodedValue;
use tokio::sync::oneshot;
use tracing::debug;

/// What a request ultimately resolves to: the encoded result, or the
/// peer's error message.
pub(crate) type Outcome = Result<EncodedValue, String>;

/// Request id to resolver mapping for one client session.
pub(crate) struct PendingTable {
    entries: Mutex<HashMap<WireId, oneshot::Sender<Outcome>>>,
}

impl PendingTable {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a pending request and returns the waiter's half.
    pub(crate) fn insert(&self, id: WireId) -> oneshot::Receiver<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.entries.lock().insert(id, tx);
        rx
    }

    /// Completes the request `id`, delivering `outcome` to its waiter.
    ///
    /// Unknown ids are a no-op: the response may belong to an already
    /// resolved request or to another session sharing the transport.
    /// Returns `true` when a waiter was actually completed.
    pub(crate) fn complete(&self, id: &WireId, outcome: Outcome) -> bool {
        let entry = self.entries.lock().remove(id);
        match entry {
            Some(tx) => {
                // The waiter may have been dropped; that is fine, the
                // request simply has no one left to tell.
                let _ = tx.send(outcome);
                true
            }
            None => {
                debug!(%id, "response for unknown request id, ignoring");
                false
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn resolves_matching_id() {
        let table = PendingTable::new();
        let rx = table.insert(WireId::Int(1));

        assert!(table.complete(&WireId::Int(1), Ok(EncodedValue::inline(json!(5)))));
        assert_eq!(rx.await.unwrap(), Ok(EncodedValue::inline(json!(5))));
        assert_eq!(table.len(), 0);
    }

    #[tokio::test]
    async fn rejects_with_error_outcome() {
        let table = PendingTable::new();
        let rx = table.insert(WireId::Int(2));

        table.complete(&WireId::Int(2), Err("bad".into()));
        assert_eq!(rx.await.unwrap(), Err("bad".to_string()));
    }

    #[test]
    fn unknown_id_is_a_noop() {
        let table = PendingTable::new();
        let _rx = table.insert(WireId::Int(1));

        assert!(!table.complete(&WireId::Int(99), Ok(EncodedValue::inline(json!(0)))));
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn completes_at_most_once() {
        let table = PendingTable::new();
        let rx = table.insert(WireId::Int(3));

        assert!(table.complete(&WireId::Int(3), Ok(EncodedValue::inline(json!(1)))));
        assert!(!table.complete(&WireId::Int(3), Ok(EncodedValue::inline(json!(2)))));
        assert_eq!(rx.await.unwrap(), Ok(EncodedValue::inline(json!(1))));
    }

    #[test]
    fn dropped_waiter_is_tolerated() {
        let table = PendingTable::new();
        let rx = table.insert(WireId::from("r"));
        drop(rx);

        assert!(table.complete(&WireId::from("r"), Ok(EncodedValue::inline(json!(0)))));
    }

    #[test]
    fn distinct_ids_do_not_interfere() {
        let table = PendingTable::new();
        let _rx_a = table.insert(WireId::Int(1));
        let _rx_b = table.insert(WireId::from("1"));

        // Integer 1 and string "1" are different ids.
        assert_eq!(table.len(), 2);
        table.complete(&WireId::Int(1), Err("gone".into()));
        assert_eq!(table.len(), 1);
    }
}
