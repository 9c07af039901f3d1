//! Wire message types.
//!
//! Every value posted on a bare (non-sub-channel) stream is exactly one
//! [`Message`]. Field names are case sensitive and fixed by the wire
//! contract, including the `wraped` spelling of the wrapped encoding,
//! kept for interoperability with existing peers.
//!
//! # Request/Response Pattern
//!
//! ```text
//! ┌──────────┐  call / construct / await   ┌────────────┐
//! │  Proxy   │ ──────────────────────────► │ Dispatcher │
//! │ (client) │ ◄────────────────────────── │  (server)  │
//! └──────────┘     response / error        └────────────┘
//! ```
//!
//! A request names a key chain on the exposed root; the reply echoes
//! the request id. Values cross the wire as [`EncodedValue`]: either
//! inline data or a reference to a sub-channel the sender has exposed
//! the value on.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tether_types::WireId;

/// A value crossing the bridge, in wire form.
///
/// # Example
///
/// ```
/// use tether_wire::EncodedValue;
/// use serde_json::json;
///
/// let inline = EncodedValue::inline(json!(5));
/// assert_eq!(
///     serde_json::to_value(&inline).unwrap(),
///     json!({"type": "any", "data": 5}),
/// );
///
/// let wrapped = EncodedValue::wrapped(7u64);
/// assert_eq!(
///     serde_json::to_value(&wrapped).unwrap(),
///     json!({"type": "wraped", "id": 7}),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EncodedValue {
    /// The value travels as-is, copied by the transport.
    #[serde(rename = "any")]
    Inline {
        /// The transferred data. Peers may omit the field entirely for
        /// an absent value; that decodes as `null`.
        #[serde(default)]
        data: Value,
    },
    /// The sender has exposed the value on sub-channel `id` of the
    /// same endpoint; the receiver should wrap that sub-channel.
    #[serde(rename = "wraped")]
    Wrapped {
        /// Sub-channel tag hosting the value.
        id: WireId,
    },
}

impl EncodedValue {
    /// Inline encoding of `data`.
    #[must_use]
    pub fn inline(data: impl Into<Value>) -> Self {
        Self::Inline { data: data.into() }
    }

    /// Wrapped encoding pointing at sub-channel `id`.
    #[must_use]
    pub fn wrapped(id: impl Into<WireId>) -> Self {
        Self::Wrapped { id: id.into() }
    }

    /// Returns `true` for the wrapped encoding.
    #[must_use]
    pub fn is_wrapped(&self) -> bool {
        matches!(self, Self::Wrapped { .. })
    }
}

/// A top-level wire message.
///
/// Three request forms, two reply forms. Requests carry a key chain
/// resolved against the exposed root; replies echo the request id.
///
/// # Example
///
/// ```
/// use tether_wire::Message;
/// use serde_json::json;
///
/// let msg = Message::await_chain(1u64, vec!["a".into(), "b".into()]);
/// assert_eq!(
///     serde_json::to_value(&msg).unwrap(),
///     json!({"id": 1, "type": "await", "keyChain": ["a", "b"]}),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// Invoke the function at the chain with arguments.
    Call {
        /// Request id, echoed by the reply.
        id: WireId,
        /// Property path from the exposed root to the target.
        #[serde(rename = "keyChain")]
        key_chain: Vec<String>,
        /// Encoded arguments, element-wise.
        args: Vec<EncodedValue>,
    },
    /// Instantiate the constructor at the chain with arguments.
    Construct {
        /// Request id, echoed by the reply.
        id: WireId,
        /// Property path from the exposed root to the target.
        #[serde(rename = "keyChain")]
        key_chain: Vec<String>,
        /// Encoded arguments, element-wise.
        args: Vec<EncodedValue>,
    },
    /// Resolve the value at the chain.
    Await {
        /// Request id, echoed by the reply.
        id: WireId,
        /// Property path from the exposed root to the target.
        #[serde(rename = "keyChain")]
        key_chain: Vec<String>,
    },
    /// Successful reply carrying the encoded result.
    Response {
        /// Id of the request being answered.
        id: WireId,
        /// Encoded result value.
        data: EncodedValue,
    },
    /// Failed reply carrying a human-readable message.
    Error {
        /// Id of the request being answered.
        id: WireId,
        /// What went wrong, as reported to the caller.
        error: String,
    },
}

impl Message {
    /// Builds a `call` request.
    #[must_use]
    pub fn call(id: impl Into<WireId>, key_chain: Vec<String>, args: Vec<EncodedValue>) -> Self {
        Self::Call {
            id: id.into(),
            key_chain,
            args,
        }
    }

    /// Builds a `construct` request.
    #[must_use]
    pub fn construct(
        id: impl Into<WireId>,
        key_chain: Vec<String>,
        args: Vec<EncodedValue>,
    ) -> Self {
        Self::Construct {
            id: id.into(),
            key_chain,
            args,
        }
    }

    /// Builds an `await` request for the value at `key_chain`.
    #[must_use]
    pub fn await_chain(id: impl Into<WireId>, key_chain: Vec<String>) -> Self {
        Self::Await {
            id: id.into(),
            key_chain,
        }
    }

    /// Builds a successful reply.
    #[must_use]
    pub fn response(id: impl Into<WireId>, data: EncodedValue) -> Self {
        Self::Response {
            id: id.into(),
            data,
        }
    }

    /// Builds an error reply.
    #[must_use]
    pub fn error(id: impl Into<WireId>, error: impl Into<String>) -> Self {
        Self::Error {
            id: id.into(),
            error: error.into(),
        }
    }

    /// The message id.
    #[must_use]
    pub fn id(&self) -> &WireId {
        match self {
            Self::Call { id, .. }
            | Self::Construct { id, .. }
            | Self::Await { id, .. }
            | Self::Response { id, .. }
            | Self::Error { id, .. } => id,
        }
    }

    /// Returns `true` for the three request forms.
    #[must_use]
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Self::Call { .. } | Self::Construct { .. } | Self::Await { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn call_wire_shape() {
        let msg = Message::call(
            3u64,
            vec!["add".into()],
            vec![EncodedValue::inline(2), EncodedValue::inline(3)],
        );
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "id": 3,
                "type": "call",
                "keyChain": ["add"],
                "args": [
                    {"type": "any", "data": 2},
                    {"type": "any", "data": 3},
                ],
            }),
        );
    }

    #[test]
    fn construct_wire_shape() {
        let msg = Message::construct(4u64, vec!["Counter".into()], vec![]);
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"id": 4, "type": "construct", "keyChain": ["Counter"], "args": []}),
        );
    }

    #[test]
    fn response_wire_shape() {
        let msg = Message::response(3u64, EncodedValue::inline(5));
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"id": 3, "type": "response", "data": {"type": "any", "data": 5}}),
        );
    }

    #[test]
    fn error_wire_shape() {
        let msg = Message::error(9u64, "bad");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"id": 9, "type": "error", "error": "bad"}),
        );
    }

    #[test]
    fn wrapped_keeps_contract_spelling() {
        let encoded = serde_json::to_string(&EncodedValue::wrapped("oid")).unwrap();
        assert!(encoded.contains("\"wraped\""));
        assert!(!encoded.contains("\"wrapped\""));
    }

    #[test]
    fn inline_data_defaults_to_null() {
        let decoded: EncodedValue = serde_json::from_value(json!({"type": "any"})).unwrap();
        assert_eq!(decoded, EncodedValue::inline(Value::Null));
    }

    #[test]
    fn parses_peer_messages() {
        let raw = json!({
            "id": "req-1",
            "type": "call",
            "keyChain": ["apply"],
            "args": [{"type": "wraped", "id": 12}],
        });
        let msg: Message = serde_json::from_value(raw).unwrap();
        match msg {
            Message::Call { id, key_chain, args } => {
                assert_eq!(id, WireId::from("req-1"));
                assert_eq!(key_chain, vec!["apply".to_string()]);
                assert_eq!(args, vec![EncodedValue::wrapped(12u64)]);
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn request_classification() {
        assert!(Message::await_chain(1u64, vec![]).is_request());
        assert!(!Message::response(1u64, EncodedValue::inline(0)).is_request());
        assert!(!Message::error(1u64, "x").is_request());
    }
}
