//! Inbound message validation.
//!
//! Every message arriving from the peer passes [`validate_message`]
//! before anything dereferences it: the dispatcher runs it on requests,
//! the client runs the typed parse on replies. Structural rules first,
//! then the key safety rule.
//!
//! # Key Safety
//!
//! A key chain is rejected when any key *contains* one of the
//! [`RESERVED_KEY_FRAGMENTS`] as a substring, ignoring ASCII case.
//! Substring matching is deliberately stricter than equality: it also
//! closes near-misses like `"x__proto__y"`, at the cost of rejecting
//! benign names such as `myConstructor`.

use crate::error::WireError;
use crate::message::Message;
use serde_json::Value;

/// Name fragments that never appear in a valid key chain.
pub const RESERVED_KEY_FRAGMENTS: [&str; 3] = ["__proto__", "prototype", "constructor"];

/// Returns `true` if `key` contains any reserved fragment, ignoring
/// ASCII case.
#[must_use]
pub fn is_unsafe_key(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    RESERVED_KEY_FRAGMENTS
        .iter()
        .any(|fragment| lowered.contains(fragment))
}

/// Checks every key of a chain against the safety rule.
///
/// # Errors
///
/// Returns [`WireError::UnsafeKey`] naming the first offending key.
pub fn validate_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Result<(), WireError> {
    for key in keys {
        if is_unsafe_key(key) {
            return Err(WireError::UnsafeKey(key.to_string()));
        }
    }
    Ok(())
}

/// Structurally validates a raw inbound value as a wire message.
///
/// Rules, in order:
///
/// 1. the value is a JSON object
/// 2. `id` is present and is an integer or string
/// 3. `type` is present and is a string
/// 4. for `call`/`construct`/`await`: `keyChain` is an array of strings
/// 5. every key passes the safety rule
/// 6. for `call`/`construct`: `args` is an array
///
/// Reply types (`response`, `error`) and unknown types only pass rules
/// 1 to 3 here; their bodies are checked by the typed parse.
///
/// # Errors
///
/// The first violated rule, as a [`WireError`].
pub fn validate_message(raw: &Value) -> Result<(), WireError> {
    let object = raw.as_object().ok_or(WireError::NotAnObject)?;

    let id = object.get("id").ok_or(WireError::InvalidId)?;
    if !(id.is_u64() || id.is_string()) {
        return Err(WireError::InvalidId);
    }

    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or(WireError::InvalidType)?;

    if matches!(kind, "call" | "construct" | "await") {
        let chain = object
            .get("keyChain")
            .and_then(Value::as_array)
            .ok_or(WireError::InvalidKeyChain)?;
        let mut keys = Vec::with_capacity(chain.len());
        for key in chain {
            keys.push(key.as_str().ok_or(WireError::InvalidKeyChain)?);
        }
        validate_keys(keys)?;
    }

    if matches!(kind, "call" | "construct")
        && !object.get("args").map_or(false, Value::is_array)
    {
        return Err(WireError::InvalidArgs);
    }

    Ok(())
}

/// Validates and then parses a raw value into a typed [`Message`].
///
/// # Errors
///
/// [`validate_message`] failures, or [`WireError::Malformed`] when the
/// value passes structural checks but does not deserialize (unknown
/// type string, wrong argument encoding, and so on).
pub fn parse_message(raw: &Value) -> Result<Message, WireError> {
    validate_message(raw)?;
    serde_json::from_value(raw.clone()).map_err(|err| WireError::Malformed(err.to_string()))
}
