//! Wire format and inbound validation for the tether bridge.
//!
//! This crate fixes the byte-level contract between two bridge peers:
//! the [`Message`] tagged union (three request forms, two reply forms),
//! the [`EncodedValue`] inline-or-wrapped union, and the validation
//! rules every inbound value must pass before dispatch.
//!
//! The field names are part of the contract and case sensitive,
//! including the historical `wraped` spelling of the wrapped encoding.
//!
//! # Usage
//!
//! ```
//! use tether_wire::{parse_message, Message};
//! use serde_json::json;
//!
//! let raw = json!({"id": 1, "type": "await", "keyChain": ["a"]});
//! let msg = parse_message(&raw).unwrap();
//! assert!(msg.is_request());
//!
//! let hostile = json!({"id": 2, "type": "call", "keyChain": ["__proto__"], "args": []});
//! assert!(parse_message(&hostile).is_err());
//! ```

mod error;
mod message;
mod validate;

pub use error::WireError;
pub use message::{EncodedValue, Message};
pub use validate::{
    is_unsafe_key, parse_message, validate_keys, validate_message, RESERVED_KEY_FRAGMENTS,
};
