//! Wire layer errors.
//!
//! Everything the validator can reject, plus the catch-all for values
//! that pass structural checks but still fail typed parsing. All
//! variants carry the `WIRE_` code prefix and none are recoverable:
//! a malformed message does not become well formed on retry.

use tether_types::ErrorCode;
use thiserror::Error;

/// Rejection of an inbound wire value.
///
/// The display text of these errors travels back to the peer inside
/// `{type:"error"}` replies, so it names the problem without naming
/// internals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// The top-level value is not a JSON object.
    #[error("message is not an object")]
    NotAnObject,

    /// The `id` field is missing, or is neither an integer nor a string.
    #[error("message id is missing or not an integer or string")]
    InvalidId,

    /// The `type` field is missing or not a string.
    #[error("message type is missing or not a string")]
    InvalidType,

    /// The `keyChain` field is missing or not an array of strings.
    #[error("keyChain is missing or not an array of strings")]
    InvalidKeyChain,

    /// A key contains one of the reserved name fragments.
    #[error("unsafe property names in key chain: {0}")]
    UnsafeKey(String),

    /// The `args` field of a call or construct is missing or not an array.
    #[error("args is missing or not an array")]
    InvalidArgs,

    /// Structurally plausible but failed typed parsing.
    #[error("malformed message: {0}")]
    Malformed(String),
}

impl ErrorCode for WireError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotAnObject => "WIRE_NOT_AN_OBJECT",
            Self::InvalidId => "WIRE_INVALID_ID",
            Self::InvalidType => "WIRE_INVALID_TYPE",
            Self::InvalidKeyChain => "WIRE_INVALID_KEY_CHAIN",
            Self::UnsafeKey(_) => "WIRE_UNSAFE_KEY",
            Self::InvalidArgs => "WIRE_INVALID_ARGS",
            Self::Malformed(_) => "WIRE_MALFORMED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_types::assert_error_codes;

    fn all_variants() -> Vec<WireError> {
        vec![
            WireError::NotAnObject,
            WireError::InvalidId,
            WireError::InvalidType,
            WireError::InvalidKeyChain,
            WireError::UnsafeKey("__proto__".into()),
            WireError::InvalidArgs,
            WireError::Malformed("x".into()),
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "WIRE_");
    }

    #[test]
    fn nothing_is_recoverable() {
        for err in all_variants() {
            assert!(!err.is_recoverable(), "{err:?}");
        }
    }

    #[test]
    fn unsafe_key_names_the_problem() {
        let err = WireError::UnsafeKey("a.__proto__".into());
        assert!(err.to_string().contains("unsafe property names"));
    }
}
