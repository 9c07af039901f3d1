//! RPC layer errors.
//!
//! Two families, split by audience:
//!
//! - [`RpcError`] is what a caller awaiting a proxy operation sees.
//! - [`DispatchError`] is what the dispatcher produces while serving a
//!   request; its display text becomes the `error` field of the reply
//!   and is all the caller's realm ever learns about the failure. The
//!   original stack does not survive the transport.

use tether_types::ErrorCode;
use tether_wire::WireError;
use thiserror::Error;

/// Failure of a proxy operation, as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// The peer answered with an error reply. The payload is the
    /// message the remote side reported, verbatim.
    #[error("{0}")]
    Remote(String),

    /// The session collapsed while the request was pending: every
    /// proxy and the listener for this session are gone. A merely
    /// silent transport does not produce this; such requests stay
    /// pending forever.
    #[error("rpc session closed")]
    SessionClosed,

    /// A local message could not be turned into wire form.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ErrorCode for RpcError {
    fn code(&self) -> &'static str {
        match self {
            Self::Remote(_) => "RPC_REMOTE",
            Self::SessionClosed => "RPC_SESSION_CLOSED",
            Self::Protocol(_) => "RPC_PROTOCOL",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Failure while serving one inbound request.
///
/// Formatted into the wire error string; variants that relay a remote
/// or user-supplied message display that message bare, so it reaches
/// the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The message failed structural validation or typed parsing.
    #[error(transparent)]
    Invalid(#[from] WireError),

    /// The chain walk hit a missing or non-traversable member.
    #[error("missing property '{key}' in key chain")]
    MissingProperty {
        /// The key that did not resolve.
        key: String,
    },

    /// A `call` resolved to something that is not a function.
    #[error("call target is not a function")]
    NotCallable,

    /// A `construct` resolved to something that is not a constructor.
    #[error("construct target is not a constructor")]
    NotConstructible,

    /// The exposed function or constructor reported failure; displays
    /// the reported message verbatim.
    #[error("{0}")]
    User(String),
}

impl ErrorCode for DispatchError {
    fn code(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "RPC_INVALID_MESSAGE",
            Self::MissingProperty { .. } => "RPC_MISSING_PROPERTY",
            Self::NotCallable => "RPC_NOT_CALLABLE",
            Self::NotConstructible => "RPC_NOT_CONSTRUCTIBLE",
            Self::User(_) => "RPC_USER",
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

    #[test]
    fn rpc_error_codes_valid() {
        assert_error_codes(
            &[
                RpcError::Remote("x".into()),
                RpcError::SessionClosed,
                RpcError::Protocol("x".into()),
            ],
            "RPC_",
        );
    }

    #[test]
    fn dispatch_error_codes_valid() {
        assert_error_codes(
            &[
                DispatchError::Invalid(WireError::NotAnObject),
                DispatchError::MissingProperty { key: "x".into() },
                DispatchError::NotCallable,
                DispatchError::NotConstructible,
                DispatchError::User("x".into()),
            ],
            "RPC_",
        );
    }

    #[test]
    fn user_errors_display_bare() {
        assert_eq!(DispatchError::User("bad".into()).to_string(), "bad");
        assert_eq!(RpcError::Remote("bad".into()).to_string(), "bad");
    }

    #[test]
    fn validation_text_passes_through() {
        let err = DispatchError::from(WireError::UnsafeKey("__proto__".into()));
        assert!(err.to_string().contains("unsafe property names"));
    }
}
