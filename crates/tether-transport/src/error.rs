//! Transport layer errors.

use tether_types::ErrorCode;
use thiserror::Error;

/// Failure to move a message through an endpoint.
///
/// Send failures are never propagated into pending request futures by
/// the RPC layer; they are logged and the request stays pending. The
/// error type exists so transport adapters can report the condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The endpoint has been closed and accepts no further messages.
    #[error("endpoint closed")]
    Closed,

    /// The transport rejected the message.
    #[error("send failed: {0}")]
    SendFailed(String),
}

impl ErrorCode for TransportError {
    fn code(&self) -> &'static str {
        match self {
            Self::Closed => "TRANSPORT_CLOSED",
            Self::SendFailed(_) => "TRANSPORT_SEND_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Closed => false,
            Self::SendFailed(_) => true,
        }
    }
}
