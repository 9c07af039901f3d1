//! Unified error code interface for tether crates.
//!
//! Every public error type in the workspace implements [`ErrorCode`]:
//! a stable UPPER_SNAKE_CASE code with a crate prefix (`WIRE_`,
//! `TRANSPORT_`, `RPC_`) plus a recoverability hint. Codes are API
//! contract; they do not change once defined.

/// Machine-readable error code contract.
///
/// # Example
///
/// ```
/// use tether_types::ErrorCode;
///
/// #[derive(Debug)]
/// enum LinkError {
///     Closed,
///     Busy,
/// }
///
/// impl ErrorCode for LinkError {
///     fn code(&self) -> &'static str {
///         match self {
///             Self::Closed => "LINK_CLOSED",
///             Self::Busy => "LINK_BUSY",
///         }
///     }
///
///     fn is_recoverable(&self) -> bool {
///         matches!(self, Self::Busy)
///     }
/// }
///
/// assert_eq!(LinkError::Closed.code(), "LINK_CLOSED");
/// assert!(LinkError::Busy.is_recoverable());
/// ```
pub trait ErrorCode {
    /// Returns the stable machine-readable code.
    fn code(&self) -> &'static str;

    /// Returns `true` when retrying the failed operation may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error code is well formed and carries the expected
/// crate prefix. Panics with a descriptive message otherwise.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "error code '{code}' must start with prefix '{expected_prefix}'",
    );
    assert!(
        is_upper_snake_case(code),
        "error code '{code}' must be UPPER_SNAKE_CASE",
    );
}

/// [`assert_error_code`] over every variant of an error enum.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
