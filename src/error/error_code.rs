use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Closed set of numeric error codes placed on the wire.
///
/// The first five mirror the JSON-RPC 2.0 reserved codes; the remainder live
/// in the implementation-defined server range.
#[repr(i32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum ErrorCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
    ExecutionError = -32000,
    ConnectionClosed = -32001,
    Timeout = -32002,
    DuplicateRequestId = -32003,
    Overloaded = -32004,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        self.into()
    }

    pub fn default_message(self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::MethodNotFound => "Method not found",
            ErrorCode::InvalidParams => "Invalid params",
            ErrorCode::InternalError => "Internal error",
            ErrorCode::ExecutionError => "Execution error",
            ErrorCode::ConnectionClosed => "Connection closed",
            ErrorCode::Timeout => "Request timed out",
            ErrorCode::DuplicateRequestId => "Duplicate request id",
            ErrorCode::Overloaded => "Too many pending requests",
        }
    }

    /// Whether resending the identical request may succeed.
    ///
    /// Execution failures are reported as not retryable; a caller that knows
    /// its handler is idempotent may still choose to resend.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorCode::InternalError
                | ErrorCode::ConnectionClosed
                | ErrorCode::Timeout
                | ErrorCode::Overloaded
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.default_message(), self.code())
    }
}
