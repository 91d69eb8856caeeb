use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchErrorCode {
    InvalidArgument,
    Internal,
    NotFound,
    PermissionDenied,
    Unauthenticated,
    Unavailable,
    DeadlineExceeded,
    ResourceExhausted,
    Cancelled,
    Aborted,
}

impl WatchErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchErrorCode::InvalidArgument => "watch/invalid-argument",
            WatchErrorCode::Internal => "watch/internal",
            WatchErrorCode::NotFound => "watch/not-found",
            WatchErrorCode::PermissionDenied => "watch/permission-denied",
            WatchErrorCode::Unauthenticated => "watch/unauthenticated",
            WatchErrorCode::Unavailable => "watch/unavailable",
            WatchErrorCode::DeadlineExceeded => "watch/deadline-exceeded",
            WatchErrorCode::ResourceExhausted => "watch/resource-exhausted",
            WatchErrorCode::Cancelled => "watch/cancelled",
            WatchErrorCode::Aborted => "watch/aborted",
        }
    }

    /// Maps the numeric gRPC status carried by a target removal cause.
    pub fn from_grpc_status(code: i32) -> Self {
        match code {
            1 => WatchErrorCode::Cancelled,
            3 => WatchErrorCode::InvalidArgument,
            4 => WatchErrorCode::DeadlineExceeded,
            5 => WatchErrorCode::NotFound,
            7 => WatchErrorCode::PermissionDenied,
            8 => WatchErrorCode::ResourceExhausted,
            10 => WatchErrorCode::Aborted,
            14 => WatchErrorCode::Unavailable,
            16 => WatchErrorCode::Unauthenticated,
            _ => WatchErrorCode::Internal,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchError {
    pub code: WatchErrorCode,
    message: String,
}

impl WatchError {
    pub fn new(code: WatchErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Builds an error from a gRPC status code and an optional server message.
    pub fn from_status(code: i32, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| "watch target error".to_string());
        Self::new(WatchErrorCode::from_grpc_status(code), message)
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for WatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl Error for WatchError {}

pub type WatchResult<T> = Result<T, WatchError>;

pub fn invalid_argument(message: impl Into<String>) -> WatchError {
    WatchError::new(WatchErrorCode::InvalidArgument, message)
}

pub fn permission_denied(message: impl Into<String>) -> WatchError {
    WatchError::new(WatchErrorCode::PermissionDenied, message)
}

pub fn unavailable(message: impl Into<String>) -> WatchError {
    WatchError::new(WatchErrorCode::Unavailable, message)
}
