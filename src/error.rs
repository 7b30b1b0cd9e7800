//! Normalized errors for every backend call.
//!
//! `Display` is the user-facing (Uzbek) message, so call sites can surface
//! `err.to_string()` directly.

use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

pub const NETWORK_MESSAGE: &str = "Internet aloqasi yo'q";
pub const TIMEOUT_MESSAGE: &str = "So'rov vaqti tugadi";
pub const AUTH_MISSING_MESSAGE: &str = "Tizimga kiring";
pub const DECODE_MESSAGE: &str = "Javobni o'qishda xatolik";
pub const REQUEST_FAILED_MESSAGE: &str = "So'rov bajarilmadi";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No connectivity, DNS failure, refused connection
    #[error("Internet aloqasi yo'q")]
    Network,

    #[error("So'rov vaqti tugadi")]
    Timeout,

    /// The backend answered with a non-2xx status or `success: false`
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The operation needs a token and none is stored
    #[error("Tizimga kiring")]
    AuthMissing,

    /// Superseded or torn down; never shown to the user
    #[error("So'rov bekor qilindi")]
    Cancelled,

    /// Rejected client-side before any request was sent
    #[error("{0}")]
    Validation(String),

    #[error("Javobni o'qishda xatolik")]
    Decode,

    #[error("Tokenni saqlab bo'lmadi: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Server { status: 401, .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Map a transport-level failure onto the stable error kinds.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            tracing::warn!("Failed to decode response body: {}", err);
            ApiError::Decode
        } else {
            tracing::debug!("Transport error: {}", err);
            ApiError::Network
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_user_message() {
        assert_eq!(ApiError::Network.to_string(), NETWORK_MESSAGE);
        assert_eq!(ApiError::Timeout.to_string(), TIMEOUT_MESSAGE);
        assert_eq!(ApiError::AuthMissing.to_string(), AUTH_MISSING_MESSAGE);
        assert_eq!(ApiError::Decode.to_string(), DECODE_MESSAGE);

        let server = ApiError::Server {
            status: 422,
            message: "Guruh topilmadi".to_string(),
        };
        assert_eq!(server.to_string(), "Guruh topilmadi");
    }

    #[test]
    fn test_network_and_timeout_are_distinct() {
        assert_ne!(ApiError::Network, ApiError::Timeout);
        assert_ne!(ApiError::Network.to_string(), ApiError::Timeout.to_string());
    }

    #[test]
    fn test_unauthorized_detection() {
        let err = ApiError::Server {
            status: 401,
            message: "Unauthenticated.".to_string(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));
        assert!(!ApiError::AuthMissing.is_unauthorized());
        assert!(ApiError::Cancelled.is_cancelled());
    }
}
