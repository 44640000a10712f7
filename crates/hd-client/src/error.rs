//! Error taxonomy for resource-client operations.

use thiserror::Error;

/// Errors surfaced by resource-client operations.
///
/// `Unauthorized` is transport-level: the [`crate::ResourceClient`]
/// translates it into `AuthenticationFailed` (at login) or
/// `SessionExpired` (anywhere else) before callers see it. Every other
/// variant passes through to the initiating view unmodified; nothing is
/// retried.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("session expired, sign in again")]
    SessionExpired,

    #[error("unauthorized")]
    Unauthorized,

    #[error("access denied: {0}")]
    Forbidden(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("session storage error: {0}")]
    Storage(String),
}

/// Result type for resource-client operations.
pub type ApiResult<T> = Result<T, ApiError>;
