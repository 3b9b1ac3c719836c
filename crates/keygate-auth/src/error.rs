//! Authentication error types.

use keygate_core::error::KeygateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown name or wrong secret — deliberately indistinguishable
    /// so callers cannot enumerate principals.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("malformed token: {0}")]
    TokenMalformed(String),

    #[error("token has expired")]
    TokenExpired,

    #[error("token signature invalid")]
    TokenSignatureInvalid,

    /// Cryptographically valid and unexpired, but no longer the
    /// principal's stored refresh token (already rotated away).
    #[error("stale refresh token")]
    TokenStale,

    /// No delegation relation registered for the requested triple.
    #[error("delegation denied")]
    DelegationDenied,

    #[error("cryptography error: {0}")]
    Crypto(String),

    /// Credential-store failure, passed through unchanged.
    #[error(transparent)]
    Store(#[from] KeygateError),
}

impl From<AuthError> for KeygateError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::TokenMalformed(_)
            | AuthError::TokenExpired
            | AuthError::TokenSignatureInvalid
            | AuthError::TokenStale => KeygateError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::DelegationDenied => KeygateError::AuthorizationDenied {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => KeygateError::Crypto(msg),
            AuthError::Store(inner) => inner,
        }
    }
}
