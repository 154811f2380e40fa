//! The unified error handling system for the login service.

use thiserror::Error;

/// A unified `Result` type for the entire application.
///
/// All functions that can fail should return this type.
pub type Result<T> = std::result::Result<T, OauthError>;

/// The primary error type for the OAuth login flows.
///
/// Transport and parsing failures from the provider adapters are converted
/// into one of these variants at the orchestrator boundary; raw provider
/// error text never reaches the user.
#[derive(Debug, Error)]
pub enum OauthError {
    /// The requested provider is disabled or has no configuration row.
    /// Surfaced to the user as a silent redirect home, never as an error page.
    #[error("provider not configured or disabled: {0}")]
    ConfigMissing(String),

    /// The token endpoint returned an unusable response (missing token field,
    /// transport failure, non-success status).
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// The access token was granted but the profile call failed.
    #[error("profile fetch failed: {0}")]
    ProfileFetch(String),

    /// A confirmation link carried a signature that does not match.
    /// Fail closed: the caller maps this to a bare 403.
    #[error("confirmation link signature mismatch")]
    InvalidSignature,

    /// Malformed user input, e.g. a syntactically invalid email address.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No `linked_identities` row with the given id.
    #[error("identity not found: {0}")]
    IdentityNotFound(i32),

    #[error("config error: {0}")]
    Config(String),

    #[error("mail dispatch failed: {0}")]
    Mail(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl OauthError {
    /// Create a token exchange error from any displayable cause.
    pub fn token_exchange<S: Into<String>>(msg: S) -> Self {
        Self::TokenExchange(msg.into())
    }

    /// Create a profile fetch error from any displayable cause.
    pub fn profile_fetch<S: Into<String>>(msg: S) -> Self {
        Self::ProfileFetch(msg.into())
    }

    /// Create a validation error from any displayable cause.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
}

impl<E> From<sea_orm::TransactionError<E>> for OauthError
where
    E: Into<OauthError> + std::error::Error,
{
    fn from(err: sea_orm::TransactionError<E>) -> Self {
        match err {
            sea_orm::TransactionError::Connection(e) => Self::Database(e),
            sea_orm::TransactionError::Transaction(e) => e.into(),
        }
    }
}
