//! Error types for Authenticator Desktop

use serde::ser::SerializeStruct;
use serde::Serialize;
use thiserror::Error;

/// Application error type.
///
/// Only infrastructure failures live here. A negative verification or
/// authorization result is a normal `Ok(false)` response, never an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Cannot get current user.")]
    UserResolution,

    #[error("Could not start authentication session.")]
    SessionStart,

    #[error("Credential verification failed: {0}")]
    Verification(String),

    #[error("No graphical prompt helper is available.")]
    PromptHelperUnavailable,

    #[error("Policy authority unavailable: {0}")]
    PolicyUnavailable(String),

    #[error("Authorization check failed: {0}")]
    AuthorizationCheck(String),

    #[error("Authentication request was cancelled.")]
    Cancelled,
}

impl Error {
    /// Error code surfaced to the UI layer alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            Error::UserResolution | Error::Verification(_) | Error::PromptHelperUnavailable => {
                "authError"
            }
            Error::SessionStart | Error::PolicyUnavailable(_) => "authInitError",
            Error::AuthorizationCheck(_) | Error::Cancelled => "authCheckError",
        }
    }
}

/// Result type for commands
pub type Result<T> = std::result::Result<T, Error>;

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut s = serializer.serialize_struct("Error", 2)?;
        s.serialize_field("code", self.code())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}
