//! The error taxonomy shared by the store, the sync gateway and the application controller.

use std::fmt::Display;

/// Errors produced by this crate.
///
/// None of these are fatal to a running application. `Parse` problems are recovered by
/// defaulting, `Remote` problems by falling back to local storage, and `Validation` problems are
/// rejected before anything is written.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A persisted or imported document could not be parsed.
    #[error("Unable to parse data: {0}")]
    Parse(String),

    /// The remote service answered with a non-success status, or could not be reached at all
    /// (in which case `status` is `None`).
    #[error("{message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },

    /// User input was missing or invalid, or the operation is not allowed in the current state.
    #[error("{0}")]
    Validation(String),

    /// Reading or writing local files failed.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn parse(message: impl Display) -> Self {
        Error::Parse(message.to_string())
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Builds a `Remote` error from a failed HTTP status and its body text. An empty body is
    /// replaced with `HTTP {status}`.
    pub(crate) fn http(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = if body.is_empty() {
            format!("HTTP {status}")
        } else {
            body
        };
        Error::Remote {
            status: Some(status),
            message,
        }
    }

    /// Builds a `Remote` error for a request that never received a response.
    pub(crate) fn transport(message: impl Display) -> Self {
        Error::Remote {
            status: None,
            message: message.to_string(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Remote { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::parse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_uses_body() {
        let e = Error::http(500, "database is down");
        assert_eq!(e.to_string(), "database is down");
        assert!(e.is_remote());
    }

    #[test]
    fn test_http_error_empty_body() {
        let e = Error::http(404, "");
        assert_eq!(e.to_string(), "HTTP 404");
        match e {
            Error::Remote { status, .. } => assert_eq!(status, Some(404)),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_storage_error_is_transparent() {
        let e: Error = anyhow::anyhow!("Unable to write to /nowhere").into();
        assert_eq!(e.to_string(), "Unable to write to /nowhere");
        assert!(!e.is_remote());
    }
}
