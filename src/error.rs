//! Failure taxonomy for Bring API calls.

use reqwest::StatusCode;

/// Failures surfaced by the client.
///
/// Every fallible operation in this crate fails with one of these three
/// variants, so callers can match broadly on [`Error`] or narrowly on a
/// single variant.
#[derive(Debug)]
pub enum Error {
    /// Credential or session failures: login rejected, token refresh
    /// rejected, or an HTTP 401 that survived the single re-authentication
    /// retry.
    Auth(String),
    /// Transport failures and non-2xx responses. `status` is `None` when
    /// the request never produced a response.
    Request {
        status: Option<StatusCode>,
        body: String,
    },
    /// Response body was not valid JSON of the expected shape.
    Parse(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Auth(msg) => {
                write!(f, "Authentication failed: {}", msg)
            }
            Error::Request {
                status: Some(status),
                body,
            } => {
                write!(f, "Request failed with HTTP {}: {}", status.as_u16(), body)
            }
            Error::Request { status: None, body } => {
                write!(f, "Request failed: {}", body)
            }
            Error::Parse(msg) => {
                write!(f, "Cannot parse response: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// Maps a transport-level failure (connect, timeout, body read) onto the
/// taxonomy. Decode failures from `reqwest` are parse failures; everything
/// else never produced a usable response.
pub fn classify_transport(error: reqwest::Error) -> Error {
    if error.is_decode() {
        return Error::Parse(error.to_string());
    }
    Error::Request {
        status: error.status(),
        body: error.to_string(),
    }
}

/// Maps a non-2xx status onto the taxonomy. 401 becomes [`Error::Auth`] so
/// the client can re-authenticate and retry the call once.
pub fn classify_status(status: StatusCode, body: String) -> Error {
    if status == StatusCode::UNAUTHORIZED {
        return Error::Auth(format!("session rejected (HTTP 401): {}", body));
    }
    Error::Request {
        status: Some(status),
        body,
    }
}
