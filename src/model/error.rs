//! Structured error types for uploader setup and per-file uploads

use crate::model::run_state::SessionSnapshot;
use crate::model::upload_response::UploadResponse;
use serde::Serialize;
use std::fmt;

/// Errors raised while attaching the uploader to a control.
///
/// All of them are fatal: the uploader never becomes active.
#[derive(Debug, Clone, PartialEq)]
pub enum InitError {
    /// The host has no file-list capability and no fallback callback was given
    UnsupportedEnvironment,
    /// The uploader was attached to something other than a file-selection control
    InvalidTarget(String),
    /// A required configuration value is empty
    MissingConfig(&'static str),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::UnsupportedEnvironment => {
                write!(f, "File uploads are not supported by this host")
            }
            InitError::InvalidTarget(id) => {
                write!(f, "Control '{}' is not a file-selection control", id)
            }
            InitError::MissingConfig(field) => {
                write!(f, "Missing configuration: {} must be defined", field)
            }
        }
    }
}

impl std::error::Error for InitError {}

/// The uploader behind a handle has shut down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploaderClosed;

impl fmt::Display for UploaderClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uploader is no longer running")
    }
}

impl std::error::Error for UploaderClosed {}

/// Which side of the connection a per-file failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Network failure or cancellation, always reported with status 0
    Transport,
    /// Non-200 status, or a 200 response whose status field is not "OK"
    Server,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Server => write!(f, "server"),
        }
    }
}

/// Context handed along with an [`UploadError`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    /// Decoded body of a response the server marked as failed
    Response(UploadResponse),
    /// Session configuration and run state at the time of the failure
    Session(Box<SessionSnapshot>),
}

/// Failure of a single file upload. Never fatal to the rest of the queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadError {
    pub kind: ErrorKind,
    pub status_code: u16,
    pub payload: ErrorPayload,
}

impl UploadError {
    pub fn transport(snapshot: SessionSnapshot) -> Self {
        UploadError {
            kind: ErrorKind::Transport,
            status_code: 0,
            payload: ErrorPayload::Session(Box::new(snapshot)),
        }
    }

    pub fn server_status(status_code: u16, snapshot: SessionSnapshot) -> Self {
        UploadError {
            kind: ErrorKind::Server,
            status_code,
            payload: ErrorPayload::Session(Box::new(snapshot)),
        }
    }

    pub fn server_rejected(response: UploadResponse) -> Self {
        UploadError {
            kind: ErrorKind::Server,
            status_code: 200,
            payload: ErrorPayload::Response(response),
        }
    }

    /// Session snapshot carried by transport and HTTP status failures
    pub fn session(&self) -> Option<&SessionSnapshot> {
        match &self.payload {
            ErrorPayload::Session(snapshot) => Some(snapshot),
            ErrorPayload::Response(_) => None,
        }
    }

    /// Server response carried by application-level rejections
    pub fn response(&self) -> Option<&UploadResponse> {
        match &self.payload {
            ErrorPayload::Response(response) => Some(response),
            ErrorPayload::Session(_) => None,
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            ErrorPayload::Response(response) => write!(
                f,
                "{} error (status {}): server reported status {}",
                self.kind,
                self.status_code,
                response.status().unwrap_or("<missing>")
            ),
            ErrorPayload::Session(_) => {
                write!(f, "{} error (status {})", self.kind, self.status_code)
            }
        }
    }
}

impl std::error::Error for UploadError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_error_display() {
        assert_eq!(
            format!("{}", InitError::MissingConfig("endpoint_url")),
            "Missing configuration: endpoint_url must be defined"
        );
        assert_eq!(
            format!("{}", InitError::InvalidTarget("submit".into())),
            "Control 'submit' is not a file-selection control"
        );
    }

    #[test]
    fn test_transport_error_always_status_zero() {
        let err = UploadError::transport(SessionSnapshot::default());
        assert_eq!(err.kind, ErrorKind::Transport);
        assert_eq!(err.status_code, 0);
        assert!(err.session().is_some());
        assert_eq!(format!("{}", err), "transport error (status 0)");
    }

    #[test]
    fn test_server_rejection_carries_response() {
        let response = UploadResponse::parse(r#"{"status":"FULL"}"#).unwrap();
        let err = UploadError::server_rejected(response);
        assert_eq!(err.kind, ErrorKind::Server);
        assert_eq!(err.status_code, 200);
        assert_eq!(err.response().and_then(|r| r.status()), Some("FULL"));
        assert_eq!(format!("{}", err), "server error (status 200): server reported status FULL");
    }
}
