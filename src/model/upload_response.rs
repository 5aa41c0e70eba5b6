//! Server response decoding and terminal outcome classification

use http::HeaderMap;
use serde::Serialize;
use serde_json::Value;

/// Value of the `status` field that marks a successful upload
pub const STATUS_OK: &str = "OK";

/// Decoded JSON body returned by the upload endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UploadResponse(Value);

impl UploadResponse {
    /// Decode a response body. The body is treated strictly as data.
    pub fn parse(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body).map(UploadResponse)
    }

    /// The `status` field, when present and a string
    pub fn status(&self) -> Option<&str> {
        self.0.get("status").and_then(Value::as_str)
    }

    pub fn is_ok(&self) -> bool {
        self.status() == Some(STATUS_OK)
    }

    /// Any other field of the response
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Final state of a request as reported by the transport
#[derive(Debug, Clone, Default)]
pub struct TerminalResponse {
    /// HTTP status, or 0 when the request never produced one
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl TerminalResponse {
    /// A request that failed or was cancelled before a response arrived
    pub fn transport_failure() -> Self {
        TerminalResponse::default()
    }
}

/// How a terminal response is interpreted
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success { headers: HeaderMap, response: UploadResponse },
    /// HTTP 200 but the status field is not "OK"
    Rejected(UploadResponse),
    /// HTTP 200 with a body that is not valid JSON
    Malformed(String),
    /// HTTP 200 with an empty body
    Empty,
    /// Status 0: network failure or abort
    TransportFailure,
    /// Any other HTTP status
    HttpStatus(u16),
}

/// Classify a terminal response
pub fn classify(response: TerminalResponse) -> Outcome {
    match response.status {
        0 => Outcome::TransportFailure,
        200 if response.body.is_empty() => Outcome::Empty,
        200 => match UploadResponse::parse(&response.body) {
            Ok(parsed) if parsed.is_ok() => Outcome::Success {
                headers: response.headers,
                response: parsed,
            },
            Ok(parsed) => Outcome::Rejected(parsed),
            Err(e) => Outcome::Malformed(e.to_string()),
        },
        status => Outcome::HttpStatus(status),
    }
}
