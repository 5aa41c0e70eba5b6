//! Transport abstraction: one reusable request object per session
//!
//! A transport sends a single request at a time and reports back through
//! two channels carried by [`TransportEvent`]: repeated progress events and
//! exactly one terminal event per request.

use crate::model::file_descriptor::{FileContent, FileDescriptor};
use crate::model::progress_event::ProgressEvent;
use crate::model::upload_response::TerminalResponse;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tokio::sync::mpsc::UnboundedSender;

pub const UPLOAD_CONTENT_TYPE: &str = "application/octet-stream; charset=UTF-8";
pub const X_FILE_NAME: &str = "x-file-name";
pub const X_FILE_SIZE: &str = "x-file-size";
pub const X_FILE_TYPE: &str = "x-file-type";
pub const X_INDEX: &str = "x-index";
pub const X_ID: &str = "x-id";

/// Characters escaped in header values; non-ASCII bytes are always escaped
const HEADER_VALUE: &AsciiSet = &CONTROLS.add(b'%');

/// Identifies one request across its asynchronous events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(id: u64) -> Self {
        RequestId(id)
    }

    pub fn next(self) -> Self {
        RequestId(self.0 + 1)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Request-{}", self.0)
    }
}

/// Event raised by a transport for the request it is carrying
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Progress { request: RequestId, progress: ProgressEvent },
    Complete { request: RequestId, response: TerminalResponse },
}

impl TransportEvent {
    pub fn request(&self) -> RequestId {
        match self {
            TransportEvent::Progress { request, .. } => *request,
            TransportEvent::Complete { request, .. } => *request,
        }
    }
}

pub type EventSender = UnboundedSender<TransportEvent>;

/// A fully prepared upload request
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub id: RequestId,
    pub url: String,
    pub headers: HeaderMap,
    /// Size announced in `X-File-Size`. The body length is taken from the content itself.
    pub declared_size: u64,
    pub body: Option<FileContent>,
}

impl UploadRequest {
    /// Build the POST request for `file` at queue position `index`
    pub fn for_file(
        id: RequestId,
        url: &str,
        file: &FileDescriptor,
        index: usize,
        display_id: &str,
    ) -> Self {
        let size = file.resolved_size();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(UPLOAD_CONTENT_TYPE));
        insert_header(&mut headers, X_FILE_NAME, file.resolved_name());
        insert_header(&mut headers, X_FILE_SIZE, &size.to_string());
        insert_header(&mut headers, X_FILE_TYPE, file.mime_type());
        insert_header(&mut headers, X_INDEX, &index.to_string());
        insert_header(&mut headers, X_ID, display_id);

        UploadRequest {
            id,
            url: url.to_string(),
            headers,
            declared_size: size,
            body: file.content.clone(),
        }
    }
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    let encoded = utf8_percent_encode(value, HEADER_VALUE).to_string();
    match HeaderValue::from_str(&encoded) {
        Ok(value) => {
            headers.insert(HeaderName::from_static(name), value);
        }
        Err(e) => tracing::warn!("Dropping header {}: {}", name, e),
    }
}

/// The single request object reused for every file of a session.
///
/// Implementations report through the sender given to [`Transport::wire`]
/// and must produce exactly one [`TransportEvent::Complete`] per request
/// they start, using status 0 for network failures and cancellation.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + 'static {
    /// Connect the progress and terminal channels
    fn wire(&mut self, events: EventSender);

    /// Start sending. Replaces any request still in flight without reporting it.
    fn send(&mut self, request: UploadRequest);

    /// Cancel the request in flight; it then completes with status 0
    fn abort(&mut self);
}
