//! This module provides the upload machinery: the per-session controller, the
//! transports that carry files to the server and the host page they report to

pub mod console_page;
pub mod http_transport;
pub mod page;
pub mod transport;
pub mod upload_controller;
pub mod uploader;
