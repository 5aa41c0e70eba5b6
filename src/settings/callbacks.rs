//! Optional handlers invoked by the upload controller
//!
//! Every handler is optional. The controller checks for presence before each
//! call and falls back to its default behaviour (or a log line) otherwise.

use crate::model::error::UploadError;
use crate::model::file_descriptor::FileDescriptor;
use crate::model::progress_event::ProgressEvent;
use crate::model::run_state::SessionSnapshot;
use crate::model::upload_response::UploadResponse;
use http::HeaderMap;

/// Called instead of failing when the host cannot upload files
pub type UnsupportedCallback = Box<dyn FnMut() + Send>;
/// Replaces the default progress bar update.
/// Receives every progress event and the current display index.
pub type ProgressCallback = Box<dyn FnMut(&ProgressEvent, u64) + Send>;
/// Called once after the last file of a run reached its outcome
pub type AllCompleteCallback = Box<dyn FnMut(&SessionSnapshot) + Send>;
/// Called once per file before any upload starts, with the file's display id
pub type PopulateDisplayCallback = Box<dyn FnMut(&str, &FileDescriptor) + Send>;
/// Called right before a file's request is sent, with the file's display id
pub type PreUploadCallback = Box<dyn FnMut(&FileDescriptor, &str) + Send>;
/// Called on each successful upload with the response headers and body
pub type PostUploadCallback = Box<dyn FnMut(&HeaderMap, &UploadResponse) + Send>;
/// Called on each transport or server failure
pub type ErrorCallback = Box<dyn FnMut(&UploadError) + Send>;

#[derive(Default)]
pub struct Callbacks {
    pub unsupported: Option<UnsupportedCallback>,
    pub progress: Option<ProgressCallback>,
    pub all_complete: Option<AllCompleteCallback>,
    pub populate_display: Option<PopulateDisplayCallback>,
    pub pre_upload: Option<PreUploadCallback>,
    pub post_upload: Option<PostUploadCallback>,
    pub error: Option<ErrorCallback>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_unsupported(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.unsupported = Some(Box::new(f));
        self
    }

    pub fn on_progress(mut self, f: impl FnMut(&ProgressEvent, u64) + Send + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn on_all_complete(mut self, f: impl FnMut(&SessionSnapshot) + Send + 'static) -> Self {
        self.all_complete = Some(Box::new(f));
        self
    }

    pub fn on_populate_display(
        mut self,
        f: impl FnMut(&str, &FileDescriptor) + Send + 'static,
    ) -> Self {
        self.populate_display = Some(Box::new(f));
        self
    }

    pub fn on_pre_upload(mut self, f: impl FnMut(&FileDescriptor, &str) + Send + 'static) -> Self {
        self.pre_upload = Some(Box::new(f));
        self
    }

    pub fn on_post_upload(
        mut self,
        f: impl FnMut(&HeaderMap, &UploadResponse) + Send + 'static,
    ) -> Self {
        self.post_upload = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&UploadError) + Send + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("unsupported", &self.unsupported.is_some())
            .field("progress", &self.progress.is_some())
            .field("all_complete", &self.all_complete.is_some())
            .field("populate_display", &self.populate_display.is_some())
            .field("pre_upload", &self.pre_upload.is_some())
            .field("post_upload", &self.post_upload.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}
