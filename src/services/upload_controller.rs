//! Upload queue state machine
//!
//! Uploads the files of one selection strictly in order over a single
//! transport. Each file goes through one advance transition and ends with
//! exactly one terminal event. The terminal event triggers the next advance,
//! whatever the outcome, until the queue is exhausted.

use crate::model::error::UploadError;
use crate::model::file_queue::FileQueue;
use crate::model::progress_event::ProgressEvent;
use crate::model::run_state::{RunState, SessionSnapshot};
use crate::model::upload_response::{classify, Outcome, TerminalResponse};
use crate::services::page::Page;
use crate::services::transport::{RequestId, Transport, TransportEvent, UploadRequest};
use crate::settings::callbacks::Callbacks;
use crate::settings::session_config::SessionConfig;

pub struct UploadController<T: Transport, P: Page> {
    config: SessionConfig,
    callbacks: Callbacks,
    state: RunState,
    queue: FileQueue,
    transport: T,
    page: P,
    next_request: RequestId,
    /// Request whose terminal event the controller is waiting for
    outstanding: Option<RequestId>,
}

impl<T: Transport, P: Page> UploadController<T, P> {
    pub fn new(config: SessionConfig, callbacks: Callbacks, transport: T, page: P) -> Self {
        UploadController {
            config,
            callbacks,
            state: RunState::new(),
            queue: FileQueue::default(),
            transport,
            page,
            next_request: RequestId::new(1),
            outstanding: None,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Request currently on the wire, if any
    pub fn outstanding(&self) -> Option<RequestId> {
        self.outstanding
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            config: self.config.clone(),
            state: self.state.clone(),
        }
    }

    /// Handle a selection event: start a new run over `files`
    pub fn select(&mut self, files: FileQueue) {
        if let Some(request) = self.outstanding.take() {
            tracing::warn!("New selection while {} is in flight, cancelling it", request);
            self.transport.abort();
        }
        tracing::info!("Starting upload run of {} file(s)", files.len());
        self.queue = files;
        self.state.reset_index();
        self.reset_progress();
        self.populate_display();
        self.advance();
    }

    /// Let the caller render a row for every selected file before any upload starts
    pub fn populate_display(&mut self) {
        let Some(populate) = self.callbacks.populate_display.as_mut() else {
            return;
        };
        for (offset, file) in self.queue.iter().enumerate() {
            let display_index = self.state.upcoming_display_index(offset as u64);
            populate(&self.config.display_id(display_index), file);
        }
    }

    /// Move to the next file in the queue and send it, or finish the run
    pub fn advance(&mut self) {
        let (index, display_index) = self.state.advance();
        let Some(file) = self.queue.get(index) else {
            self.complete_run();
            return;
        };

        let display_id = self.config.display_id(display_index);
        if let Some(pre_upload) = self.callbacks.pre_upload.as_mut() {
            pre_upload(file, &display_id);
        }

        let request_id = self.next_request;
        self.next_request = request_id.next();
        let url = self.config.endpoint_url();
        let request = UploadRequest::for_file(request_id, url, file, index, &display_id);
        tracing::debug!(
            "Sending {} ({}, {} bytes) as {} [{}]",
            file.resolved_name(),
            display_id,
            request.declared_size,
            request_id,
            index
        );
        self.outstanding = Some(request_id);
        self.transport.send(request);
    }

    /// Cancel the file currently uploading.
    ///
    /// Returns false when nothing was outstanding. The cancelled file still
    /// reaches a terminal outcome (a transport error) and the queue moves on.
    pub fn abort(&mut self) -> bool {
        if !self.state.is_sending() {
            return false;
        }
        let Some(display_index) = self.state.display_index() else {
            return false;
        };
        let display_id = self.config.display_id(display_index);
        if self.state.record_abort(display_id.clone()) {
            tracing::info!("Aborting upload of {}", display_id);
        }
        self.transport.abort();
        true
    }

    /// Dispatch an event raised by the transport
    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Progress { request, progress } => self.on_progress(request, progress),
            TransportEvent::Complete { request, response } => self.on_complete(request, response),
        }
    }

    pub fn on_progress(&mut self, request: RequestId, progress: ProgressEvent) {
        if self.outstanding != Some(request) {
            tracing::trace!("Ignoring progress of stale {}", request);
            return;
        }
        if let Some(callback) = self.callbacks.progress.as_mut() {
            callback(&progress, self.state.display_index().unwrap_or_default());
            return;
        }
        if let Some(percent) = progress.percent() {
            self.page.set_progress_width(self.config.progressbar_id(), percent);
        }
    }

    pub fn on_complete(&mut self, request: RequestId, response: TerminalResponse) {
        if self.outstanding != Some(request) {
            tracing::warn!("Ignoring terminal event of stale {}", request);
            return;
        }
        self.outstanding = None;

        match classify(response) {
            Outcome::Success { headers, response } => {
                tracing::info!("{} uploaded", self.current_display_id());
                if let Some(post_upload) = self.callbacks.post_upload.as_mut() {
                    post_upload(&headers, &response);
                }
            }
            Outcome::Rejected(response) => {
                tracing::info!(
                    "{} rejected by server with status {:?}",
                    self.current_display_id(),
                    response.status()
                );
                self.report(UploadError::server_rejected(response));
            }
            Outcome::Malformed(reason) => {
                tracing::warn!(
                    "{}: undecodable server response: {}",
                    self.current_display_id(),
                    reason
                );
                self.report(UploadError::server_status(200, self.snapshot()));
            }
            Outcome::Empty => {
                tracing::debug!("{}: empty response body", self.current_display_id());
            }
            Outcome::TransportFailure => {
                tracing::warn!("{}: request failed or was aborted", self.current_display_id());
                self.report(UploadError::transport(self.snapshot()));
            }
            Outcome::HttpStatus(status) => {
                tracing::warn!(
                    "{}: server answered with HTTP {}",
                    self.current_display_id(),
                    status
                );
                self.report(UploadError::server_status(status, self.snapshot()));
            }
        }

        self.advance();
    }

    fn complete_run(&mut self) {
        self.reset_progress();
        let snapshot = self.snapshot();
        if let Some(all_complete) = self.callbacks.all_complete.as_mut() {
            all_complete(&snapshot);
        }
        self.page.reset_form(self.config.form_id());
        self.state.finish();
        tracing::info!(
            "Upload run finished ({} file(s), {} aborted in session)",
            self.queue.len(),
            self.state.aborted().len()
        );
    }

    fn report(&mut self, error: UploadError) {
        match self.callbacks.error.as_mut() {
            Some(callback) => callback(&error),
            None => tracing::warn!(
                "Unhandled upload failure of {}: {}",
                self.current_display_id(),
                error
            ),
        }
    }

    /// The caller's progress handler owns the indicator when there is one
    fn reset_progress(&mut self) {
        if self.callbacks.progress.is_none() {
            self.page.set_progress_width(self.config.progressbar_id(), 0.0);
        }
    }

    fn current_display_id(&self) -> String {
        let display_index = self.state.display_index().unwrap_or_default();
        self.config.display_id(display_index)
    }
}
