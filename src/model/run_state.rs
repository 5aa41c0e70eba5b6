//! Mutable counters of an upload session
//!
//! Kept apart from [`SessionConfig`] so that configuration never changes
//! while uploads are running.

use crate::settings::session_config::SessionConfig;
use serde::Serialize;

/// Run state owned by the upload controller
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunState {
    sending: bool,
    /// Position in the current queue; `None` before a run starts
    index: Option<usize>,
    /// Counter behind display identifiers; never reset
    display_index: Option<u64>,
    /// Display identifiers of deliberately cancelled files, in abort order
    aborted: Vec<String>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn display_index(&self) -> Option<u64> {
        self.display_index
    }

    pub fn aborted(&self) -> &[String] {
        &self.aborted
    }

    pub fn was_aborted(&self, display_id: &str) -> bool {
        self.aborted.iter().any(|id| id == display_id)
    }

    /// Display index the next advance will use, plus `offset`
    pub fn upcoming_display_index(&self, offset: u64) -> u64 {
        self.display_index.map_or(0, |d| d + 1) + offset
    }

    /// Start of a new selection: the queue position starts over, display ids do not
    pub(crate) fn reset_index(&mut self) {
        self.index = None;
    }

    /// Move both counters forward by one and mark a request as outstanding
    pub(crate) fn advance(&mut self) -> (usize, u64) {
        let index = self.index.map_or(0, |i| i + 1);
        let display_index = self.upcoming_display_index(0);
        self.index = Some(index);
        self.display_index = Some(display_index);
        self.sending = true;
        (index, display_index)
    }

    pub(crate) fn finish(&mut self) {
        self.sending = false;
    }

    /// Record an aborted display id. Returns false when it was already recorded.
    pub(crate) fn record_abort(&mut self, display_id: String) -> bool {
        if self.was_aborted(&display_id) {
            return false;
        }
        self.aborted.push(display_id);
        true
    }
}

/// Configuration and run state as seen by callbacks
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub config: SessionConfig,
    pub state: RunState,
}

impl SessionSnapshot {
    /// Display identifier of the file the run state currently points at
    pub fn current_display_id(&self) -> Option<String> {
        self.state
            .display_index()
            .map(|d| self.config.display_id(d))
    }
}
