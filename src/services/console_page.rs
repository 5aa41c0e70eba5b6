use crate::services::page::Page;
use crate::utils::format_progress_bar;
use crossterm::cursor::MoveToColumn;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use std::io::Write;
use std::sync::{Arc, Mutex};

const BAR_WIDTH: usize = 30;

/// Text shown in front of the progress bar, shared with the callbacks that
/// know which file is uploading
#[derive(Debug, Clone, Default)]
pub struct ProgressLabel(Arc<Mutex<String>>);

impl ProgressLabel {
    pub fn set(&self, label: impl Into<String>) {
        let mut guard = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = label.into();
    }

    pub fn get(&self) -> String {
        self.0
            .lock()
            .map(|label| label.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

/// Terminal rendition of the host page: a single redrawn progress line
pub struct ConsolePage<W: Write + Send + 'static> {
    out: W,
    label: ProgressLabel,
}

impl<W: Write + Send + 'static> ConsolePage<W> {
    pub fn new(out: W, label: ProgressLabel) -> Self {
        ConsolePage { out, label }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn redraw(&mut self, line: &str) -> std::io::Result<()> {
        crossterm::queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(line)
        )?;
        self.out.flush()
    }
}

impl<W: Write + Send + 'static> Page for ConsolePage<W> {
    fn supports_file_list(&self) -> bool {
        true
    }

    fn set_progress_width(&mut self, _element_id: &str, percent: f64) {
        let line = format!(
            "{} {} {:>3.0}%",
            self.label.get(),
            format_progress_bar(percent, BAR_WIDTH),
            percent.clamp(0.0, 100.0)
        );
        if let Err(e) = self.redraw(line.trim_start()) {
            tracing::warn!("Failed drawing progress: {}", e);
        }
    }

    fn reset_form(&mut self, form_id: &str) {
        tracing::debug!("Resetting {}", form_id);
        self.label.set("");
        if let Err(e) = self.redraw("") {
            tracing::warn!("Failed clearing progress: {}", e);
        }
    }
}
