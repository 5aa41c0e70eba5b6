/// The host environment the uploader is embedded in.
///
/// Owns the visual progress indicator and the form wrapping the file control.
#[cfg_attr(test, mockall::automock)]
pub trait Page: Send + 'static {
    /// Whether the host can hand over lists of selected files at all
    fn supports_file_list(&self) -> bool;

    /// Set the width of the progress element, in percent
    fn set_progress_width(&mut self, element_id: &str, percent: f64);

    /// Clear the form wrapping the file control after a run
    fn reset_form(&mut self, form_id: &str);
}
