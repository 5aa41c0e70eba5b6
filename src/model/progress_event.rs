/// Progress of the request currently in flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    pub loaded: u64,
    pub total: u64,
    /// False when the total size is unknown
    pub length_computable: bool,
}

impl ProgressEvent {
    pub fn new(loaded: u64, total: u64) -> Self {
        ProgressEvent {
            loaded,
            total,
            length_computable: total > 0,
        }
    }

    /// Percentage uploaded, only when the total is known
    pub fn percent(&self) -> Option<f64> {
        if !self.length_computable || self.total == 0 {
            return None;
        }
        Some(self.loaded as f64 / self.total as f64 * 100.0)
    }
}
