use crate::model::file_descriptor::FileDescriptor;
use std::sync::Arc;

/// Ordered, read-only set of files from one selection event, indexed from 0
#[derive(Debug, Clone, Default)]
pub struct FileQueue {
    files: Arc<[FileDescriptor]>,
}

impl FileQueue {
    pub fn new(files: Vec<FileDescriptor>) -> Self {
        FileQueue { files: files.into() }
    }

    /// File at the given position, or `None` once the queue is exhausted
    pub fn get(&self, index: usize) -> Option<&FileDescriptor> {
        self.files.get(index)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileDescriptor> {
        self.files.iter()
    }

    /// Sum of the sizes of every file in the queue
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.resolved_size()).sum()
    }
}

impl From<Vec<FileDescriptor>> for FileQueue {
    fn from(files: Vec<FileDescriptor>) -> Self {
        FileQueue::new(files)
    }
}
