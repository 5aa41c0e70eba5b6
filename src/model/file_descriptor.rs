//! Descriptor of a single selected file

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// MIME type used when nothing better is known about a file
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Where the bytes of a file come from
#[derive(Debug, Clone, PartialEq)]
pub enum FileContent {
    /// Content already held in memory
    Memory(Bytes),
    /// Content streamed from disk when the upload starts
    Path(PathBuf),
}

/// Immutable description of a file picked by the user.
///
/// Two naming conventions exist for the name and size fields. The legacy
/// `file_name`/`file_size` pair wins when it is present, otherwise the
/// regular `name`/`size` pair is used.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FileDescriptor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, rename = "fileName")]
    pub file_name: Option<String>,
    #[serde(default, rename = "fileSize")]
    pub file_size: Option<u64>,
    #[serde(default, rename = "type")]
    pub mime_type: String,
    #[serde(skip)]
    pub content: Option<FileContent>,
}

impl FileDescriptor {
    /// Create a descriptor for content held in memory
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        let content = content.into();
        FileDescriptor {
            name: Some(name.into()),
            size: Some(content.len() as u64),
            mime_type: mime_type.into(),
            content: Some(FileContent::Memory(content)),
            ..Default::default()
        }
    }

    /// Create a descriptor for a file on disk, guessing its MIME type from the extension
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        Ok(FileDescriptor {
            name: Some(name),
            size: Some(metadata.len()),
            mime_type,
            content: Some(FileContent::Path(path.to_path_buf())),
            ..Default::default()
        })
    }

    /// Create a descriptor using the legacy `fileName`/`fileSize` fields
    pub fn legacy(
        file_name: impl Into<String>,
        file_size: u64,
        mime_type: impl Into<String>,
    ) -> Self {
        FileDescriptor {
            file_name: Some(file_name.into()),
            file_size: Some(file_size),
            mime_type: mime_type.into(),
            ..Default::default()
        }
    }

    /// Attach content to the descriptor
    pub fn with_content(mut self, content: FileContent) -> Self {
        self.content = Some(content);
        self
    }

    /// Legacy file name, when it is present and not empty
    fn legacy_name(&self) -> Option<&str> {
        self.file_name.as_deref().filter(|name| !name.is_empty())
    }

    /// File name, probing the legacy field first
    pub fn resolved_name(&self) -> &str {
        self.legacy_name()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }

    /// File size in bytes, following the same convention as [`Self::resolved_name`]
    pub fn resolved_size(&self) -> u64 {
        if self.legacy_name().is_some() {
            self.file_size.unwrap_or_default()
        } else {
            self.size.unwrap_or_default()
        }
    }

    pub fn mime_type(&self) -> &str {
        if self.mime_type.is_empty() {
            FALLBACK_MIME_TYPE
        } else {
            &self.mime_type
        }
    }
}
