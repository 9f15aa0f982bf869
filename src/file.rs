//! Files offered to the uploader
use std::path::Path;

use bytes::Bytes;

use crate::error::{Result, UploaderError};

/// A file chosen by the user
///
/// Only the name and the size matter to the uploader's checks.  The contents
/// are carried along so the same value can be handed to the upload request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    contents: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Reads a file from disk, using its file name as the display name
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                UploaderError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{} does not name a file", path.display()),
                ))
            })?
            .to_string();
        let contents = tokio::fs::read(path).await?;
        Ok(Self::new(name, contents))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The size of the file in bytes
    pub fn size(&self) -> u64 {
        self.contents.len() as u64
    }

    pub fn contents(&self) -> &Bytes {
        &self.contents
    }
}
