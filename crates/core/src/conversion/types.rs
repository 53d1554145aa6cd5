//! Inputs and outcomes of the conversion service.

use serde::{Deserialize, Serialize};

/// Name given to the archive served when several files are downloaded.
pub const ARCHIVE_FILE_NAME: &str = "web-media-converter-converted-files.zip";

/// A file received from a client, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub contents: Vec<u8>,
}

/// Name and identifier of a stored file, as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub file_name: String,
    pub file_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub uploaded_files: Vec<FileSummary>,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOutcome {
    pub converted_files: Vec<FileSummary>,
    pub session_id: String,
}

/// Converted files ready to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Download {
    /// Exactly one converted file, served as-is.
    Single {
        file_name: String,
        content_type: String,
        contents: Vec<u8>,
    },
    /// Several converted files bundled into a zip archive.
    Archive { file_name: String, contents: Vec<u8> },
}

impl Download {
    pub fn file_name(&self) -> &str {
        match self {
            Download::Single { file_name, .. } | Download::Archive { file_name, .. } => file_name,
        }
    }

    pub fn contents(&self) -> &[u8] {
        match self {
            Download::Single { contents, .. } | Download::Archive { contents, .. } => contents,
        }
    }
}
