//! Persisted session and file records.

use chrono::{DateTime, Utc};

use crate::format::Format;

/// Session identifier a client sends to request a fresh session.
pub const NEW_SESSION: &str = "new";

/// File identifiers are derived from the uploaded name and the session.
pub fn file_id_for(name: &str, session_id: &str) -> String {
    format!("{}|{}", name, session_id)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: String,
    pub last_changed_at: DateTime<Utc>,
}

/// A file about to be inserted. Always stored unconverted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFile {
    pub file_id: String,
    pub session_id: String,
    pub name: String,
    pub format: Format,
    pub contents: Vec<u8>,
}

impl NewFile {
    pub fn new(
        session_id: impl Into<String>,
        name: impl Into<String>,
        format: Format,
        contents: Vec<u8>,
    ) -> Self {
        let session_id = session_id.into();
        let name = name.into();
        Self {
            file_id: file_id_for(&name, &session_id),
            session_id,
            name,
            format,
            contents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_id: String,
    pub session_id: String,
    pub name: String,
    pub format: Format,
    pub contents: Vec<u8>,
    pub converted: bool,
    /// Changes whenever the file is uploaded again under the same name.
    pub revision: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_file_derives_id() {
        let file = NewFile::new("abc", "cat.jpg", Format::Jpg, vec![1, 2, 3]);
        assert_eq!(file.file_id, "cat.jpg|abc");
        assert_eq!(file.session_id, "abc");
    }
}
