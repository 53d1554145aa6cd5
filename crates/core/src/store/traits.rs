//! Storage traits.

use super::{NewFile, Session, StoreError, StoredFile};
use crate::format::Format;

/// Persistent mapping from session identifier to last activity.
pub trait SessionStore: Send + Sync {
    /// Create a session when `session_id` is `"new"`, otherwise refresh the
    /// activity timestamp of an existing one. Returns the session identifier.
    fn touch_or_create(&self, session_id: &str) -> Result<String, StoreError>;

    /// Get a live session.
    fn get_session(&self, session_id: &str) -> Result<Option<Session>, StoreError>;

    /// Delete expired sessions and their files. Returns the number of
    /// sessions removed.
    fn sweep_expired(&self) -> Result<usize, StoreError>;
}

/// Persistent file contents keyed by file identifier.
pub trait FileStore: Send + Sync {
    /// Insert a single unconverted file.
    fn put(&self, file: NewFile) -> Result<(), StoreError>;

    /// Atomically delete every file of the session, then insert `files`.
    fn replace_session_files(
        &self,
        session_id: &str,
        files: Vec<NewFile>,
    ) -> Result<(), StoreError>;

    /// Delete every file of the session. Returns the number removed.
    fn clear_session(&self, session_id: &str) -> Result<usize, StoreError>;

    /// Files of the session with the given converted flag, in upload order.
    fn get(&self, session_id: &str, converted: bool) -> Result<Vec<StoredFile>, StoreError>;

    /// Overwrite a pending file with its converted form and flag it converted.
    ///
    /// Fails with `FileNotFound` when the row read as `file` is gone, was
    /// uploaded again since, or is already converted.
    fn mark_converted(
        &self,
        file: &StoredFile,
        new_name: &str,
        new_format: Format,
        new_contents: Vec<u8>,
    ) -> Result<(), StoreError>;
}
