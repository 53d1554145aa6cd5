//! Session and file persistence.
//!
//! Sessions group uploaded files and carry the expiry clock. Every store
//! operation first sweeps sessions idle for longer than the configured
//! timeout, so an expired session is never served.

mod error;
mod sqlite;
mod traits;
mod types;

pub use error::StoreError;
pub use sqlite::SqliteStore;
pub use traits::{FileStore, SessionStore};
pub use types::{file_id_for, NewFile, Session, StoredFile, NEW_SESSION};
