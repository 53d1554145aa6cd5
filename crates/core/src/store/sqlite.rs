//! SQLite-backed session and file store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{
    FileStore, NewFile, Session, SessionStore, StoreError, StoredFile, NEW_SESSION,
};
use crate::format::Format;
use crate::metrics::{SESSIONS_CREATED, SESSIONS_EXPIRED};

/// SQLite-backed store for sessions and their files.
///
/// A single connection is shared behind a mutex, so all store access is
/// serialized. Each operation runs in its own transaction which starts by
/// sweeping expired sessions.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    timeout: Duration,
}

fn db_err(action: &'static str) -> impl Fn(rusqlite::Error) -> StoreError {
    move |e| StoreError::database(action, e)
}

fn now_secs() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

fn secs_to_datetime(secs: f64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros((secs * 1_000_000.0) as i64).unwrap_or_default()
}

impl SqliteStore {
    /// Open (or create) the database file and its tables.
    pub fn new(path: &Path, timeout: Duration) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(db_err("opening database"))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            timeout,
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory(timeout: Duration) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db_err("opening database"))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            timeout,
        })
    }

    /// Session inactivity timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                last_changed_at REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS files (
                file_id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL REFERENCES sessions(session_id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                format TEXT NOT NULL,
                contents BLOB NOT NULL,
                converted INTEGER NOT NULL DEFAULT 0,
                revision TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_last_changed_at ON sessions(last_changed_at);
            CREATE INDEX IF NOT EXISTS idx_files_session ON files(session_id, converted);
            "#,
        )
        .map_err(db_err("creating database schema"))?;

        Self::add_revision_column(conn)
    }

    /// Databases created before uploads carried a revision lack the column.
    fn add_revision_column(conn: &Connection) -> Result<(), StoreError> {
        const ACTION: &str = "migrating database schema";

        let present = conn
            .prepare("SELECT 1 FROM pragma_table_info('files') WHERE name = 'revision'")
            .and_then(|mut stmt| stmt.exists([]))
            .map_err(db_err(ACTION))?;
        if !present {
            conn.execute_batch("ALTER TABLE files ADD COLUMN revision TEXT NOT NULL DEFAULT ''")
                .map_err(db_err(ACTION))?;
            info!("Added revision column to files table");
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::database("acquiring database connection", "mutex poisoned"))
    }

    /// Runs `f` inside a transaction, after sweeping expired sessions.
    ///
    /// The transaction is rolled back when `f` fails.
    fn transact<T>(
        &self,
        action: &'static str,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(db_err(action))?;
        Self::sweep(&tx, self.cutoff())?;
        let value = f(&tx)?;
        tx.commit().map_err(db_err(action))?;
        Ok(value)
    }

    /// Sessions last touched before this instant are expired.
    fn cutoff(&self) -> f64 {
        now_secs() - self.timeout.as_secs_f64()
    }

    fn sweep(conn: &Connection, cutoff: f64) -> Result<usize, StoreError> {
        const ACTION: &str = "removing expired sessions from database";

        conn.execute(
            "DELETE FROM files WHERE session_id IN (SELECT session_id FROM sessions WHERE last_changed_at < ?1)",
            params![cutoff],
        )
        .map_err(db_err(ACTION))?;

        let removed = conn
            .execute(
                "DELETE FROM sessions WHERE last_changed_at < ?1",
                params![cutoff],
            )
            .map_err(db_err(ACTION))?;

        if removed > 0 {
            info!(removed, "Expired sessions removed");
            SESSIONS_EXPIRED.inc_by(removed as u64);
        }

        Ok(removed)
    }

    fn session_exists(conn: &Connection, session_id: &str) -> Result<bool, StoreError> {
        conn.query_row(
            "SELECT 1 FROM sessions WHERE session_id = ?1",
            params![session_id],
            |_| Ok(()),
        )
        .optional()
        .map(|found| found.is_some())
        .map_err(db_err("looking up session in database"))
    }

    fn insert_file(conn: &Connection, file: &NewFile) -> Result<(), StoreError> {
        conn.execute(
            "INSERT INTO files (file_id, session_id, name, format, contents, converted, revision) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
            params![
                file.file_id,
                file.session_id,
                file.name,
                file.format.code(),
                file.contents,
                uuid::Uuid::new_v4().to_string(),
            ],
        )
        .map_err(db_err("inserting file data into database"))?;
        Ok(())
    }

    fn row_to_file(row: &rusqlite::Row) -> rusqlite::Result<StoredFile> {
        let format_code: String = row.get(3)?;
        let format = Format::from_code(&format_code).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                Type::Text,
                format!("unknown format code '{}'", format_code).into(),
            )
        })?;

        Ok(StoredFile {
            file_id: row.get(0)?,
            session_id: row.get(1)?,
            name: row.get(2)?,
            format,
            contents: row.get(4)?,
            converted: row.get(5)?,
            revision: row.get(6)?,
        })
    }
}

impl SessionStore for SqliteStore {
    fn touch_or_create(&self, session_id: &str) -> Result<String, StoreError> {
        self.transact("updating session data in database", |conn| {
            let now = now_secs();

            if session_id == NEW_SESSION {
                let id = uuid::Uuid::new_v4().to_string();
                conn.execute(
                    "INSERT INTO sessions (session_id, last_changed_at) VALUES (?1, ?2)",
                    params![id, now],
                )
                .map_err(db_err("inserting session data into database"))?;
                debug!(session_id = %id, "Session created");
                SESSIONS_CREATED.inc();
                return Ok(id);
            }

            let updated = conn
                .execute(
                    "UPDATE sessions SET last_changed_at = ?1 WHERE session_id = ?2",
                    params![now, session_id],
                )
                .map_err(db_err("updating session data in database"))?;

            if updated == 0 {
                return Err(StoreError::SessionNotFound(session_id.to_string()));
            }

            Ok(session_id.to_string())
        })
    }

    fn get_session(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        self.transact("getting session from database", |conn| {
            conn.query_row(
                "SELECT session_id, last_changed_at FROM sessions WHERE session_id = ?1",
                params![session_id],
                |row| {
                    Ok(Session {
                        session_id: row.get(0)?,
                        last_changed_at: secs_to_datetime(row.get(1)?),
                    })
                },
            )
            .optional()
            .map_err(db_err("getting session from database"))
        })
    }

    fn sweep_expired(&self) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(db_err("removing expired sessions from database"))?;
        let removed = Self::sweep(&tx, self.cutoff())?;
        tx.commit()
            .map_err(db_err("removing expired sessions from database"))?;
        Ok(removed)
    }
}

impl FileStore for SqliteStore {
    fn put(&self, file: NewFile) -> Result<(), StoreError> {
        self.transact("inserting file data into database", |conn| {
            if !Self::session_exists(conn, &file.session_id)? {
                return Err(StoreError::SessionNotFound(file.session_id.clone()));
            }
            Self::insert_file(conn, &file)
        })
    }

    fn replace_session_files(
        &self,
        session_id: &str,
        files: Vec<NewFile>,
    ) -> Result<(), StoreError> {
        self.transact("replacing session files in database", |conn| {
            if !Self::session_exists(conn, session_id)? {
                return Err(StoreError::SessionNotFound(session_id.to_string()));
            }

            let removed = conn
                .execute(
                    "DELETE FROM files WHERE session_id = ?1",
                    params![session_id],
                )
                .map_err(db_err("removing old files from database"))?;
            if removed > 0 {
                debug!(session_id, removed, "Previous session files removed");
            }

            for file in &files {
                Self::insert_file(conn, file)?;
            }
            Ok(())
        })
    }

    fn clear_session(&self, session_id: &str) -> Result<usize, StoreError> {
        self.transact("removing old files from database", |conn| {
            conn.execute(
                "DELETE FROM files WHERE session_id = ?1",
                params![session_id],
            )
            .map_err(db_err("removing old files from database"))
        })
    }

    fn get(&self, session_id: &str, converted: bool) -> Result<Vec<StoredFile>, StoreError> {
        self.transact("getting files from database", |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT file_id, session_id, name, format, contents, converted, revision FROM files WHERE session_id = ?1 AND converted = ?2 ORDER BY rowid",
                )
                .map_err(db_err("getting files from database"))?;

            let rows = stmt
                .query_map(params![session_id, converted], Self::row_to_file)
                .map_err(db_err("getting files from database"))?;

            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_err("getting files from database"))
        })
    }

    fn mark_converted(
        &self,
        file: &StoredFile,
        new_name: &str,
        new_format: Format,
        new_contents: Vec<u8>,
    ) -> Result<(), StoreError> {
        self.transact("converting file in database", |conn| {
            let updated = conn
                .execute(
                    "UPDATE files SET name = ?1, format = ?2, contents = ?3, converted = 1 WHERE file_id = ?4 AND revision = ?5 AND converted = 0",
                    params![new_name, new_format.code(), new_contents, file.file_id, file.revision],
                )
                .map_err(db_err("converting file in database"))?;

            if updated == 0 {
                debug!(file_id = %file.file_id, "File replaced or removed during conversion");
                return Err(StoreError::FileNotFound(file.file_id.clone()));
            }
            Ok(())
        })
    }
}
