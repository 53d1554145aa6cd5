//! Upload, convert and download use cases over the stores and converter.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::archive::build_zip;
use super::error::ServiceError;
use super::types::{
    ConvertOutcome, Download, FileSummary, UploadOutcome, UploadedFile, ARCHIVE_FILE_NAME,
};
use crate::converter::{ConversionJob, Converter, ConverterConfig, ConverterError, ScratchPair};
use crate::format::{canonicalize, is_valid_format_conversion, parse_format, Format};
use crate::metrics::{
    CONVERSIONS_ACTIVE, CONVERSIONS_TOTAL, CONVERSION_DURATION, DOWNLOADS_TOTAL, FILES_UPLOADED,
};
use crate::store::{FileStore, NewFile, SessionStore, StoreError, StoredFile, NEW_SESSION};

/// Runs a store call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::internal("accessing database", e))?
        .map_err(ServiceError::from)
}

/// The part of a file name after its last dot, or the whole name.
fn extension_of(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// `name` with its last extension replaced by the target's.
fn converted_name(name: &str, target: Format) -> String {
    let stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name);
    format!("{}.{}", stem, target.extension())
}

fn not_found_for(session_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("File not found for session_id: '{}'", session_id))
}

/// Session-scoped media conversion.
///
/// Conversions from all requests share one pool of
/// `max_parallel_conversions` worker slots. Within a request, files are
/// converted one after another in upload order.
pub struct ConversionService {
    sessions: Arc<dyn SessionStore>,
    files: Arc<dyn FileStore>,
    converter: Arc<dyn Converter>,
    permits: Arc<Semaphore>,
    temp_dir: PathBuf,
}

impl ConversionService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        files: Arc<dyn FileStore>,
        converter: Arc<dyn Converter>,
        config: &ConverterConfig,
    ) -> Self {
        Self {
            sessions,
            files,
            converter,
            permits: Arc::new(Semaphore::new(config.max_parallel_conversions)),
            temp_dir: config.temp_dir.clone(),
        }
    }

    /// Worker slots not currently held by a conversion.
    pub fn available_workers(&self) -> usize {
        self.permits.available_permits()
    }

    /// Store a batch of files for a session, replacing whatever it held.
    ///
    /// `session_id` may be `"new"` to start a session. An unknown session is
    /// reported before the files are looked at. Every file is checked before
    /// anything is written, so a rejected batch leaves the session untouched.
    pub async fn upload(
        &self,
        session_id: &str,
        files: Vec<UploadedFile>,
    ) -> Result<UploadOutcome, ServiceError> {
        if session_id != NEW_SESSION {
            let sessions = Arc::clone(&self.sessions);
            let requested = session_id.to_string();
            if blocking(move || sessions.get_session(&requested)).await?.is_none() {
                return Err(StoreError::SessionNotFound(session_id.to_string()).into());
            }
        }

        if files.is_empty() {
            return Err(ServiceError::InvalidArgument("No files uploaded".to_string()));
        }

        let mut seen = HashSet::new();
        let mut accepted = Vec::with_capacity(files.len());
        for file in files {
            let extension = extension_of(&file.name);
            let format = parse_format(extension).ok_or_else(|| {
                ServiceError::InvalidArgument(format!(
                    "Invalid file format '{}'",
                    canonicalize(extension)
                ))
            })?;
            if !seen.insert(file.name.clone()) {
                return Err(ServiceError::InvalidArgument(format!(
                    "Duplicate file name '{}'",
                    file.name
                )));
            }
            accepted.push((file, format));
        }

        let sessions = Arc::clone(&self.sessions);
        let requested = session_id.to_string();
        let session_id = blocking(move || sessions.touch_or_create(&requested)).await?;

        let new_files: Vec<NewFile> = accepted
            .into_iter()
            .map(|(file, format)| NewFile::new(&session_id, file.name, format, file.contents))
            .collect();
        let uploaded_files: Vec<FileSummary> = new_files
            .iter()
            .map(|file| FileSummary {
                file_name: file.name.clone(),
                file_id: file.file_id.clone(),
            })
            .collect();

        let store = Arc::clone(&self.files);
        let target = session_id.clone();
        blocking(move || store.replace_session_files(&target, new_files)).await?;

        FILES_UPLOADED.inc_by(uploaded_files.len() as u64);
        info!(
            session_id = %session_id,
            files = uploaded_files.len(),
            "Files uploaded"
        );

        Ok(UploadOutcome {
            uploaded_files,
            session_id,
        })
    }

    /// Convert every pending file of the session to `to_format`.
    ///
    /// The first failure stops the batch. Files converted before it stay
    /// converted.
    pub async fn convert(
        &self,
        session_id: &str,
        to_format: &str,
    ) -> Result<ConvertOutcome, ServiceError> {
        let target = parse_format(to_format).ok_or_else(|| {
            ServiceError::InvalidArgument(format!("Invalid to_format: {}", canonicalize(to_format)))
        })?;

        let store = Arc::clone(&self.files);
        let owner = session_id.to_string();
        let pending = blocking(move || store.get(&owner, false)).await?;
        if pending.is_empty() {
            return Err(not_found_for(session_id));
        }

        let mut converted_files = Vec::with_capacity(pending.len());
        for file in pending {
            if !is_valid_format_conversion(file.format, target) {
                return Err(ServiceError::InvalidArgument(format!(
                    "Invalid file conversion '{} to {}'",
                    file.format, target
                )));
            }

            let contents = self.run_conversion(&file, target).await?;
            let new_name = converted_name(&file.name, target);

            let store = Arc::clone(&self.files);
            let name = new_name.clone();
            let file_id = file.file_id.clone();
            blocking(move || store.mark_converted(&file, &name, target, contents)).await?;

            converted_files.push(FileSummary {
                file_name: new_name,
                file_id,
            });
        }

        let sessions = Arc::clone(&self.sessions);
        let owner = session_id.to_string();
        blocking(move || sessions.touch_or_create(&owner)).await?;

        info!(
            session_id,
            to_format = %target,
            files = converted_files.len(),
            "Files converted"
        );

        Ok(ConvertOutcome {
            converted_files,
            session_id: session_id.to_string(),
        })
    }

    /// Converted files of the session: one raw file, or a zip of several.
    pub async fn download(&self, session_id: &str) -> Result<Download, ServiceError> {
        let store = Arc::clone(&self.files);
        let owner = session_id.to_string();
        let mut files = blocking(move || store.get(&owner, true)).await?;

        match files.len() {
            0 => Err(not_found_for(session_id)),
            1 => {
                let file = files.remove(0);
                DOWNLOADS_TOTAL.with_label_values(&["single"]).inc();
                debug!(session_id, file_id = %file.file_id, "Serving single file");
                Ok(Download::Single {
                    content_type: file.format.mime_type(),
                    file_name: file.name,
                    contents: file.contents,
                })
            }
            count => {
                let contents = tokio::task::spawn_blocking(move || build_zip(&files))
                    .await
                    .map_err(|e| ServiceError::internal("zipping files", e))?
                    .map_err(|e| ServiceError::internal("zipping files", format!("{:#}", e)))?;
                DOWNLOADS_TOTAL.with_label_values(&["archive"]).inc();
                debug!(session_id, files = count, bytes = contents.len(), "Serving archive");
                Ok(Download::Archive {
                    file_name: ARCHIVE_FILE_NAME.to_string(),
                    contents,
                })
            }
        }
    }

    /// Convert one stored file through a scratch pair and return the output
    /// bytes. The scratch files are gone when this returns.
    async fn run_conversion(
        &self,
        file: &StoredFile,
        target: Format,
    ) -> Result<Vec<u8>, ServiceError> {
        let scratch = ScratchPair::acquire(&self.temp_dir, file.format, target, &file.contents)
            .await
            .map_err(|e| ServiceError::internal("preparing file for conversion", e))?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| ServiceError::internal("waiting for a conversion worker", e))?;

        debug!(
            file_id = %file.file_id,
            from = %file.format,
            to = %target,
            "Starting conversion"
        );

        CONVERSIONS_ACTIVE.inc();
        let timer = CONVERSION_DURATION
            .with_label_values(&[target.media_type().as_str()])
            .start_timer();
        let result = self
            .converter
            .convert(ConversionJob::new(file.file_id.clone(), &scratch))
            .await;
        timer.observe_duration();
        CONVERSIONS_ACTIVE.dec();

        match result {
            Ok(result) => {
                CONVERSIONS_TOTAL.with_label_values(&["success"]).inc();
                debug!(
                    file_id = %file.file_id,
                    duration_ms = result.duration_ms,
                    output_bytes = result.output_size_bytes,
                    "Conversion finished"
                );
            }
            Err(e) => {
                let outcome = match e {
                    ConverterError::Timeout { .. } => "timeout",
                    _ => "failed",
                };
                CONVERSIONS_TOTAL.with_label_values(&[outcome]).inc();
                warn!(file_id = %file.file_id, from = %file.format, to = %target, error = %e, "Conversion failed");
                return Err(e.into());
            }
        }

        scratch
            .read_output()
            .await
            .map_err(|e| ServiceError::internal("reading converted file", e))
    }
}
