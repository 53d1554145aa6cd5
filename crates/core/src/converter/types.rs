//! Types for the converter module.

use std::path::PathBuf;

use super::scratch::ScratchPair;

/// A single conversion to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Identifier used in logs.
    pub job_id: String,
    /// Source file; its extension names the source format.
    pub input_path: PathBuf,
    /// Destination file; its extension names the target format.
    pub output_path: PathBuf,
}

impl ConversionJob {
    /// Job reading from and writing to a scratch pair.
    pub fn new(job_id: impl Into<String>, scratch: &ScratchPair) -> Self {
        Self {
            job_id: job_id.into(),
            input_path: scratch.input_path().to_path_buf(),
            output_path: scratch.output_path().to_path_buf(),
        }
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub job_id: String,
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
    pub duration_ms: u64,
}
