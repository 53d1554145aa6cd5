//! Session-scoped upload, conversion and download.
//!
//! [`ConversionService`] ties the stores to a [`Converter`](crate::converter::Converter):
//! uploads replace a session's files, conversions run pending files through
//! the converter one at a time, and downloads hand back either the single
//! converted file or a zip of all of them.

mod archive;
mod error;
mod service;
mod types;

pub use archive::build_zip;
pub use error::ServiceError;
pub use service::ConversionService;
pub use types::{
    ConvertOutcome, Download, FileSummary, UploadOutcome, UploadedFile, ARCHIVE_FILE_NAME,
};
