//! Testing utilities and mock implementations.
//!
//! The mock converter stands in for the `ffmpeg` tool so the conversion
//! service and the HTTP surface can be exercised without it.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediaconv_core::testing::MockConverter;
//!
//! let converter = Arc::new(MockConverter::new());
//! let service = ConversionService::new(store.clone(), store, converter.clone(), &config);
//! ```

mod mock_converter;

pub use mock_converter::{MockConverter, RecordedConversion};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::conversion::UploadedFile;

    /// An upload whose contents name the file, so tests can follow bytes
    /// through conversions.
    pub fn uploaded_file(name: &str) -> UploadedFile {
        UploadedFile {
            name: name.to_string(),
            contents: format!("contents of {}", name).into_bytes(),
        }
    }

    /// Several uploads built with [`uploaded_file`].
    pub fn uploaded_files(names: &[&str]) -> Vec<UploadedFile> {
        names.iter().map(|name| uploaded_file(name)).collect()
    }
}
