//! Error type for conversion service operations.

use thiserror::Error;

use crate::converter::ConverterError;
use crate::store::StoreError;

/// Errors returned by [`ConversionService`](super::ConversionService).
///
/// Messages are client-facing; the HTTP layer sends them verbatim.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Unknown session, target format, or no files to act on.
    #[error("{0}")]
    NotFound(String),

    /// The request names a format or conversion that is not allowed.
    #[error("{0}")]
    InvalidArgument(String),

    /// The external tool ran past its deadline.
    #[error("FFMPEG process timed out while converting file")]
    Timeout,

    /// The external tool exited with a failure.
    #[error("FFMPEG error: {stderr} while converting file")]
    Conversion { stderr: String },

    /// Storage or filesystem failure.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn internal(action: &str, reason: impl std::fmt::Display) -> Self {
        Self::Internal(format!("{} while {}", reason, action))
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SessionNotFound(_) | StoreError::FileNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            StoreError::Database { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<ConverterError> for ServiceError {
    fn from(err: ConverterError) -> Self {
        match err {
            ConverterError::Timeout { .. } => Self::Timeout,
            ConverterError::ConversionFailed { reason, stderr } => Self::Conversion {
                stderr: stderr.unwrap_or(reason),
            },
            other => Self::internal("converting file", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_taxonomy() {
        let err: ServiceError = StoreError::SessionNotFound("abc".into()).into();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(err.to_string(), "Invalid session_id value 'abc'");

        let err: ServiceError = StoreError::database("getting files from database", "disk full").into();
        assert!(matches!(err, ServiceError::Internal(_)));
        assert_eq!(err.to_string(), "disk full while getting files from database");
    }

    #[test]
    fn test_converter_errors_map_to_taxonomy() {
        let err: ServiceError = ConverterError::Timeout { timeout_secs: 60 }.into();
        assert_eq!(err.to_string(), "FFMPEG process timed out while converting file");

        let err: ServiceError =
            ConverterError::conversion_failed("exit 1", Some("Invalid data".into())).into();
        assert_eq!(err.to_string(), "FFMPEG error: Invalid data while converting file");

        let err: ServiceError = ConverterError::conversion_failed("exit 1", None).into();
        assert_eq!(err.to_string(), "FFMPEG error: exit 1 while converting file");

        let err: ServiceError = ConverterError::FfmpegNotFound {
            path: "ffmpeg".into(),
        }
        .into();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
