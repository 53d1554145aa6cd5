//! Format registry.
//!
//! Immutable tables of supported formats grouped by media type, the alias
//! table used to canonicalize file extensions, and the conversion policy.
//!
//! # Example
//!
//! ```
//! use mediaconv_core::format::{canonicalize, is_valid_conversion};
//!
//! assert_eq!(canonicalize("jpeg"), "JPG");
//! assert!(is_valid_conversion("jpg", "png"));
//! assert!(!is_valid_conversion("bmp", "svg"));
//! ```

mod registry;
mod types;

pub use registry::{
    canonicalize, formats_of, is_supported, is_valid_conversion, is_valid_format_conversion,
    media_type_of, parse_format, supported_conversions, supported_formats,
};
pub use types::{Format, MediaType, SupportedFormats};
