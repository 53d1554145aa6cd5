//! Converter module for transcoding media files.
//!
//! This module provides the `Converter` trait and an implementation that
//! delegates to the `ffmpeg` command-line tool. ffmpeg picks demuxer and
//! muxer from the file extensions, so inputs and outputs are materialized
//! into a [`ScratchPair`] named after the source and target formats.
//!
//! # Example
//!
//! ```ignore
//! use mediaconv_core::converter::{ConversionJob, Converter, FfmpegConverter, ScratchPair};
//! use mediaconv_core::format::Format;
//!
//! let converter = FfmpegConverter::with_defaults();
//! converter.validate().await?;
//!
//! let scratch = ScratchPair::acquire(&temp_dir, Format::Jpg, Format::Png, &jpeg_bytes).await?;
//! let result = converter.convert(ConversionJob::new("job-1", &scratch)).await?;
//! let png_bytes = scratch.read_output().await?;
//! println!("Converted in {} ms", result.duration_ms);
//! ```

mod config;
mod error;
mod ffmpeg;
mod scratch;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegConverter;
pub use scratch::ScratchPair;
pub use traits::Converter;
pub use types::{ConversionJob, ConversionResult};
