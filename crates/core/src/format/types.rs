//! Format and media type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Media type a format belongs to. Every format belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Audio,
}

impl MediaType {
    /// All media types, in registry order.
    pub const ALL: [MediaType; 3] = [MediaType::Image, MediaType::Video, MediaType::Audio];

    /// Lower-case name used in MIME types and JSON keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical media format.
///
/// Serialized as its upper-case canonical code (e.g. `"JPG"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Format {
    // Image
    Bmp,
    Gif,
    Jpg,
    Png,
    Svg,
    Tif,
    Webp,
    // Video
    Avi,
    Flv,
    Mkv,
    Mov,
    Mp4,
    Wmv,
    // Audio
    Aac,
    Flac,
    Mp3,
    Ogg,
    Wav,
    Wma,
}

impl Format {
    /// Every registered format, grouped by media type.
    pub const ALL: [Format; 19] = [
        Format::Bmp,
        Format::Gif,
        Format::Jpg,
        Format::Png,
        Format::Svg,
        Format::Tif,
        Format::Webp,
        Format::Avi,
        Format::Flv,
        Format::Mkv,
        Format::Mov,
        Format::Mp4,
        Format::Wmv,
        Format::Aac,
        Format::Flac,
        Format::Mp3,
        Format::Ogg,
        Format::Wav,
        Format::Wma,
    ];

    /// Upper-case canonical code.
    pub fn code(&self) -> &'static str {
        match self {
            Format::Bmp => "BMP",
            Format::Gif => "GIF",
            Format::Jpg => "JPG",
            Format::Png => "PNG",
            Format::Svg => "SVG",
            Format::Tif => "TIF",
            Format::Webp => "WEBP",
            Format::Avi => "AVI",
            Format::Flv => "FLV",
            Format::Mkv => "MKV",
            Format::Mov => "MOV",
            Format::Mp4 => "MP4",
            Format::Wmv => "WMV",
            Format::Aac => "AAC",
            Format::Flac => "FLAC",
            Format::Mp3 => "MP3",
            Format::Ogg => "OGG",
            Format::Wav => "WAV",
            Format::Wma => "WMA",
        }
    }

    /// File extension (lower-case code, no dot). ffmpeg picks the muxer from it.
    pub fn extension(&self) -> String {
        self.code().to_ascii_lowercase()
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            Format::Bmp
            | Format::Gif
            | Format::Jpg
            | Format::Png
            | Format::Svg
            | Format::Tif
            | Format::Webp => MediaType::Image,
            Format::Avi | Format::Flv | Format::Mkv | Format::Mov | Format::Mp4 | Format::Wmv => {
                MediaType::Video
            }
            Format::Aac | Format::Flac | Format::Mp3 | Format::Ogg | Format::Wav | Format::Wma => {
                MediaType::Audio
            }
        }
    }

    /// Content type served on download: `<media type>/<format>`, lower-case.
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.media_type(), self.extension())
    }

    /// Looks up an exact canonical code. Aliases are not resolved here.
    pub fn from_code(code: &str) -> Option<Format> {
        Format::ALL.iter().copied().find(|f| f.code() == code)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The full registry grouped by media type, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedFormats {
    pub image: Vec<Format>,
    pub video: Vec<Format>,
    pub audio: Vec<Format>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_from_code() {
        for format in Format::ALL {
            assert_eq!(Format::from_code(format.code()), Some(format));
        }
        assert_eq!(Format::from_code("jpg"), None);
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(Format::Png.mime_type(), "image/png");
        assert_eq!(Format::Mp4.mime_type(), "video/mp4");
        assert_eq!(Format::Flac.mime_type(), "audio/flac");
    }

    #[test]
    fn test_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Format::Webp).unwrap(), "\"WEBP\"");
        assert_eq!(serde_json::to_string(&Format::Mp3).unwrap(), "\"MP3\"");
        assert_eq!(serde_json::to_string(&MediaType::Audio).unwrap(), "\"audio\"");
    }
}
