//! Static format tables and conversion policy.

use super::types::{Format, MediaType, SupportedFormats};

/// Non-canonical spellings and the canonical format they resolve to.
const ALIASES: &[(&str, Format)] = &[
    ("JPEG", Format::Jpg),
    ("JPE", Format::Jpg),
    ("SVGZ", Format::Svg),
    ("TIFF", Format::Tif),
    ("M4V", Format::Mp4),
    ("M4A", Format::Aac),
    ("OGA", Format::Ogg),
];

/// Normalizes a format name to its canonical upper-case code.
///
/// Matching is case-insensitive and resolves known aliases. Input that is
/// neither a canonical code nor an alias is returned uppercased.
pub fn canonicalize(format: &str) -> String {
    let upper = format.to_uppercase();

    if Format::from_code(&upper).is_some() {
        return upper;
    }

    ALIASES
        .iter()
        .find(|(alias, _)| *alias == upper)
        .map(|(_, canonical)| canonical.code().to_string())
        .unwrap_or(upper)
}

/// Resolves a format name (any case, aliases allowed) to a registered format.
pub fn parse_format(format: &str) -> Option<Format> {
    Format::from_code(&canonicalize(format))
}

/// Media type of a registered format, `None` if the format is not registered.
pub fn media_type_of(format: &str) -> Option<MediaType> {
    parse_format(format).map(|f| f.media_type())
}

pub fn is_supported(format: &str) -> bool {
    parse_format(format).is_some()
}

/// Formats of one media type, in registry order.
pub fn formats_of(media_type: MediaType) -> Vec<Format> {
    Format::ALL
        .iter()
        .copied()
        .filter(|f| f.media_type() == media_type)
        .collect()
}

pub fn supported_formats() -> SupportedFormats {
    SupportedFormats {
        image: formats_of(MediaType::Image),
        video: formats_of(MediaType::Video),
        audio: formats_of(MediaType::Audio),
    }
}

/// Explicitly disallowed pairs: raster images may not become vector (SVG),
/// and no other image format may become TIF.
fn is_denied(from: Format, to: Format) -> bool {
    if from.media_type() != MediaType::Image {
        return false;
    }
    (to == Format::Svg && from != Format::Svg) || (to == Format::Tif && from != Format::Tif)
}

/// Conversion policy on already-resolved formats.
pub fn is_valid_format_conversion(from: Format, to: Format) -> bool {
    from.media_type() == to.media_type() && !is_denied(from, to)
}

/// Whether converting `from` into `to` is allowed.
///
/// Both names are canonicalized first. The pair is valid iff both formats
/// are registered, share a media type and are not on the deny-list.
pub fn is_valid_conversion(from: &str, to: &str) -> bool {
    match (parse_format(from), parse_format(to)) {
        (Some(from), Some(to)) => is_valid_format_conversion(from, to),
        _ => false,
    }
}

/// Every format `format` may be converted into, or `None` if `format` is
/// not registered.
pub fn supported_conversions(format: &str) -> Option<Vec<Format>> {
    let from = parse_format(format)?;
    Some(
        formats_of(from.media_type())
            .into_iter()
            .filter(|to| is_valid_format_conversion(from, *to))
            .collect(),
    )
}
