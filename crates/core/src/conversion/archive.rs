//! Zip bundling of converted files.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use crate::store::StoredFile;

/// Strip path components so entries cannot escape the extraction directory.
fn sanitize_entry_name(name: &str, fallback: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or(fallback)
        .to_string()
}

/// Entry names must be unique within an archive; later duplicates get a
/// ` (n)` suffix before the extension.
fn unique_entry_name(name: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.clone()) {
        return name;
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_string(), format!(".{}", ext)),
        None => (name.clone(), String::new()),
    };

    (1..)
        .map(|n| format!("{} ({}){}", stem, n, ext))
        .find(|candidate| taken.insert(candidate.clone()))
        .unwrap_or(name)
}

/// Build a deflate-compressed (level 9) zip holding every file under its
/// stored name.
pub fn build_zip(files: &[StoredFile]) -> Result<Vec<u8>> {
    use zip::write::{FileOptions, ZipWriter};
    use zip::CompressionMethod;

    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(std::io::Cursor::new(&mut buffer));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(9))
            .unix_permissions(0o644);

        let mut taken = HashSet::new();
        for (index, file) in files.iter().enumerate() {
            let entry_name = unique_entry_name(
                sanitize_entry_name(&file.name, &format!("unnamed_{}", index)),
                &mut taken,
            );

            zip.start_file(entry_name.as_str(), options)
                .with_context(|| format!("Failed to add file to ZIP: {}", entry_name))?;
            zip.write_all(&file.contents)
                .with_context(|| format!("Failed to write file data to ZIP: {}", entry_name))?;
        }

        zip.finish().context("Failed to finalize ZIP archive")?;
    }

    Ok(buffer)
}
