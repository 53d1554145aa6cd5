//! Request-scoped scratch files for the external tool.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::format::Format;

/// A private directory holding one conversion's input and output files.
///
/// The directory and everything in it is removed when the pair is dropped,
/// whichever way the conversion ends.
#[derive(Debug)]
pub struct ScratchPair {
    dir: TempDir,
    input_path: PathBuf,
    output_path: PathBuf,
}

impl ScratchPair {
    /// Creates the scratch directory under `temp_root` and writes `contents`
    /// to an input file carrying the extension of `from`.
    pub async fn acquire(
        temp_root: &Path,
        from: Format,
        to: Format,
        contents: &[u8],
    ) -> io::Result<Self> {
        tokio::fs::create_dir_all(temp_root).await?;

        let dir = tempfile::Builder::new()
            .prefix("mediaconv-")
            .tempdir_in(temp_root)?;
        let input_path = dir.path().join(format!("input.{}", from.extension()));
        let output_path = dir.path().join(format!("output.{}", to.extension()));

        tokio::fs::write(&input_path, contents).await?;

        Ok(Self {
            dir,
            input_path,
            output_path,
        })
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Directory holding both files.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Reads the converted bytes back.
    pub async fn read_output(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.output_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_writes_input_with_source_extension() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchPair::acquire(root.path(), Format::Jpg, Format::Png, b"jpeg")
            .await
            .unwrap();

        assert_eq!(scratch.input_path().extension().unwrap(), "jpg");
        assert_eq!(scratch.output_path().extension().unwrap(), "png");
        assert_eq!(std::fs::read(scratch.input_path()).unwrap(), b"jpeg");
        assert!(!scratch.output_path().exists());
    }

    #[tokio::test]
    async fn test_identity_conversion_uses_distinct_paths() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchPair::acquire(root.path(), Format::Mp3, Format::Mp3, b"id3")
            .await
            .unwrap();
        assert_ne!(scratch.input_path(), scratch.output_path());
    }

    #[tokio::test]
    async fn test_drop_removes_everything() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchPair::acquire(root.path(), Format::Wav, Format::Mp3, b"RIFF")
            .await
            .unwrap();
        std::fs::write(scratch.output_path(), b"ID3").unwrap();
        let dir = scratch.dir().to_path_buf();

        drop(scratch);

        assert!(!dir.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_acquire_creates_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        let scratch = ScratchPair::acquire(&nested, Format::Gif, Format::Png, b"GIF89a")
            .await
            .unwrap();
        assert!(scratch.input_path().starts_with(&nested));
    }
}
