//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{ConversionJob, ConversionResult};

/// FFmpeg-based converter implementation.
pub struct FfmpegConverter {
    config: ConverterConfig,
}

impl FfmpegConverter {
    /// Creates a new FFmpeg converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Builds ffmpeg arguments. The container and codecs follow the output
    /// extension.
    fn build_args(input_path: &Path, output_path: &Path) -> Vec<String> {
        vec![
            "-nostdin".to_string(),
            "-y".to_string(), // Overwrite output
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            output_path.to_string_lossy().to_string(),
        ]
    }

    fn spawn_error(&self, e: std::io::Error) -> ConverterError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConverterError::FfmpegNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            ConverterError::Io(e)
        }
    }
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError> {
        let start = Instant::now();
        let args = Self::build_args(&job.input_path, &job.output_path);
        debug!(job_id = %job.job_id, ?args, "Running ffmpeg");

        // The child is killed if the timeout drops the wait future.
        let child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let output = match timeout(self.config.timeout(), child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    job_id = %job.job_id,
                    timeout_secs = self.config.timeout_secs,
                    "FFmpeg process timed out"
                );
                return Err(ConverterError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ConverterError::conversion_failed(
                format!("FFmpeg exited with code: {:?}", output.status.code()),
                if stderr.is_empty() { None } else { Some(stderr) },
            ));
        }

        let output_meta = tokio::fs::metadata(&job.output_path).await.map_err(|_| {
            ConverterError::OutputMissing {
                path: job.output_path.clone(),
            }
        })?;

        Ok(ConversionResult {
            job_id: job.job_id,
            output_path: job.output_path,
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(ConverterError::conversion_failed(
                "ffmpeg -version failed",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }

        // Ensure temp dir exists
        tokio::fs::create_dir_all(&self.config.temp_dir).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_args() {
        let args = FfmpegConverter::build_args(Path::new("/tmp/in.jpg"), Path::new("/tmp/out.png"));
        assert_eq!(
            args,
            vec!["-nostdin", "-y", "-i", "/tmp/in.jpg", "/tmp/out.png"]
        );
    }

    fn job(dir: &Path) -> ConversionJob {
        ConversionJob {
            job_id: "job-1".to_string(),
            input_path: dir.join("input.jpg"),
            output_path: dir.join("output.png"),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let converter = FfmpegConverter::new(ConverterConfig::with_ffmpeg_path(PathBuf::from(
            "/nonexistent/ffmpeg-binary",
        )));

        let result = converter.convert(job(dir.path())).await;
        assert!(matches!(result, Err(ConverterError::FfmpegNotFound { .. })));

        let result = converter.validate().await;
        assert!(matches!(result, Err(ConverterError::FfmpegNotFound { .. })));
    }

    #[cfg(unix)]
    fn write_script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-ffmpeg.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "echo 'Invalid data found' >&2\nexit 1");
        let converter = FfmpegConverter::new(ConverterConfig::with_ffmpeg_path(script));

        let err = converter.convert(job(dir.path())).await.unwrap_err();
        assert!(matches!(err, ConverterError::ConversionFailed { .. }));
        assert_eq!(err.stderr(), Some("Invalid data found"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "sleep 5");
        let converter =
            FfmpegConverter::new(ConverterConfig::with_ffmpeg_path(script).with_timeout(1));

        let start = Instant::now();
        let err = converter.convert(job(dir.path())).await.unwrap_err();
        assert!(matches!(err, ConverterError::Timeout { timeout_secs: 1 }));
        assert!(start.elapsed().as_secs() < 5);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_copies_output() {
        let dir = tempfile::tempdir().unwrap();
        // Last argument is the output path.
        let script = write_script(
            dir.path(),
            "for last; do :; done\nprintf 'converted' > \"$last\"",
        );
        let converter = FfmpegConverter::new(ConverterConfig::with_ffmpeg_path(script));

        let result = converter.convert(job(dir.path())).await.unwrap();
        assert_eq!(result.output_size_bytes, 9);
        assert_eq!(std::fs::read(dir.path().join("output.png")).unwrap(), b"converted");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_without_output_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "exit 0");
        let converter = FfmpegConverter::new(ConverterConfig::with_ffmpeg_path(script));

        let err = converter.convert(job(dir.path())).await.unwrap_err();
        assert!(matches!(err, ConverterError::OutputMissing { .. }));
    }
}
