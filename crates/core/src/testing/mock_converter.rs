//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::converter::{ConversionJob, ConversionResult, Converter, ConverterError};

/// A recorded conversion job for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    /// The job that was submitted.
    pub job: ConversionJob,
    /// Input bytes as they were on disk when the job ran.
    pub input: Vec<u8>,
    /// Whether the conversion succeeded.
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track conversion jobs for assertions
/// - Simulate failure of a chosen call
/// - Control the bytes written as output
/// - Observe how many conversions overlapped
///
/// By default the output is a copy of the input prefixed with `converted:`.
///
/// # Example
///
/// ```rust,ignore
/// use mediaconv_core::testing::MockConverter;
///
/// let converter = MockConverter::new();
/// converter.set_output(b"PNG".to_vec()).await;
///
/// let result = converter.convert(job).await?;
///
/// let conversions = converter.recorded_conversions().await;
/// assert_eq!(conversions.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockConverter {
    /// Recorded conversions.
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    /// Errors keyed by zero-based call index.
    scheduled_errors: Arc<RwLock<HashMap<usize, ConverterError>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
    /// Fixed output bytes; `None` derives them from the input.
    output: Arc<RwLock<Option<Vec<u8>>>>,
    /// Simulated conversion duration.
    delay: Arc<RwLock<Duration>>,
    calls: AtomicUsize,
    running: AtomicUsize,
    peak_running: AtomicUsize,
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Get the number of conversions performed.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Configure the `index`-th conversion (zero-based) to fail.
    pub async fn set_error_on_call(&self, index: usize, error: ConverterError) {
        self.scheduled_errors.write().await.insert(index, error);
    }

    /// Write these bytes as the output of every conversion.
    pub async fn set_output(&self, bytes: Vec<u8>) {
        *self.output.write().await = Some(bytes);
    }

    /// Set the simulated conversion duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Largest number of conversions observed running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_running.load(Ordering::SeqCst)
    }

    async fn take_error(&self, call: usize) -> Option<ConverterError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Some(err);
        }
        self.scheduled_errors.write().await.remove(&call)
    }

    async fn run(&self, job: &ConversionJob, input: &[u8]) -> Result<u64, ConverterError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.take_error(call).await {
            return Err(err);
        }

        let output = match self.output.read().await.as_ref() {
            Some(bytes) => bytes.clone(),
            None => [b"converted:".as_slice(), input].concat(),
        };
        tokio::fs::write(&job.output_path, &output).await?;
        Ok(output.len() as u64)
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError> {
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_running.fetch_max(running, Ordering::SeqCst);

        let input = tokio::fs::read(&job.input_path).await.unwrap_or_default();
        let outcome = self.run(&job, &input).await;

        self.running.fetch_sub(1, Ordering::SeqCst);
        self.conversions.write().await.push(RecordedConversion {
            job: job.clone(),
            input,
            success: outcome.is_ok(),
        });

        let output_size_bytes = outcome?;
        Ok(ConversionResult {
            job_id: job.job_id,
            output_path: job.output_path,
            output_size_bytes,
            duration_ms: 0,
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        Ok(())
    }
}
