//! Image processing worker
//!
//! A single loop pops a message, validates it, sends it to the upscale
//! service and publishes the decoded result. Messages are handled one at a
//! time in queue order. Per-message failures are logged and the message is
//! dropped; an empty queue puts the loop to sleep for `no_message_delay`.

pub mod runner;

pub use runner::{ProcessError, Processed, ProcessingError, process_message};

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::observability::Metrics;
use crate::queue::MessageQueue;
use crate::storage::ImageSink;
use crate::upscale::{HttpConfig, Session, UpscaleError, UpscaleGateway};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to open HTTP session: {0}")]
    Session(#[source] UpscaleError),
}

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub no_message_delay: Duration,
    pub http: HttpConfig,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            no_message_delay: Duration::from_secs(5),
            http: HttpConfig::default(),
        }
    }
}

/// Result of one loop iteration
#[derive(Debug)]
pub enum Iteration {
    /// Queue was empty; the loop slept
    Idle,
    /// Queue could not be read; the loop slept
    QueueUnavailable,
    /// Message was published to storage
    Published(Processed),
    /// Message was dropped
    Dropped(ProcessError),
}

pub struct ImageProcessor {
    queue: Arc<dyn MessageQueue>,
    upscaler: Arc<dyn UpscaleGateway>,
    sink: Arc<dyn ImageSink>,
    settings: WorkerSettings,
    metrics: Arc<Metrics>,
}

impl ImageProcessor {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        upscaler: Arc<dyn UpscaleGateway>,
        sink: Arc<dyn ImageSink>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            queue,
            upscaler,
            sink,
            settings,
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    /// Run until the process is stopped.
    ///
    /// The HTTP session lives for the duration of this call. Only a failure to
    /// open it returns an error.
    pub async fn run(&self) -> Result<(), WorkerError> {
        let session = Session::open(&self.settings.http).map_err(WorkerError::Session)?;

        info!(
            no_message_delay_ms = self.settings.no_message_delay.as_millis() as u64,
            "Starting the image processor"
        );

        loop {
            self.poll_once(&session).await;
        }
    }

    /// One iteration: pop, then either idle-wait or process the message
    pub async fn poll_once(&self, session: &Session) -> Iteration {
        match self.queue.pop().await {
            Ok(Some(message)) => {
                self.metrics.message_received();
                self.handle_message(session, &message).await
            }
            Ok(None) => {
                info!("No more messages in the queue. Waiting before retrying.");
                self.metrics.idle_poll();
                tokio::time::sleep(self.settings.no_message_delay).await;
                Iteration::Idle
            }
            Err(e) => {
                warn!(error = %e, "Failed to pop message from the queue. Waiting before retrying.");
                self.metrics.queue_error();
                tokio::time::sleep(self.settings.no_message_delay).await;
                Iteration::QueueUnavailable
            }
        }
    }

    /// Process a message and swallow its error after logging it
    pub async fn handle_message(&self, session: &Session, message: &Value) -> Iteration {
        match process_message(message, session, self.upscaler.as_ref(), self.sink.as_ref()).await {
            Ok(processed) => {
                self.metrics.image_published();
                Iteration::Published(processed)
            }
            Err(e) => {
                self.record_failure(&e);
                Iteration::Dropped(e)
            }
        }
    }

    fn record_failure(&self, err: &ProcessError) {
        match err {
            ProcessError::Validation(e) => {
                self.metrics.validation_failed();
                error!(error = %e, "Validation error");
            }
            ProcessError::Upscale(UpscaleError::Http { status, message }) => {
                self.metrics.upscale_failed();
                error!(status, reason = %message, "Upscale service rejected the image");
            }
            ProcessError::Upscale(e) => {
                self.metrics.upscale_failed();
                error!(error = %e, "Upscale request failed");
            }
            ProcessError::Processing(e) => {
                self.metrics.processing_failed();
                error!(error = %e, "Error processing image");
            }
        }
    }
}
