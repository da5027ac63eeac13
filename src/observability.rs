//! Logging setup and processing counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info";

/// Install the global fmt subscriber; `RUST_LOG` overrides the default `info` filter
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // A subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Counters for the processing loop
#[derive(Debug, Default)]
pub struct Metrics {
    messages_received: AtomicU64,
    idle_polls: AtomicU64,
    queue_errors: AtomicU64,
    validation_failures: AtomicU64,
    upscale_failures: AtomicU64,
    processing_failures: AtomicU64,
    images_published: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "messages_received", "Metric incremented");
    }

    pub fn idle_poll(&self) {
        self.idle_polls.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "idle_polls", "Metric incremented");
    }

    pub fn queue_error(&self) {
        self.queue_errors.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "queue_errors", "Metric incremented");
    }

    pub fn validation_failed(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "validation_failures", "Metric incremented");
    }

    pub fn upscale_failed(&self) {
        self.upscale_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "upscale_failures", "Metric incremented");
    }

    pub fn processing_failed(&self) {
        self.processing_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "processing_failures", "Metric incremented");
    }

    pub fn image_published(&self) {
        self.images_published.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "images_published", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            idle_polls: self.idle_polls.load(Ordering::Relaxed),
            queue_errors: self.queue_errors.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            upscale_failures: self.upscale_failures.load(Ordering::Relaxed),
            processing_failures: self.processing_failures.load(Ordering::Relaxed),
            images_published: self.images_published.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub idle_polls: u64,
    pub queue_errors: u64,
    pub validation_failures: u64,
    pub upscale_failures: u64,
    pub processing_failures: u64,
    pub images_published: u64,
}
