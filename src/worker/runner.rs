//! Message runner - processes a single upscale request end to end

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::info;

use crate::message::{ValidationError, validate_message};
use crate::storage::{ImageSink, StorageError};
use crate::upscale::{Session, UpscaleError, UpscaleGateway};

/// Everything that can go wrong with one message. Never escapes the loop.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Upscale failed: {0}")]
    Upscale(#[from] UpscaleError),

    #[error("Error processing image: {0}")]
    Processing(#[from] ProcessingError),
}

/// Failures after a successful upscale: decoding the result or publishing it
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("upscale response has no 'base64_image' string")]
    MissingResultImage,

    #[error("invalid base64 in upscale response: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("publish failed: {0}")]
    Publish(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, ProcessError>;

/// Summary of a message that made it all the way to storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    pub width: Number,
    pub height: Number,
    pub size: usize,
}

/// Validate, upscale, decode and publish one message
pub async fn process_message(
    message: &Value,
    session: &Session,
    upscaler: &dyn UpscaleGateway,
    sink: &dyn ImageSink,
) -> Result<Processed> {
    let request = validate_message(message)?;

    // image_data is forwarded still encoded
    let upscaled = upscaler
        .upscale(session, &request.width, &request.height, &request.image_data)
        .await?;

    let encoded = upscaled
        .base64_image()
        .ok_or(ProcessingError::MissingResultImage)?;
    let image = decode_image(encoded).map_err(ProcessingError::from)?;
    let size = image.len();

    sink.post_image(image).await.map_err(ProcessingError::from)?;

    info!(width = %request.width, height = %request.height, size, "Published upscaled image");

    Ok(Processed {
        width: request.width,
        height: request.height,
        size,
    })
}

/// Standard base64 with padding; embedded whitespace (line-wrapped output) is skipped
pub fn decode_image(encoded: &str) -> std::result::Result<Bytes, base64::DecodeError> {
    let decoded = if encoded.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        STANDARD.decode(compact)?
    } else {
        STANDARD.decode(encoded)?
    };

    Ok(Bytes::from(decoded))
}
