//! Upscale gateway: the remote service that resizes images

mod http;

pub use http::{HttpConfig, Session, UpscaleClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpscaleError {
    #[error("upscale service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed upscale response: {0}")]
    MalformedResponse(String),

    #[error("invalid upscale URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, UpscaleError>;

/// Parsed response body of the upscale service.
///
/// Only `base64_image` is interpreted; everything else is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpscaledImage(pub Map<String, Value>);

impl UpscaledImage {
    /// The base64-encoded result image, if present and a string
    pub fn base64_image(&self) -> Option<&str> {
        self.0.get("base64_image").and_then(Value::as_str)
    }
}

/// Anything that can upscale a base64 image to the given dimensions.
///
/// Dimensions are passed through in the JSON form the message carried.
#[async_trait]
pub trait UpscaleGateway: Send + Sync {
    async fn upscale(
        &self,
        session: &Session,
        width: &Number,
        height: &Number,
        base64_image: &str,
    ) -> Result<UpscaledImage>;
}
