//! HTTP client for the upscale service

use async_trait::async_trait;
use reqwest::{Client, Url, header::CONTENT_TYPE};
use serde::Serialize;
use serde_json::Number;
use std::time::Duration;
use tracing::{debug, error, info};

use super::{Result, UpscaleError, UpscaleGateway, UpscaledImage};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            user_agent: "upscaler/0.1.0".to_string(),
        }
    }
}

/// Pooled HTTP session shared by every request the processing loop makes.
///
/// Cloning is cheap and shares the same connection pool.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
}

impl Session {
    /// Build the connection pool
    pub fn open(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| UpscaleError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Request body sent to the upscale service
#[derive(Debug, Serialize)]
struct UpscalePayload<'a> {
    access_token: &'a str,
    new_width: &'a Number,
    new_height: &'a Number,
    base64_image: &'a str,
}

/// Upscale service client bound to one endpoint and API key
#[derive(Clone)]
pub struct UpscaleClient {
    upscale_url: Url,
    api_key: String,
}

impl std::fmt::Debug for UpscaleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpscaleClient")
            .field("upscale_url", &self.upscale_url.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl UpscaleClient {
    pub fn new(upscale_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let upscale_url = Url::parse(upscale_url)
            .map_err(|e| UpscaleError::InvalidUrl(format!("{}: {}", upscale_url, e)))?;

        Ok(Self {
            upscale_url,
            api_key: api_key.into(),
        })
    }

    pub fn upscale_url(&self) -> &Url {
        &self.upscale_url
    }
}

#[async_trait]
impl UpscaleGateway for UpscaleClient {
    async fn upscale(
        &self,
        session: &Session,
        width: &Number,
        height: &Number,
        base64_image: &str,
    ) -> Result<UpscaledImage> {
        let payload = UpscalePayload {
            access_token: &self.api_key,
            new_width: width,
            new_height: height,
            base64_image,
        };

        debug!(url = %self.upscale_url, %width, %height, "Sending upscale request");

        let response = session
            .client()
            .post(self.upscale_url.clone())
            .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let err = transport_error(&e);
                error!(error = %err, "Client error occurred during image upscaling");
                err
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = status.canonical_reason().unwrap_or("Unknown").to_string();
            error!(
                status = status.as_u16(),
                reason = %message,
                "Error occurred during image upscaling"
            );
            return Err(UpscaleError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let image = response.json::<UpscaledImage>().await.map_err(|e| {
            let err = if e.is_decode() {
                UpscaleError::MalformedResponse(e.to_string())
            } else {
                transport_error(&e)
            };
            error!(error = %err, "Failed to read upscale response");
            err
        })?;

        info!(%width, %height, "Successfully upscaled image");

        Ok(image)
    }
}

fn transport_error(e: &reqwest::Error) -> UpscaleError {
    if e.is_timeout() {
        UpscaleError::Transport(format!("request timed out: {}", e))
    } else if e.is_connect() {
        UpscaleError::Transport(format!("connection failed: {}", e))
    } else {
        UpscaleError::Transport(e.to_string())
    }
}
