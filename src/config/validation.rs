use super::models::Config;
use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("upscale_url is required")]
    MissingUpscaleUrl,

    #[error("Invalid upscale_url '{url}': {reason}")]
    InvalidUpscaleUrl { url: String, reason: String },

    #[error("api_key is required (set it in the config file or UPSCALE_API_KEY)")]
    MissingApiKey,

    #[error("Duration must be positive: {field}")]
    ZeroDuration { field: &'static str },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_upscale(config)?;
    validate_durations(config)?;
    Ok(())
}

/// Upscale endpoint must be an absolute http(s) URL and the key must be present
fn validate_upscale(config: &Config) -> Result<(), ValidationError> {
    let raw = config.upscale_url.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingUpscaleUrl);
    }

    let url = Url::parse(raw).map_err(|e| ValidationError::InvalidUpscaleUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ValidationError::InvalidUpscaleUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}', expected http or https", url.scheme()),
        });
    }

    if config.api_key.trim().is_empty() {
        return Err(ValidationError::MissingApiKey);
    }

    Ok(())
}

/// A zero idle delay would turn an empty queue into a busy loop
fn validate_durations(config: &Config) -> Result<(), ValidationError> {
    let fields = [
        ("no_message_delay", config.no_message_delay),
        ("http.connect_timeout", config.http.connect_timeout),
        ("http.request_timeout", config.http.request_timeout),
    ];

    for (field, value) in fields {
        if value.is_zero() {
            return Err(ValidationError::ZeroDuration { field });
        }
    }

    Ok(())
}
