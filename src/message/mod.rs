//! Upscale request messages pulled from the queue.
//!
//! A message arrives as untyped JSON:
//!
//! ```json
//! {
//!   "width": 1024,
//!   "height": 768,
//!   "image_data": "<base64 encoded source image>"
//! }
//! ```
//!
//! [`validate_message`] turns it into an [`UpscaleRequest`] or rejects it with a
//! [`ValidationError`]. Unknown fields are ignored.

mod validation;

pub use validation::{ValidationError, validate_message};

use serde_json::Number;

/// A validated unit of work.
///
/// Every field is forwarded exactly as received: the dimensions keep their JSON
/// representation (`1024.0` stays a float) and `image_data` stays base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpscaleRequest {
    pub width: Number,
    pub height: Number,
    pub image_data: String,
}
