//! Update notice published by the update server.
//!
//! ```text
//! {"message": "New BIOS version available: V1R17",
//!  "image_url": "http://192.168.10.23:5000/BIN/BIOS.bin"}
//! ```

use alloc::string::String;

use serde::Deserialize;
use tracing::debug;

use crate::error::UpdateError;

/// What the update endpoint returns when an image is published.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateNotice {
    /// Text to show the user.
    pub message: String,
    /// Absolute URL of the image.
    pub image_url: String,
}

impl UpdateNotice {
    /// Parse a notice from the endpoint's response body.
    pub fn parse(body: &[u8]) -> Result<Self, UpdateError> {
        let notice: Self = serde_json::from_slice(body).map_err(|e| {
            debug!("update notice rejected: {}", e);
            UpdateError::MalformedNotice
        })?;
        if notice.image_url.is_empty() {
            return Err(UpdateError::MalformedNotice);
        }
        Ok(notice)
    }
}
