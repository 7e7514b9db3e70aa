//! Inline media carried as data URLs.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reelsmith_error::{ReelsmithResult, ValidationError};
use std::path::Path;

/// A `data:<mime>;base64,<payload>` reference.
///
/// # Examples
///
/// ```
/// use reelsmith_core::DataUrl;
///
/// let url = DataUrl::from_bytes("image/png", b"png");
/// let text = url.to_string();
/// assert!(text.starts_with("data:image/png;base64,"));
///
/// let parsed = DataUrl::parse(&text).unwrap();
/// assert_eq!(parsed.mime(), "image/png");
/// assert_eq!(parsed.decode().unwrap(), b"png");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("data:{};base64,{}", mime, data)]
pub struct DataUrl {
    mime: String,
    data: String,
}

impl DataUrl {
    /// Build from a MIME type and an already-encoded payload.
    pub fn new(mime: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime: mime.into(),
            data: data.into(),
        }
    }

    /// Encode raw bytes.
    pub fn from_bytes(mime: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime, STANDARD.encode(bytes))
    }

    /// Parse the string form.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the text is not a base64 data URL.
    pub fn parse(text: &str) -> ReelsmithResult<Self> {
        let rest = text
            .strip_prefix("data:")
            .ok_or_else(|| ValidationError::new("Not a data URL"))?;
        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| ValidationError::new("Data URL has no payload"))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| ValidationError::new("Data URL is not base64 encoded"))?;
        if mime.is_empty() || data.is_empty() {
            Err(ValidationError::new("Data URL is missing a MIME type or payload"))?
        }
        Ok(Self::new(mime, data))
    }

    /// MIME type.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Base64 payload.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Decode the payload.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the payload is not valid base64.
    pub fn decode(&self) -> ReelsmithResult<Vec<u8>> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| ValidationError::new(format!("Invalid base64 payload: {}", e)).into())
    }
}

/// Guess an image MIME type from a file extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}
