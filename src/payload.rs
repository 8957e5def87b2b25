//! Self-describing encoded images.
//!
//! An [`ImagePayload`] is raw encoded bytes plus their MIME type. Its
//! transport form is a base64 data URI (`data:image/jpeg;base64,...`), which
//! is what the generation backend receives and what the composite result is
//! exposed as for download.
//!
//! Payloads are never mutated: normalization always builds a new one.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::ImageFormat;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Not a data URI")]
    NotDataUri,
    #[error("Data URI is not base64-encoded")]
    NotBase64Encoded,
    #[error("Invalid base64 data: {0}")]
    InvalidBase64(String),
    #[error("Unrecognized image format")]
    UnknownFormat,
}

/// Encoded image bytes with their declared MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    mime_type: String,
    data: Vec<u8>,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Build a payload from raw file bytes, sniffing the MIME type from the
    /// image signature.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, PayloadError> {
        let format = image::guess_format(&data).map_err(|_| PayloadError::UnknownFormat)?;
        Ok(Self::new(format.to_mime_type(), data))
    }

    /// Parse a `data:<mime>;base64,<data>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self, PayloadError> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or(PayloadError::NotDataUri)?;
        let (header, encoded) = rest.split_once(',').ok_or(PayloadError::NotDataUri)?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or(PayloadError::NotBase64Encoded)?;
        let data = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| PayloadError::InvalidBase64(e.to_string()))?;
        Ok(Self::new(mime_type, data))
    }

    /// Wrap base64 data as returned inline by the backend.
    pub fn from_base64(mime_type: &str, encoded: &str) -> Result<Self, PayloadError> {
        let data = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| PayloadError::InvalidBase64(e.to_string()))?;
        Ok(Self::new(mime_type, data))
    }

    pub fn is_data_uri(candidate: &str) -> bool {
        candidate.trim_start().starts_with("data:")
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.data)
    }

    /// Transport form; also the downloadable artifact for composites.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// File extension to save this payload under.
    pub fn file_extension(&self) -> &'static str {
        ImageFormat::from_mime_type(&self.mime_type)
            .and_then(|f| f.extensions_str().first().copied())
            .unwrap_or("bin")
    }
}
