//! Shared types passed between the pipeline components.

use crate::payload::{ImagePayload, PayloadError};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Where a product's reference image lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLocator {
    /// Fetched through the resize proxy.
    Remote(Url),
    /// Already embedded; used as-is.
    Embedded(ImagePayload),
}

impl ImageLocator {
    /// Parse a catalog image reference: a `data:` URI or an http(s) URL.
    pub fn parse(raw: &str) -> Result<Self, LocatorError> {
        if ImagePayload::is_data_uri(raw) {
            return Ok(ImageLocator::Embedded(ImagePayload::from_data_uri(raw)?));
        }
        let url = Url::parse(raw.trim()).map_err(|e| LocatorError::InvalidUrl(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(ImageLocator::Remote(url)),
            other => Err(LocatorError::UnsupportedScheme(other.to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    #[error("Invalid embedded image: {0}")]
    Payload(#[from] PayloadError),
    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),
    #[error("Unsupported image URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// A catalog entry. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: ImageLocator,
}

/// Recommended garment size.
///
/// Declaration order is the canonical scan order used when parsing
/// free-form backend text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Size {
    #[serde(rename = "XS")]
    ExtraSmall,
    #[serde(rename = "S")]
    Small,
    #[default]
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Large,
    #[serde(rename = "XL")]
    ExtraLarge,
    #[serde(rename = "XXL")]
    DoubleExtraLarge,
}

impl Size {
    pub const ALL: [Size; 6] = [
        Size::ExtraSmall,
        Size::Small,
        Size::Medium,
        Size::Large,
        Size::ExtraLarge,
        Size::DoubleExtraLarge,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Size::ExtraSmall => "XS",
            Size::Small => "S",
            Size::Medium => "M",
            Size::Large => "L",
            Size::ExtraLarge => "XL",
            Size::DoubleExtraLarge => "XXL",
        }
    }

    /// Exact, case-insensitive code lookup.
    pub fn from_code(code: &str) -> Option<Size> {
        Size::ALL
            .into_iter()
            .find(|size| size.code().eq_ignore_ascii_case(code.trim()))
    }

    /// Tolerant parse of free-form backend text.
    ///
    /// Uppercases the text and returns the code found earliest as a
    /// substring. Codes starting at the same position resolve to the longest
    /// one, so `"XL"` is `XL` rather than the `L` it contains. Letters inside
    /// ordinary words count: `"Size: M"` is `S`. Anything else falls back to
    /// `M`.
    pub fn from_response(text: &str) -> Size {
        let upper = text.to_uppercase();
        Size::ALL
            .into_iter()
            .filter_map(|size| upper.find(size.code()).map(|pos| (pos, size)))
            .min_by(|(a_pos, a), (b_pos, b)| {
                a_pos
                    .cmp(b_pos)
                    .then(b.code().len().cmp(&a.code().len()))
            })
            .map(|(_, size)| size)
            .unwrap_or_default()
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Input bundle for one attempt. Read-only for the attempt's duration.
#[derive(Debug, Clone)]
pub struct TryOnRequest {
    pub user_image: ImagePayload,
    pub product: Product,
}

/// Successful outcome of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryOnResult {
    pub composite: ImagePayload,
    pub size: Size,
}
