//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations) (which decides the
//! target dimensions) and the [`backend`](super::backend) (which does the
//! pixel work).
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`NormalizeParams`]: source bytes, exact target dimensions, quality and backdrop colour.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Opaque colour transparent pixels are composited onto.
pub const WHITE_BACKDROP: [u8; 3] = [255, 255, 255];

/// Parameters for a normalize operation.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeParams<'a> {
    pub source: &'a [u8],
    /// Exact output width.
    pub width: u32,
    /// Exact output height.
    pub height: u32,
    pub quality: Quality,
    pub backdrop: [u8; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
        assert_eq!(Quality::new(u32::MAX).value(), 100);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
    }
}
