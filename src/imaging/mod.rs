//! Image normalization, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` |
//! | **Normalize** | Lanczos3 resize + white backdrop + JPEG encode |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend,
//!   and the async [`ImageNormalizer`] used by the generation client

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::fit_within;
pub use operations::{ImageNormalizer, normalize, plan_normalize};
pub use params::{NormalizeParams, Quality, WHITE_BACKDROP};
pub use rust_backend::RustBackend;
