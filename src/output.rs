//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Catalog
//!
//! ```text
//! Products
//! 001 Linen Shirt [linen-shirt]
//!     Image: https://shop.example.com/linen.jpg
//!     Description: Loose-fit summer shirt in natural white linen
//! 002 Plain White Tee [plain-swatch]
//!     Image: embedded image/png (70 bytes)
//! ```
//!
//! ## Try-on
//!
//! ```text
//! ==> Fetching product
//! ==> Estimating size
//! ==> Rendering
//! ==> Done
//! Recommended size: L
//! Composite: try-on.png (image/png, 48213 bytes)
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout (stderr for
//! errors). Format functions are pure: no I/O, no side effects. Logs go to
//! stderr through `tracing`, so stdout carries only these lines.

use crate::error::{ErrorKind, PipelineError};
use crate::orchestrator::Stage;
use crate::types::{ImageLocator, Product, TryOnResult};
use std::path::Path;

const DESCRIPTION_CHAR_LIMIT: usize = 72;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    }
}

fn describe_locator(locator: &ImageLocator) -> String {
    match locator {
        ImageLocator::Remote(url) => url.to_string(),
        ImageLocator::Embedded(payload) => format!(
            "embedded {} ({} bytes)",
            payload.mime_type(),
            payload.data().len()
        ),
    }
}

// ============================================================================
// Catalog
// ============================================================================

pub fn format_catalog(products: &[Product]) -> Vec<String> {
    if products.is_empty() {
        return vec!["No products in catalog".to_string()];
    }

    let mut lines = vec!["Products".to_string()];
    for (i, product) in products.iter().enumerate() {
        lines.push(format!(
            "{} {} [{}]",
            format_index(i + 1),
            product.name,
            product.id
        ));
        lines.push(format!(
            "{}Image: {}",
            indent(1),
            describe_locator(&product.image)
        ));
        if !product.description.trim().is_empty() {
            lines.push(format!(
                "{}Description: {}",
                indent(1),
                truncate_desc(product.description.trim(), DESCRIPTION_CHAR_LIMIT)
            ));
        }
    }
    lines
}

pub fn print_catalog(products: &[Product]) {
    for line in format_catalog(products) {
        println!("{}", line);
    }
}

// ============================================================================
// Try-on progress and outcome
// ============================================================================

pub fn format_stage(stage: Stage) -> String {
    format!("==> {}", stage.label())
}

pub fn print_stage(stage: Stage) {
    println!("{}", format_stage(stage));
}

/// Size line plus where the composite was saved.
pub fn format_result(result: &TryOnResult, saved_to: &Path) -> Vec<String> {
    vec![
        format!("Recommended size: {}", result.size),
        format!(
            "Composite: {} ({}, {} bytes)",
            saved_to.display(),
            result.composite.mime_type(),
            result.composite.data().len()
        ),
    ]
}

pub fn print_result(result: &TryOnResult, saved_to: &Path) {
    for line in format_result(result, saved_to) {
        println!("{}", line);
    }
}

/// Error line, with a hint line for errors the user can act on.
pub fn format_error(error: &PipelineError, api_key_env: &str) -> Vec<String> {
    let mut lines = vec![format!("Error ({}): {}", error.kind(), error)];
    match error.kind() {
        ErrorKind::Credential => lines.push(format!(
            "{}Hint: export a valid key in {} and run again",
            indent(1),
            api_key_env
        )),
        ErrorKind::RateLimited => {
            lines.push(format!("{}Hint: wait a minute before retrying", indent(1)))
        }
        _ => {}
    }
    lines
}

pub fn print_error(error: &PipelineError, api_key_env: &str) {
    for line in format_error(error, api_key_env) {
        eprintln!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::ImagePayload;
    use crate::types::Size;
    use url::Url;

    fn product(id: &str, name: &str, description: &str, image: ImageLocator) -> Product {
        Product {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            image,
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn index_is_zero_padded() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_desc("héllo wörld", 5), "héllo...");
        assert_eq!(truncate_desc("short", 10), "short");
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    #[test]
    fn catalog_lists_products_with_context_lines() {
        let products = vec![
            product(
                "linen-shirt",
                "Linen Shirt",
                "Loose-fit summer shirt",
                ImageLocator::Remote(Url::parse("https://shop.example.com/linen.jpg").unwrap()),
            ),
            product(
                "swatch",
                "Swatch",
                "",
                ImageLocator::Embedded(ImagePayload::new("image/png", vec![0; 70])),
            ),
        ];

        assert_eq!(
            format_catalog(&products),
            vec![
                "Products",
                "001 Linen Shirt [linen-shirt]",
                "    Image: https://shop.example.com/linen.jpg",
                "    Description: Loose-fit summer shirt",
                "002 Swatch [swatch]",
                "    Image: embedded image/png (70 bytes)",
            ]
        );
    }

    #[test]
    fn empty_catalog() {
        assert_eq!(format_catalog(&[]), vec!["No products in catalog"]);
    }

    // =========================================================================
    // Try-on
    // =========================================================================

    #[test]
    fn stage_lines_use_labels() {
        assert_eq!(format_stage(Stage::EstimatingSize), "==> Estimating size");
        assert_eq!(format_stage(Stage::Succeeded), "==> Done");
    }

    #[test]
    fn result_lines() {
        let result = TryOnResult {
            composite: ImagePayload::new("image/png", vec![1, 2, 3]),
            size: Size::ExtraLarge,
        };
        assert_eq!(
            format_result(&result, Path::new("try-on.png")),
            vec!["Recommended size: XL", "Composite: try-on.png (image/png, 3 bytes)"]
        );
    }

    #[test]
    fn credential_error_hints_at_key_variable() {
        let lines = format_error(&PipelineError::credential(), "GEMINI_KEY");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Error (CredentialError): "));
        assert!(lines[1].contains("GEMINI_KEY"));
    }

    #[test]
    fn generic_error_has_no_hint() {
        let lines = format_error(&PipelineError::Network("connection reset".into()), "API_KEY");
        assert_eq!(lines, vec!["Error (NetworkError): connection reset"]);
    }
}
