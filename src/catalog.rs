//! Static product catalog.
//!
//! Products are listed as `[[products]]` tables in a TOML file:
//!
//! ```toml
//! [[products]]
//! id = "linen-shirt"
//! name = "Linen Shirt"
//! description = "Loose-fit summer shirt in natural linen"
//! image = "https://shop.example.com/images/linen-shirt.jpg"
//! ```
//!
//! `image` is an `http(s)` URL, fetched through the resize proxy, or a
//! `data:` URI used as-is. Products are immutable once loaded.

use crate::types::{ImageLocator, LocatorError, Product};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Duplicate product id: {0}")]
    DuplicateId(String),
    #[error("Product {id}: {field} must not be empty")]
    EmptyField { id: String, field: &'static str },
    #[error("Product {id}: {source}")]
    Image {
        id: String,
        #[source]
        source: LocatorError,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CatalogFile {
    products: Vec<ProductEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProductEntry {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    image: String,
}

impl ProductEntry {
    fn into_product(self) -> Result<Product, CatalogError> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err(CatalogError::EmptyField {
                id: self.name,
                field: "id",
            });
        }
        if self.name.trim().is_empty() {
            return Err(CatalogError::EmptyField { id, field: "name" });
        }
        let image = ImageLocator::parse(&self.image).map_err(|source| CatalogError::Image {
            id: id.clone(),
            source,
        })?;
        Ok(Product {
            id,
            name: self.name,
            description: self.description,
            image,
        })
    }
}

/// Parse catalog TOML, preserving file order.
pub fn parse_catalog(content: &str) -> Result<Vec<Product>, CatalogError> {
    let file: CatalogFile = toml::from_str(content)?;
    let mut seen = HashSet::new();
    let mut products = Vec::with_capacity(file.products.len());
    for entry in file.products {
        let product = entry.into_product()?;
        if !seen.insert(product.id.clone()) {
            return Err(CatalogError::DuplicateId(product.id));
        }
        products.push(product);
    }
    Ok(products)
}

pub fn load_catalog(path: &Path) -> Result<Vec<Product>, CatalogError> {
    let content = fs::read_to_string(path)?;
    parse_catalog(&content)
}

pub fn find_product<'a>(products: &'a [Product], id: &str) -> Option<&'a Product> {
    products.iter().find(|p| p.id == id)
}
