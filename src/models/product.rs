// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Product catalog records.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Product record returned by the catalog API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub product_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Body of a product create or update request.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct ProductInput {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,
    pub description: String,
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: f64,
    #[validate(length(max = 500, message = "Image URL must be at most 500 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_image_url: Option<String>,
}

/// Product form state handed over by the UI on save.
#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    /// Set when editing an existing product
    pub id: Option<u64>,
    pub name: String,
    pub description: String,
    pub price: f64,
    /// Reference already stored on the product, kept when no new image is selected
    pub product_image_url: Option<String>,
}

impl ProductDraft {
    /// Draft pre-filled from an existing product for editing.
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: Some(product.id),
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price,
            product_image_url: product.product_image_url.clone(),
        }
    }

    /// Request body with the resolved image reference.
    pub fn to_input(&self, product_image_url: Option<String>) -> ProductInput {
        ProductInput {
            name: self.name.trim().to_string(),
            description: self.description.clone(),
            price: self.price,
            product_image_url: product_image_url.filter(|u| !u.is_empty()),
        }
    }
}

/// Generic `{msg}` body used by the API for errors and acknowledgements.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub id: Option<u64>,
}

impl ApiMessage {
    /// Server-provided text, if any.
    pub fn text(&self) -> Option<&str> {
        self.msg.as_deref().or(self.error.as_deref())
    }
}
