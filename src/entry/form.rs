//! The add-entry form and its validation rules.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::NewEntry;

/// Raw form input, exactly as typed by the administrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryForm {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub price: String,
    /// Comma-separated image URLs.
    #[serde(default)]
    pub image_urls: String,
    #[serde(default)]
    pub description: String,
}

/// Missing or malformed form input. Reported inline; nothing is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty after trimming.
    MissingField(&'static str),
    /// Price is not a positive, finite decimal.
    InvalidPrice(String),
    /// No usable image URL remained after splitting.
    NoImages,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField(field) => write!(f, "{} is required", field),
            ValidationError::InvalidPrice(raw) => write!(f, "invalid price: {:?}", raw),
            ValidationError::NoImages => write!(f, "at least one image URL is required"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Split a comma-separated URL list, trimming each item and dropping empties.
pub fn parse_image_urls(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trimmed, non-empty text or a `MissingField` error.
pub(crate) fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

impl EntryForm {
    /// Check every field and build the entry to write.
    pub fn validate(&self) -> Result<NewEntry, ValidationError> {
        let model = required(&self.model, "model")?;
        let brand = required(&self.brand, "brand")?;

        let raw_price = self.price.trim();
        let price: f64 = raw_price
            .parse()
            .map_err(|_| ValidationError::InvalidPrice(raw_price.to_string()))?;
        if !price.is_finite() || price <= 0.0 {
            return Err(ValidationError::InvalidPrice(raw_price.to_string()));
        }

        let images = parse_image_urls(&self.image_urls);
        if images.is_empty() {
            return Err(ValidationError::NoImages);
        }

        let description = Some(self.description.trim().to_string()).filter(|d| !d.is_empty());

        Ok(NewEntry {
            model,
            brand,
            price,
            images,
            description,
        })
    }
}
