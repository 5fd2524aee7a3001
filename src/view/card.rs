use serde::Serialize;

use crate::entry::CatalogEntry;

pub const MISSING_MODEL: &str = "Model not provided";
pub const MISSING_BRAND: &str = "Brand not provided";
pub const PRICE_UNAVAILABLE: &str = "Price unavailable";
pub const NO_IMAGE_PLACEHOLDER: &str = "https://placehold.co/600x400/e2e8f0/94a3b8?text=No+Image";

/// Display model of one gallery card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: String,
    pub title: String,
    pub brand: String,
    pub description: Option<String>,
    pub price_label: String,
    pub cover_image: String,
    /// All images, in order, for the lightbox.
    pub images: Vec<String>,
    /// Whether the delete control is shown.
    pub deletable: bool,
}

fn or_fallback(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

impl CardView {
    pub fn from_entry(entry: &CatalogEntry, is_admin: bool) -> Self {
        Self {
            id: entry.id.clone(),
            title: or_fallback(&entry.model, MISSING_MODEL),
            brand: or_fallback(&entry.brand, MISSING_BRAND),
            description: entry.description.clone(),
            price_label: format_brl(entry.price).unwrap_or_else(|| PRICE_UNAVAILABLE.to_string()),
            cover_image: entry
                .cover_image()
                .unwrap_or(NO_IMAGE_PLACEHOLDER)
                .to_string(),
            images: entry.images.clone(),
            deletable: is_admin,
        }
    }
}

/// Format a price in Brazilian reais, e.g. `R$ 1.234,50`.
///
/// Returns `None` for zero, negative and non-finite prices, and for prices
/// whose cent amount does not fit in a `u64`.
pub fn format_brl(price: f64) -> Option<String> {
    if !price.is_finite() || price <= 0.0 {
        return None;
    }

    let cents = (price * 100.0).round();
    if cents >= u64::MAX as f64 {
        return None;
    }
    let cents = cents as u64;
    let units = (cents / 100).to_string();
    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    Some(format!("R$ {},{:02}", grouped, cents % 100))
}
