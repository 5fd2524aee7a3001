//! View layer - filtered, sorted projections of the snapshot and the
//! display models built from them.
//!
//! [`project`] is pure: the same snapshot, search text and sort spec always
//! produce the same sequence.

mod card;
mod lightbox;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entry::CatalogEntry;
use crate::sync::CatalogSnapshot;

pub use card::{
    format_brl, CardView, MISSING_BRAND, MISSING_MODEL, NO_IMAGE_PLACEHOLDER, PRICE_UNAVAILABLE,
};
pub use lightbox::{Lightbox, INVALID_IMAGE_PLACEHOLDER};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortField {
    /// Keep the snapshot order (newest first).
    #[default]
    Default,
    Price,
    Model,
    Brand,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Sort key plus direction, as picked in the sort selector.
///
/// Textual form: `default`, `price-asc`, `price-desc`, `model-asc`,
/// `model-desc`, `brand-asc`, `brand-desc`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    fn compare(&self, a: &CatalogEntry, b: &CatalogEntry) -> Ordering {
        let ord = match self.field {
            SortField::Default => Ordering::Equal,
            SortField::Price => a.price.total_cmp(&b.price),
            SortField::Model => a.model.to_lowercase().cmp(&b.model.to_lowercase()),
            SortField::Brand => a.brand.to_lowercase().cmp(&b.brand.to_lowercase()),
        };
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSortError(pub String);

impl fmt::Display for ParseSortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sort option: {:?}", self.0)
    }
}

impl std::error::Error for ParseSortError {}

impl FromStr for SortSpec {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() || raw == "default" {
            return Ok(SortSpec::default());
        }

        let (field, direction) = raw
            .split_once('-')
            .ok_or_else(|| ParseSortError(s.to_string()))?;
        let field = match field {
            "price" => SortField::Price,
            "model" => SortField::Model,
            "brand" => SortField::Brand,
            _ => return Err(ParseSortError(s.to_string())),
        };
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return Err(ParseSortError(s.to_string())),
        };
        Ok(SortSpec { field, direction })
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            SortField::Default => return f.write_str("default"),
            SortField::Price => "price",
            SortField::Model => "model",
            SortField::Brand => "brand",
        };
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{}-{}", field, direction)
    }
}

impl TryFrom<String> for SortSpec {
    type Error = ParseSortError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortSpec> for String {
    fn from(spec: SortSpec) -> Self {
        spec.to_string()
    }
}

/// Whether `entry` matches a lowercased, trimmed search needle.
fn matches(entry: &CatalogEntry, needle: &str) -> bool {
    needle.is_empty()
        || entry.model.to_lowercase().contains(needle)
        || entry.brand.to_lowercase().contains(needle)
}

/// Entries whose model or brand contains `search` (case-insensitive),
/// ordered by `sort`. Equal keys keep their snapshot order.
pub fn project(snapshot: &CatalogSnapshot, search: &str, sort: SortSpec) -> Vec<CatalogEntry> {
    let needle = search.trim().to_lowercase();
    let mut entries: Vec<CatalogEntry> = snapshot
        .entries()
        .iter()
        .filter(|e| matches(e, &needle))
        .cloned()
        .collect();

    if sort.field != SortField::Default {
        entries.sort_by(|a, b| sort.compare(a, b));
    }
    entries
}
