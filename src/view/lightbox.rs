use serde::Serialize;
use tracing::warn;

/// Shown in place of an image that fails to load.
pub const INVALID_IMAGE_PLACEHOLDER: &str =
    "https://placehold.co/800x600/e2e8f0/94a3b8?text=Invalid+Image";

/// Image viewer over one entry's images. Navigation wraps in both directions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Lightbox {
    images: Vec<String>,
    index: usize,
}

impl Lightbox {
    /// Open on the first image. Refuses an empty list.
    pub fn open(images: Vec<String>) -> Option<Self> {
        if images.is_empty() {
            warn!("lightbox requested for an entry without images");
            return None;
        }
        Some(Self { images, index: 0 })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn current(&self) -> Option<&str> {
        self.images.get(self.index).map(String::as_str)
    }

    pub fn next(&mut self) {
        if !self.images.is_empty() {
            self.index = (self.index + 1) % self.images.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.images.is_empty() {
            self.index = (self.index + self.images.len() - 1) % self.images.len();
        }
    }

    /// `"i / n"`, one-based.
    pub fn counter(&self) -> String {
        format!("{} / {}", self.index + 1, self.images.len())
    }

    /// Prev/next controls are hidden for a single image.
    pub fn shows_navigation(&self) -> bool {
        self.images.len() > 1
    }

    pub fn close(&mut self) {
        self.images.clear();
        self.index = 0;
    }
}
