use crate::auth::SessionId;
use crate::sync::CatalogSnapshot;
use crate::view::{project, CardView, Lightbox, SortSpec};

/// What the gallery currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum GalleryState {
    /// No snapshot delivered yet.
    Loading,
    /// Nothing to show: the catalog is empty or nothing matches the search.
    Empty,
    Ready(Vec<CardView>),
    /// The subscription failed; holds the reported message.
    Error(String),
}

impl GalleryState {
    pub fn cards(&self) -> &[CardView] {
        match self {
            GalleryState::Ready(cards) => cards,
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, GalleryState::Loading)
    }

    /// Short lowercase name of the variant.
    pub fn label(&self) -> &'static str {
        match self {
            GalleryState::Loading => "loading",
            GalleryState::Empty => "empty",
            GalleryState::Ready(_) => "ready",
            GalleryState::Error(_) => "error",
        }
    }
}

/// Everything one client session knows. Owned by
/// [`CatalogApp`](super::CatalogApp); the sync task only ever replaces the
/// snapshot wholesale.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub session: Option<SessionId>,
    pub is_admin: bool,
    /// `None` until the first delivery.
    pub snapshot: Option<CatalogSnapshot>,
    pub search: String,
    pub sort: SortSpec,
    pub lightbox: Option<Lightbox>,
    /// Entry the open lightbox was opened on.
    pub lightbox_entry: Option<String>,
    pub admin_panel_open: bool,
    pub sync_error: Option<String>,
}

impl AppState {
    /// Replace the snapshot. A lightbox whose entry is gone is closed.
    pub fn apply_snapshot(&mut self, snapshot: CatalogSnapshot) {
        let entry_gone = self
            .lightbox_entry
            .as_deref()
            .is_some_and(|id| snapshot.get(id).is_none());
        if entry_gone {
            self.close_lightbox();
        }
        self.snapshot = Some(snapshot);
        self.sync_error = None;
    }

    pub fn open_lightbox(&mut self, entry_id: &str, lightbox: Option<Lightbox>) {
        self.lightbox_entry = lightbox.as_ref().map(|_| entry_id.to_string());
        self.lightbox = lightbox;
    }

    pub fn close_lightbox(&mut self) {
        self.lightbox = None;
        self.lightbox_entry = None;
    }

    /// Take on a new identity after an auth change.
    pub fn switch_session(&mut self, session: SessionId, is_admin: bool) {
        self.session = Some(session);
        self.is_admin = is_admin;
        if !is_admin {
            self.admin_panel_open = false;
        }
    }

    pub fn apply_error(&mut self, message: String) {
        self.sync_error = Some(message);
    }

    /// Gallery under the current search text and sort.
    pub fn render(&self) -> GalleryState {
        self.render_with(&self.search, self.sort)
    }

    /// Gallery under an explicit search text and sort, leaving state untouched.
    pub fn render_with(&self, search: &str, sort: SortSpec) -> GalleryState {
        if let Some(message) = &self.sync_error {
            return GalleryState::Error(message.clone());
        }
        let Some(snapshot) = &self.snapshot else {
            return GalleryState::Loading;
        };

        let cards: Vec<CardView> = project(snapshot, search, sort)
            .iter()
            .map(|entry| CardView::from_entry(entry, self.is_admin))
            .collect();
        if cards.is_empty() {
            GalleryState::Empty
        } else {
            GalleryState::Ready(cards)
        }
    }
}
