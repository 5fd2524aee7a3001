//! Shared fixtures: sessions over one store, with generation switched off.

use async_trait::async_trait;
use bike_catalog::{
    CatalogApp, CatalogConfig, EntryForm, GalleryState, HttpRequest, HttpResponse,
    InMemoryAuth, InMemoryDocumentStore, Transport, TransportError,
};

/// Transport for sessions that never generate descriptions.
pub struct Offline;

#[async_trait]
impl Transport for Offline {
    async fn send(&self, _request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        Err(TransportError::InvalidRequest("generation disabled in tests".into()))
    }
}

pub type TestApp = CatalogApp<InMemoryDocumentStore, InMemoryAuth, Offline>;

/// A fresh browser session over `store`.
pub fn session(store: &InMemoryDocumentStore) -> TestApp {
    CatalogApp::with_transport(
        &CatalogConfig::default(),
        store.clone(),
        InMemoryAuth::new(),
        Offline,
    )
}

/// Start a session and wait for its first snapshot.
pub async fn started(store: &InMemoryDocumentStore) -> TestApp {
    let app = session(store);
    app.start().await.unwrap();
    app.loaded().await;
    app
}

pub fn form(model: &str, brand: &str, price: &str, images: &str) -> EntryForm {
    EntryForm {
        model: model.into(),
        brand: brand.into(),
        price: price.into(),
        image_urls: images.into(),
        description: String::new(),
    }
}

/// Wait until the session's gallery shows exactly `count` cards.
pub async fn wait_for_cards(app: &TestApp, count: usize) -> GalleryState {
    let mut gallery = app.watch_gallery();
    let state = gallery
        .wait_for(|g| g.cards().len() == count)
        .await
        .unwrap();
    state.clone()
}
