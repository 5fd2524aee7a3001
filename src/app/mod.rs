//! Session coordinator - one client session over a shared catalog.
//!
//! ```text
//! start() ──► sign in ──► admin election ──► catalog sync task
//!                                                  │ every snapshot
//!                                                  ▼
//!                     AppState { snapshot, search, sort, .. } ──► render ──► watch<GalleryState>
//!                                  ▲
//!          set_search / set_sort ──┘ (re-render synchronously)
//!
//! add_entry / delete_entry ──► store write (visible only via the next snapshot)
//!
//! auth state ──► signed out: sign in again
//!            └─► new identity: admin election ──► restart catalog sync
//! ```
//!
//! All mutable session state lives in one [`AppState`] behind the app; the
//! sync task replaces its snapshot wholesale and nothing else writes to it
//! concurrently.
//!
//! ## Example
//!
//! ```ignore
//! use bike_catalog::{CatalogApp, CatalogConfig, EntryForm, InMemoryAuth, InMemoryDocumentStore};
//!
//! let app = CatalogApp::new(&CatalogConfig::default(), InMemoryDocumentStore::new(), InMemoryAuth::new())?;
//! let session = app.start().await?;
//! app.loaded().await;
//! if app.is_admin()? {
//!     app.add_entry(form).await?;
//! }
//! ```

mod state;

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::admin::AdminElection;
use crate::auth::{AuthProvider, Credentials, SessionId};
use crate::backoff::{ReqwestTransport, Transport};
use crate::config::CatalogConfig;
use crate::entry::EntryForm;
use crate::error::CatalogError;
use crate::store::{CatalogPaths, DocumentStore, StoreError};
use crate::suggest::SuggestionClient;
use crate::sync::{CatalogSnapshot, CatalogSync, SyncHandle};
use crate::view::{Lightbox, SortSpec};

pub use state::{AppState, GalleryState};

type SharedState = Arc<RwLock<AppState>>;

/// One client session: sign-in, admin flag, live gallery and actions.
pub struct CatalogApp<S, A, T = ReqwestTransport> {
    store: S,
    auth: Arc<A>,
    suggestions: SuggestionClient<T>,
    paths: CatalogPaths,
    credentials: Credentials,
    state: SharedState,
    gallery: Arc<watch::Sender<GalleryState>>,
    sync: Arc<Mutex<Option<SyncHandle>>>,
    auth_watch: Mutex<Option<JoinHandle<()>>>,
}

impl<S, A> CatalogApp<S, A, ReqwestTransport>
where
    S: DocumentStore + Clone,
    A: AuthProvider,
{
    /// App whose suggestions go over real HTTP.
    pub fn new(config: &CatalogConfig, store: S, auth: A) -> Result<Self, CatalogError> {
        let suggestions = SuggestionClient::from_config(&config.generation)?;
        Ok(Self::with_suggestions(config, store, auth, suggestions))
    }
}

impl<S, A, T> CatalogApp<S, A, T>
where
    S: DocumentStore + Clone,
    A: AuthProvider,
    T: Transport,
{
    pub fn with_transport(config: &CatalogConfig, store: S, auth: A, transport: T) -> Self {
        let suggestions = SuggestionClient::new(transport, &config.generation);
        Self::with_suggestions(config, store, auth, suggestions)
    }

    pub fn with_suggestions(
        config: &CatalogConfig,
        store: S,
        auth: A,
        suggestions: SuggestionClient<T>,
    ) -> Self {
        let (gallery, _) = watch::channel(GalleryState::Loading);
        Self {
            store,
            auth: Arc::new(auth),
            suggestions,
            paths: CatalogPaths::new(config.app_id.clone()),
            credentials: Credentials::from_token(config.initial_auth_token.as_deref()),
            state: Arc::new(RwLock::new(AppState::default())),
            gallery: Arc::new(gallery),
            sync: Arc::new(Mutex::new(None)),
            auth_watch: Mutex::new(None),
        }
    }

    pub fn paths(&self) -> &CatalogPaths {
        &self.paths
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    pub fn suggestions(&self) -> &SuggestionClient<T> {
        &self.suggestions
    }

    fn read_state(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, AppState>, CatalogError> {
        self.state
            .read()
            .map_err(|_| CatalogError::LockPoisoned(operation))
    }

    fn write_state(
        &self,
        operation: &'static str,
    ) -> Result<RwLockWriteGuard<'_, AppState>, CatalogError> {
        self.state
            .write()
            .map_err(|_| CatalogError::LockPoisoned(operation))
    }

    /// Update state and publish the re-rendered gallery.
    fn update<R>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut AppState) -> R,
    ) -> Result<R, CatalogError> {
        let mut state = self.write_state(operation)?;
        let result = f(&mut state);
        self.gallery.send_replace(state.render());
        Ok(result)
    }

    fn require_admin(&self, action: &str) -> Result<(), CatalogError> {
        let state = self.read_state("require_admin")?;
        if state.session.is_none() {
            return Err(CatalogError::NotStarted);
        }
        if !state.is_admin {
            return Err(CatalogError::Unauthorized(action.to_string()));
        }
        Ok(())
    }

    /// Sign in, elect the admin and start syncing the catalog.
    ///
    /// A failed election leaves the session a regular visitor. Calling
    /// `start` again returns the same session without side effects. Later
    /// auth changes are followed in the background: a sign-out triggers a
    /// fresh sign-in, and a new identity re-runs the election and restarts
    /// the catalog sync.
    pub async fn start(&self) -> Result<SessionId, CatalogError> {
        let mut sync = self.sync.lock().await;
        if sync.is_some() {
            if let Some(session) = self.session()? {
                return Ok(session);
            }
        }

        let auth_state = self.auth.auth_state();
        let session = match self.auth.current_session() {
            Some(session) => session,
            None => self.auth.sign_in(self.credentials.clone()).await?,
        };

        let is_admin = elect(&self.store, &self.paths, &session).await;
        self.update("start", |state| {
            state.session = Some(session.clone());
            state.is_admin = is_admin;
        })?;

        let handle = spawn_sync(&self.store, &self.paths, &self.state, &self.gallery)
            .await
            .map_err(|err| {
                error!(session = %session, %err, "failed to subscribe to the catalog");
                err
            })?;
        *sync = Some(handle);
        drop(sync);

        let watcher = AuthWatcher {
            store: self.store.clone(),
            auth: Arc::clone(&self.auth),
            credentials: self.credentials.clone(),
            paths: self.paths.clone(),
            state: Arc::clone(&self.state),
            gallery: Arc::clone(&self.gallery),
            sync: Arc::clone(&self.sync),
        };
        if let Some(previous) = self
            .auth_watch
            .lock()
            .await
            .replace(tokio::spawn(watcher.run(auth_state)))
        {
            previous.abort();
        }

        info!(session = %session, is_admin, app_id = %self.paths.app_id(), "catalog session started");
        Ok(session)
    }

    /// Wait until the first snapshot (or subscription error) has been rendered.
    pub async fn loaded(&self) -> GalleryState {
        let mut rx = self.gallery.subscribe();
        let loaded = rx.wait_for(|gallery| !gallery.is_loading()).await;
        match loaded {
            Ok(gallery) => gallery.clone(),
            Err(_) => self.gallery(),
        }
    }

    pub fn session(&self) -> Result<Option<SessionId>, CatalogError> {
        Ok(self.read_state("session")?.session.clone())
    }

    pub fn is_admin(&self) -> Result<bool, CatalogError> {
        Ok(self.read_state("is_admin")?.is_admin)
    }

    /// Latest delivered snapshot, if any.
    pub fn snapshot(&self) -> Result<Option<CatalogSnapshot>, CatalogError> {
        Ok(self.read_state("snapshot")?.snapshot.clone())
    }

    /// Validate the form and write a new entry. Returns the store-assigned id.
    pub async fn add_entry(&self, form: &EntryForm) -> Result<String, CatalogError> {
        self.require_admin("add entries")?;
        let entry = form.validate()?;

        let id = self
            .store
            .add(&self.paths.entries(), entry.to_document())
            .await
            .map_err(|err| {
                error!(%err, model = %entry.model, "failed to add entry");
                err
            })?;
        info!(%id, model = %entry.model, brand = %entry.brand, "entry added");
        Ok(id)
    }

    pub async fn delete_entry(&self, id: &str) -> Result<(), CatalogError> {
        self.require_admin("delete entries")?;
        self.store
            .delete(&self.paths.entry(id))
            .await
            .map_err(|err| {
                error!(%err, %id, "failed to delete entry");
                err
            })?;
        info!(%id, "entry deleted");
        Ok(())
    }

    /// Suggest a description for the entry being filled in.
    pub async fn generate_description(
        &self,
        model: &str,
        brand: &str,
        price: Option<&str>,
    ) -> Result<String, CatalogError> {
        let text = self.suggestions.generate(model, brand, price).await?;
        Ok(text.into_string())
    }

    pub fn set_search(&self, search: impl Into<String>) -> Result<GalleryState, CatalogError> {
        let search = search.into();
        self.update("set_search", |state| {
            state.search = search;
            state.render()
        })
    }

    pub fn set_sort(&self, sort: SortSpec) -> Result<GalleryState, CatalogError> {
        self.update("set_sort", |state| {
            state.sort = sort;
            state.render()
        })
    }

    /// The gallery as last rendered.
    pub fn gallery(&self) -> GalleryState {
        self.gallery.borrow().clone()
    }

    /// Receives every re-render.
    pub fn watch_gallery(&self) -> watch::Receiver<GalleryState> {
        self.gallery.subscribe()
    }

    /// Render with an explicit search and sort without touching session state.
    pub fn render_with(&self, search: &str, sort: SortSpec) -> Result<GalleryState, CatalogError> {
        Ok(self.read_state("render_with")?.render_with(search, sort))
    }

    /// Open the lightbox on an entry's images. `None` when it has no images.
    pub fn open_lightbox(&self, entry_id: &str) -> Result<Option<Lightbox>, CatalogError> {
        let mut state = self.write_state("open_lightbox")?;
        let images = state
            .snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.get(entry_id))
            .map(|entry| entry.images.clone())
            .ok_or_else(|| CatalogError::NotFound(entry_id.to_string()))?;

        state.open_lightbox(entry_id, Lightbox::open(images));
        Ok(state.lightbox.clone())
    }

    pub fn next_image(&self) -> Result<Option<Lightbox>, CatalogError> {
        let mut state = self.write_state("next_image")?;
        if let Some(lightbox) = state.lightbox.as_mut() {
            lightbox.next();
        }
        Ok(state.lightbox.clone())
    }

    pub fn previous_image(&self) -> Result<Option<Lightbox>, CatalogError> {
        let mut state = self.write_state("previous_image")?;
        if let Some(lightbox) = state.lightbox.as_mut() {
            lightbox.previous();
        }
        Ok(state.lightbox.clone())
    }

    pub fn close_lightbox(&self) -> Result<(), CatalogError> {
        self.write_state("close_lightbox")?.close_lightbox();
        Ok(())
    }

    pub fn lightbox(&self) -> Result<Option<Lightbox>, CatalogError> {
        Ok(self.read_state("lightbox")?.lightbox.clone())
    }

    /// Show or hide the entry form. Returns the new visibility.
    pub fn toggle_admin_panel(&self) -> Result<bool, CatalogError> {
        self.require_admin("open the admin panel")?;
        let mut state = self.write_state("toggle_admin_panel")?;
        state.admin_panel_open = !state.admin_panel_open;
        Ok(state.admin_panel_open)
    }

    pub fn admin_panel_open(&self) -> Result<bool, CatalogError> {
        Ok(self.read_state("admin_panel_open")?.admin_panel_open)
    }

    /// Stop following auth changes and the catalog subscription. The
    /// session identity is kept.
    pub async fn shutdown(&self) {
        if let Some(watch) = self.auth_watch.lock().await.take() {
            watch.abort();
        }
        if let Some(handle) = self.sync.lock().await.take() {
            handle.cancel();
            info!("catalog sync stopped");
        }
    }
}

impl<S, A, T> Drop for CatalogApp<S, A, T> {
    fn drop(&mut self) {
        if let Some(watch) = self.auth_watch.get_mut().take() {
            watch.abort();
        }
    }
}

/// Run the admin election for `session`. Failures leave it a visitor.
async fn elect<S>(store: &S, paths: &CatalogPaths, session: &SessionId) -> bool
where
    S: DocumentStore + Clone,
{
    let election = AdminElection::new(store.clone(), paths.admin_marker());
    match election.establish(session).await {
        Ok(is_admin) => is_admin,
        Err(err) => {
            error!(session = %session, %err, "admin election failed, continuing as visitor");
            false
        }
    }
}

/// Subscribe to the entries and feed every delivery into `state`.
async fn spawn_sync<S>(
    store: &S,
    paths: &CatalogPaths,
    state: &SharedState,
    gallery: &Arc<watch::Sender<GalleryState>>,
) -> Result<SyncHandle, StoreError>
where
    S: DocumentStore + Clone,
{
    let on_update = {
        let state = Arc::clone(state);
        let gallery = Arc::clone(gallery);
        move |snapshot: CatalogSnapshot| {
            publish(&state, &gallery, |s| s.apply_snapshot(snapshot));
        }
    };
    let on_error = {
        let state = Arc::clone(state);
        let gallery = Arc::clone(gallery);
        move |err: StoreError| {
            publish(&state, &gallery, |s| s.apply_error(err.to_string()));
        }
    };
    CatalogSync::new(store.clone(), paths.entries())
        .spawn(on_update, on_error)
        .await
}

/// Follows auth-state changes for a started app.
struct AuthWatcher<S, A> {
    store: S,
    auth: Arc<A>,
    credentials: Credentials,
    paths: CatalogPaths,
    state: SharedState,
    gallery: Arc<watch::Sender<GalleryState>>,
    sync: Arc<Mutex<Option<SyncHandle>>>,
}

impl<S, A> AuthWatcher<S, A>
where
    S: DocumentStore + Clone,
    A: AuthProvider,
{
    async fn run(self, mut auth_state: watch::Receiver<Option<SessionId>>) {
        while auth_state.changed().await.is_ok() {
            let current = auth_state.borrow_and_update().clone();
            match current {
                None => {
                    info!("signed out, signing in again");
                    if let Err(err) = self.auth.sign_in(self.credentials.clone()).await {
                        error!(%err, "sign-in after sign-out failed");
                    }
                }
                Some(session) => self.switch_to(session).await,
            }
        }
    }

    async fn switch_to(&self, session: SessionId) {
        let known = match self.state.read() {
            Ok(state) => state.session.clone(),
            Err(_) => {
                error!("catalog state lock poisoned, ignoring auth change");
                return;
            }
        };
        if known.as_ref() == Some(&session) {
            return;
        }

        let is_admin = elect(&self.store, &self.paths, &session).await;
        publish(&self.state, &self.gallery, |s| {
            s.switch_session(session.clone(), is_admin)
        });

        let mut sync = self.sync.lock().await;
        if let Some(previous) = sync.take() {
            previous.cancel();
        }
        match spawn_sync(&self.store, &self.paths, &self.state, &self.gallery).await {
            Ok(handle) => *sync = Some(handle),
            Err(err) => {
                warn!(session = %session, %err, "failed to resubscribe after auth change");
                publish(&self.state, &self.gallery, |s| s.apply_error(err.to_string()));
            }
        }
        info!(session = %session, is_admin, "session identity changed");
    }
}

/// Apply a change from the sync task and publish the re-render.
fn publish(
    state: &RwLock<AppState>,
    gallery: &watch::Sender<GalleryState>,
    f: impl FnOnce(&mut AppState),
) {
    match state.write() {
        Ok(mut state) => {
            f(&mut state);
            gallery.send_replace(state.render());
        }
        Err(_) => error!("catalog state lock poisoned, dropping snapshot"),
    }
}
