//! HTTP surface over one running [`CatalogApp`].
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `GET /health` - `{ "ok": true }`.
//! - `GET /session` - `{ "session_id", "is_admin", "app_id" }`.
//! - `GET /entries?search=&sort=` - projected cards; query parameters only, session state untouched.
//! - `POST /entries` - body is an [`EntryForm`]; `201 { "id" }`.
//! - `DELETE /entries/:id` - `204`.
//! - `POST /suggestions` - `{ "model", "brand", "price" }` to `{ "text" }`.
//!
//! Errors become `{ "error": message }` with the status from
//! [`CatalogError::status_code`].
//!
//! ## Example
//!
//! ```ignore
//! let app = Arc::new(CatalogApp::new(&config, store, auth)?);
//! app.start().await?;
//! bike_catalog::http::serve(app, "0.0.0.0:3000").await?;
//! ```

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::app::{CatalogApp, GalleryState};
use crate::auth::AuthProvider;
use crate::backoff::Transport;
use crate::entry::EntryForm;
use crate::error::CatalogError;
use crate::store::DocumentStore;
use crate::view::SortSpec;

type SharedApp<S, A, T> = Arc<CatalogApp<S, A, T>>;

/// Build an axum `Router` over the given app.
pub fn router<S, A, T>(app: SharedApp<S, A, T>) -> Router
where
    S: DocumentStore + Clone,
    A: AuthProvider,
    T: Transport + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/session", get(session_handler::<S, A, T>))
        .route(
            "/entries",
            get(list_handler::<S, A, T>).post(add_handler::<S, A, T>),
        )
        .route("/entries/:id", delete(delete_handler::<S, A, T>))
        .route("/suggestions", post(suggest_handler::<S, A, T>))
        .with_state(app)
}

/// Serve the app over HTTP at the given address (e.g. `"0.0.0.0:3000"`).
pub async fn serve<S, A, T>(app: SharedApp<S, A, T>, addr: &str) -> Result<(), std::io::Error>
where
    S: DocumentStore + Clone,
    A: AuthProvider,
    T: Transport + 'static,
{
    let router = router(app);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "catalog http surface listening");
    axum::serve(listener, router).await
}

fn error_response(err: CatalogError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

/// `GET /health`
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

/// `GET /session`
async fn session_handler<S, A, T>(State(app): State<SharedApp<S, A, T>>) -> Response
where
    S: DocumentStore + Clone,
    A: AuthProvider,
    T: Transport + 'static,
{
    let result = app
        .session()
        .and_then(|session| Ok((session, app.is_admin()?)));
    match result {
        Ok((session, is_admin)) => Json(json!({
            "session_id": session.map(|s| s.as_str().to_string()),
            "is_admin": is_admin,
            "app_id": app.paths().app_id(),
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    search: String,
    #[serde(default)]
    sort: Option<String>,
}

/// `GET /entries?search=&sort=`
async fn list_handler<S, A, T>(
    State(app): State<SharedApp<S, A, T>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: DocumentStore + Clone,
    A: AuthProvider,
    T: Transport + 'static,
{
    let sort = match query.sort.as_deref().map(str::parse::<SortSpec>).transpose() {
        Ok(sort) => sort.unwrap_or_default(),
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
                .into_response()
        }
    };

    match app.render_with(&query.search, sort) {
        Ok(GalleryState::Error(message)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "state": "error", "error": message, "cards": [] })),
        )
            .into_response(),
        Ok(gallery) => Json(json!({
            "state": gallery.label(),
            "cards": gallery.cards(),
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// `POST /entries`
async fn add_handler<S, A, T>(
    State(app): State<SharedApp<S, A, T>>,
    Json(form): Json<EntryForm>,
) -> Response
where
    S: DocumentStore + Clone,
    A: AuthProvider,
    T: Transport + 'static,
{
    match app.add_entry(&form).await {
        Ok(id) => (StatusCode::CREATED, Json(json!({ "id": id }))).into_response(),
        Err(e) => error_response(e),
    }
}

/// `DELETE /entries/:id`
async fn delete_handler<S, A, T>(
    State(app): State<SharedApp<S, A, T>>,
    Path(id): Path<String>,
) -> Response
where
    S: DocumentStore + Clone,
    A: AuthProvider,
    T: Transport + 'static,
{
    match app.delete_entry(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct SuggestionInput {
    #[serde(default)]
    model: String,
    #[serde(default)]
    brand: String,
    #[serde(default)]
    price: Option<String>,
}

/// `POST /suggestions`
async fn suggest_handler<S, A, T>(
    State(app): State<SharedApp<S, A, T>>,
    Json(input): Json<SuggestionInput>,
) -> Response
where
    S: DocumentStore + Clone,
    A: AuthProvider,
    T: Transport + 'static,
{
    match app
        .generate_description(&input.model, &input.brand, input.price.as_deref())
        .await
    {
        Ok(text) => Json(json!({ "text": text })).into_response(),
        Err(e) => error_response(e),
    }
}
