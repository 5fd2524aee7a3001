use std::sync::Arc;

use bike_catalog::{AdminElection, CatalogError, DocumentStore, InMemoryDocumentStore};
use tokio::task::JoinSet;

use crate::support::{form, session, started, TestApp};

#[tokio::test]
async fn first_visitor_becomes_admin() {
    let store = InMemoryDocumentStore::new();

    let first = started(&store).await;
    let second = started(&store).await;

    assert!(first.is_admin().unwrap());
    assert!(!second.is_admin().unwrap());

    let marker = AdminElection::new(store.clone(), first.paths().admin_marker())
        .marker()
        .await
        .unwrap()
        .unwrap();
    assert!(marker.is_owned_by(&first.session().unwrap().unwrap()));
}

#[tokio::test]
async fn visitors_cannot_write() {
    let store = InMemoryDocumentStore::new();
    let _admin = started(&store).await;
    let visitor = started(&store).await;

    let err = visitor
        .add_entry(&form("Aero", "Zeta", "10", "a.png"))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Unauthorized(_)));
    assert_eq!(err.status_code(), 403);
    assert!(store.is_empty(&visitor.paths().entries()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_sessions_agree_on_one_admin() {
    let store = InMemoryDocumentStore::new();
    let apps: Vec<Arc<TestApp>> = (0..6).map(|_| Arc::new(session(&store))).collect();

    let mut starts = JoinSet::new();
    for app in &apps {
        let app = Arc::clone(app);
        starts.spawn(async move { app.start().await });
    }
    while let Some(result) = starts.join_next().await {
        result.unwrap().unwrap();
    }

    let admins: Vec<&Arc<TestApp>> = apps.iter().filter(|app| app.is_admin().unwrap()).collect();
    assert_eq!(admins.len(), 1);

    let marker = store
        .get(&apps[0].paths().admin_marker())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        marker.data["ownerId"].as_str(),
        Some(admins[0].session().unwrap().unwrap().as_str())
    );
}
