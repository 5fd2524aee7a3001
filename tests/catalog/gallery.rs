use bike_catalog::{GalleryState, InMemoryDocumentStore, SortSpec, StoreError};

use crate::support::{form, started, wait_for_cards};

#[tokio::test]
async fn empty_catalog_renders_empty() {
    let store = InMemoryDocumentStore::new();
    let app = started(&store).await;
    assert_eq!(app.gallery(), GalleryState::Empty);
}

#[tokio::test]
async fn search_and_sort_shape_the_gallery() {
    let store = InMemoryDocumentStore::new();
    let app = started(&store).await;

    app.add_entry(&form("Aero", "Zeta", "999.5", "a.png")).await.unwrap();
    app.add_entry(&form("Trail", "Caloi", "1500", "t.png")).await.unwrap();
    app.add_entry(&form("Urban", "zeta", "800", "u.png")).await.unwrap();
    wait_for_cards(&app, 3).await;

    let filtered = app.set_search("ZETA").unwrap();
    let titles: Vec<&str> = filtered.cards().iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, ["Urban", "Aero"]);

    let sorted = app.set_sort("price-asc".parse().unwrap()).unwrap();
    let titles: Vec<&str> = sorted.cards().iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, ["Urban", "Aero"]);

    app.set_search("").unwrap();
    let sorted = app.set_sort("price-desc".parse().unwrap()).unwrap();
    let titles: Vec<&str> = sorted.cards().iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, ["Trail", "Aero", "Urban"]);

    assert_eq!(app.set_search("nothing").unwrap(), GalleryState::Empty);
    app.set_search("").unwrap();
    app.set_sort(SortSpec::default()).unwrap();
    assert_eq!(app.gallery().cards().len(), 3);
}

#[tokio::test]
async fn later_snapshots_keep_search_applied() {
    let store = InMemoryDocumentStore::new();
    let app = started(&store).await;
    app.set_search("trail").unwrap();

    let mut gallery = app.watch_gallery();
    app.add_entry(&form("Aero", "Zeta", "10", "a.png")).await.unwrap();
    app.add_entry(&form("Trail", "Caloi", "10", "t.png")).await.unwrap();

    let state = gallery
        .wait_for(|g| g.cards().len() == 1)
        .await
        .unwrap()
        .clone();
    assert_eq!(state.cards()[0].title, "Trail");
}

#[tokio::test]
async fn lightbox_wraps_over_three_images() {
    let store = InMemoryDocumentStore::new();
    let app = started(&store).await;
    let id = app
        .add_entry(&form("Aero", "Zeta", "10", "a.png, b.png, c.png"))
        .await
        .unwrap();
    wait_for_cards(&app, 1).await;

    let lightbox = app.open_lightbox(&id).unwrap().unwrap();
    assert_eq!(lightbox.index(), 0);
    assert!(lightbox.shows_navigation());

    for _ in 0..3 {
        app.next_image().unwrap();
    }
    assert_eq!(app.lightbox().unwrap().unwrap().index(), 0);

    let back = app.previous_image().unwrap().unwrap();
    assert_eq!(back.index(), 2);
    assert_eq!(back.current(), Some("c.png"));
    assert_eq!(back.counter(), "3 / 3");

    app.close_lightbox().unwrap();
    assert!(app.lightbox().unwrap().is_none());
}

#[tokio::test]
async fn subscription_failure_shows_error() {
    let store = InMemoryDocumentStore::new();
    let app = started(&store).await;

    let mut gallery = app.watch_gallery();
    store
        .break_subscriptions(
            &app.paths().entries(),
            StoreError::Unavailable("connection lost".into()),
        )
        .unwrap();
    let state = gallery
        .wait_for(|g| matches!(g, GalleryState::Error(_)))
        .await
        .unwrap()
        .clone();
    assert!(matches!(state, GalleryState::Error(msg) if msg.contains("connection lost")));
}
