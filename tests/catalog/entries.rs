use bike_catalog::{
    CatalogError, CatalogSync, InMemoryDocumentStore, ValidationError,
};

use crate::support::{form, started, wait_for_cards};

#[tokio::test]
async fn created_entry_round_trips_through_sync() {
    let store = InMemoryDocumentStore::new();
    let admin = started(&store).await;

    let id = admin
        .add_entry(&form("Aero", "Zeta", "999.5", "a.png, b.png"))
        .await
        .unwrap();
    assert!(!id.is_empty());

    let sync = CatalogSync::new(store.clone(), admin.paths().entries());
    let mut stream = sync.subscribe().await.unwrap();
    let snapshot = stream.next().await.unwrap().unwrap();

    let entry = snapshot.get(&id).unwrap();
    assert_eq!(entry.model, "Aero");
    assert_eq!(entry.brand, "Zeta");
    assert_eq!(entry.price, 999.5);
    assert_eq!(entry.images, ["a.png", "b.png"]);
    assert_eq!(entry.description, None);
    assert!(entry.created_at.is_some());
}

#[tokio::test]
async fn admin_writes_reach_every_session() {
    let store = InMemoryDocumentStore::new();
    let admin = started(&store).await;
    let visitor = started(&store).await;

    let id = admin
        .add_entry(&form("Aero", "Zeta", "999.5", "a.png"))
        .await
        .unwrap();

    let seen = wait_for_cards(&visitor, 1).await;
    let card = &seen.cards()[0];
    assert_eq!(card.id, id);
    assert_eq!(card.price_label, "R$ 999,50");
    assert!(!card.deletable);

    admin.delete_entry(&id).await.unwrap();
    wait_for_cards(&visitor, 0).await;
    assert!(visitor.snapshot().unwrap().unwrap().is_empty());
}

#[tokio::test]
async fn newest_entries_come_first() {
    let store = InMemoryDocumentStore::new();
    let admin = started(&store).await;

    for model in ["First", "Second", "Third"] {
        admin
            .add_entry(&form(model, "Zeta", "10", "a.png"))
            .await
            .unwrap();
    }

    let gallery = wait_for_cards(&admin, 3).await;
    let titles: Vec<&str> = gallery.cards().iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, ["Third", "Second", "First"]);
}

#[tokio::test]
async fn invalid_forms_are_rejected_inline() {
    let store = InMemoryDocumentStore::new();
    let admin = started(&store).await;

    let cases = [
        (form("", "Zeta", "10", "a.png"), ValidationError::MissingField("model")),
        (form("Aero", " ", "10", "a.png"), ValidationError::MissingField("brand")),
        (form("Aero", "Zeta", "abc", "a.png"), ValidationError::InvalidPrice("abc".into())),
        (form("Aero", "Zeta", "10", " , "), ValidationError::NoImages),
    ];
    for (input, expected) in cases {
        let err = admin.add_entry(&input).await.unwrap_err();
        assert_eq!(err, CatalogError::Validation(expected));
        assert_eq!(err.status_code(), 400);
    }
    assert!(store.is_empty(&admin.paths().entries()));
}

#[tokio::test]
async fn deleting_a_missing_entry_is_harmless() {
    let store = InMemoryDocumentStore::new();
    let admin = started(&store).await;
    admin.delete_entry("does-not-exist").await.unwrap();
}
