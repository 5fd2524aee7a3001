//! HTTP surface tests. Starts an axum server and exercises it with reqwest.

use std::sync::Arc;

use bike_catalog::{http, InMemoryDocumentStore};
use serde_json::{json, Value};

use crate::support::{started, wait_for_cards, TestApp};

/// Bind to port 0 and return the actual address.
async fn start_server(app: Arc<TestApp>) -> String {
    let router = http::router(app);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn health_and_session() {
    let store = InMemoryDocumentStore::new();
    let app = Arc::new(started(&store).await);
    let session = app.session().unwrap().unwrap();
    let base = start_server(app).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);

    let body: Value = client
        .get(format!("{base}/session"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["session_id"], session.as_str());
    assert_eq!(body["is_admin"], true);
    assert_eq!(body["app_id"], "default-app-id");
}

#[tokio::test]
async fn add_list_and_delete() {
    let store = InMemoryDocumentStore::new();
    let app = Arc::new(started(&store).await);
    let base = start_server(Arc::clone(&app)).await;
    let client = reqwest::Client::new();

    for (model, brand, price) in [("Aero", "Zeta", "999.5"), ("Trail", "Caloi", "1500")] {
        let resp = client
            .post(format!("{base}/entries"))
            .json(&json!({
                "model": model,
                "brand": brand,
                "price": price,
                "image_urls": "a.png, b.png",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body: Value = resp.json().await.unwrap();
        assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
    }
    wait_for_cards(&app, 2).await;

    let body: Value = client
        .get(format!("{base}/entries?search=zeta"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["state"], "ready");
    let cards = body["cards"].as_array().unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0]["title"], "Aero");
    assert_eq!(cards[0]["priceLabel"], "R$ 999,50");
    let aero_id = cards[0]["id"].as_str().unwrap().to_string();

    let body: Value = client
        .get(format!("{base}/entries?sort=price-desc"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let titles: Vec<&str> = body["cards"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Trail", "Aero"]);

    let resp = client
        .delete(format!("{base}/entries/{aero_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
    wait_for_cards(&app, 1).await;
}

#[tokio::test]
async fn bad_input_maps_to_client_errors() {
    let store = InMemoryDocumentStore::new();
    let app = Arc::new(started(&store).await);
    let base = start_server(app).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/entries?sort=color-asc"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{base}/entries"))
        .json(&json!({ "model": "Aero", "brand": "Zeta", "price": "0", "image_urls": "a.png" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("price"));

    let resp = client
        .post(format!("{base}/suggestions"))
        .json(&json!({ "model": "", "brand": "Zeta" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{base}/suggestions"))
        .json(&json!({ "model": "Aero", "brand": "Zeta", "price": "999.5" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
}

#[tokio::test]
async fn visitors_are_forbidden() {
    let store = InMemoryDocumentStore::new();
    let _admin = started(&store).await;
    let visitor = Arc::new(started(&store).await);
    let base = start_server(visitor).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/entries"))
        .json(&json!({ "model": "Aero", "brand": "Zeta", "price": "10", "image_urls": "a.png" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = client
        .delete(format!("{base}/entries/anything"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}
