//! Description generation against a local stand-in for the generation API.
//!
//! The stand-in is an axum server scripted with a sequence of statuses; the
//! client talks to it through the real reqwest transport.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bike_catalog::{
    GenerationConfig, GenerationFailure, RetryReason, SuggestError, SuggestionClient,
};
use serde_json::{json, Value};

#[derive(Default)]
struct Recorded {
    actions: Vec<String>,
    keys: Vec<String>,
    bodies: Vec<Value>,
}

#[derive(Clone)]
struct Mock {
    /// Statuses to answer with, in order; the last one repeats.
    script: Arc<Vec<u16>>,
    recorded: Arc<Mutex<Recorded>>,
}

impl Mock {
    fn calls(&self) -> usize {
        self.recorded.lock().unwrap().bodies.len()
    }
}

async fn generate(
    State(mock): State<Mock>,
    Path(action): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let call = {
        let mut recorded = mock.recorded.lock().unwrap();
        recorded.actions.push(action);
        recorded.keys.push(query.get("key").cloned().unwrap_or_default());
        recorded.bodies.push(body);
        recorded.bodies.len() - 1
    };

    let status = mock.script[call.min(mock.script.len() - 1)];
    if status == 200 {
        Json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "  Built for the long climb.  " }] } }]
        }))
        .into_response()
    } else {
        (StatusCode::from_u16(status).unwrap(), "scripted failure").into_response()
    }
}

/// Serve the mock on port 0; returns it with the api base URL.
async fn start_mock(script: Vec<u16>) -> (Mock, String) {
    let mock = Mock {
        script: Arc::new(script),
        recorded: Arc::default(),
    };
    let router = Router::new()
        .route("/v1beta/models/:action", post(generate))
        .with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (mock, format!("http://{addr}/v1beta"))
}

fn config(api_base: String, max_retries: u32) -> GenerationConfig {
    GenerationConfig {
        api_base,
        model: "text-model".into(),
        api_key: "test-key".into(),
        max_retries,
        initial_delay_ms: 5,
        request_timeout_secs: 5,
    }
}

#[tokio::test]
async fn recovers_from_rate_limit_and_server_error() {
    let (mock, base) = start_mock(vec![429, 500, 200]).await;
    let client = SuggestionClient::from_config(&config(base, 3)).unwrap();

    let text = client.generate("Aero", "Zeta", Some("999.5")).await.unwrap();
    assert_eq!(text.as_str(), "Built for the long climb.");
    assert_eq!(mock.calls(), 3);

    let recorded = mock.recorded.lock().unwrap();
    assert!(recorded.actions.iter().all(|a| a == "text-model:generateContent"));
    assert!(recorded.keys.iter().all(|k| k == "test-key"));
    let user = recorded.bodies[0]["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap();
    assert!(user.contains("'Aero'") && user.contains("'Zeta'") && user.contains("R$999.5"));
    assert!(recorded.bodies[0]["systemInstruction"]["parts"][0]["text"].is_string());
}

#[tokio::test]
async fn persistent_failure_exhausts_budget() {
    let (mock, base) = start_mock(vec![503]).await;
    let client = SuggestionClient::from_config(&config(base, 2)).unwrap();

    let err = client.generate("Aero", "Zeta", None).await.unwrap_err();
    match err {
        SuggestError::GenerationFailed(GenerationFailure::RetryExhausted { attempts, last }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(last, RetryReason::Status { status: 503, .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(mock.calls(), 3);
}

#[tokio::test]
async fn client_errors_fail_without_retry() {
    let (mock, base) = start_mock(vec![400, 200]).await;
    let client = SuggestionClient::from_config(&config(base, 3)).unwrap();

    let err = client.generate("Aero", "Zeta", None).await.unwrap_err();
    assert!(matches!(
        err,
        SuggestError::GenerationFailed(GenerationFailure::Status { status: 400, .. })
    ));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client =
        SuggestionClient::from_config(&config(format!("http://{addr}/v1beta"), 1)).unwrap();
    let err = client.generate("Aero", "Zeta", None).await.unwrap_err();
    assert!(matches!(
        err,
        SuggestError::GenerationFailed(GenerationFailure::RetryExhausted {
            attempts: 2,
            last: RetryReason::Network(_),
        })
    ));
}

#[tokio::test]
async fn missing_fields_never_reach_the_server() {
    let (mock, base) = start_mock(vec![200]).await;
    let client = SuggestionClient::from_config(&config(base, 3)).unwrap();

    assert!(matches!(
        client.generate("", "Zeta", None).await.unwrap_err(),
        SuggestError::Validation(_)
    ));
    assert_eq!(mock.calls(), 0);
}
