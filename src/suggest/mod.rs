//! Description suggestions from a hosted text-generation model.
//!
//! ```text
//! model, brand, price
//!        │ validate (model and brand required)
//!        ▼
//!   Prompt::describe ──► GenerateContentRequest (JSON)
//!        │
//!        ▼
//!   BackoffExecutor::execute ──► POST {api_base}/models/{model}:generateContent?key=..
//!        │
//!        ▼
//!   candidates[0].content.parts[0].text, trimmed
//! ```
//!
//! Every failure after validation surfaces as
//! [`SuggestError::GenerationFailed`], whatever its cause.

mod error;
mod prompt;
mod wire;

use std::fmt;

use tracing::{debug, error};

use crate::backoff::{
    BackoffExecutor, HttpRequest, ReqwestTransport, RetryPolicy, Transport, TransportError,
};
use crate::config::GenerationConfig;
use crate::entry::required;

pub use error::{GenerationFailure, SuggestError};
pub use prompt::{Prompt, PRICE_PLACEHOLDER, SYSTEM_INSTRUCTION};
pub use wire::{Candidate, Content, GenerateContentRequest, GenerateContentResponse, Part};

/// Generated description text, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedText(String);

impl SuggestedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SuggestedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client for the generation endpoint.
#[derive(Debug, Clone)]
pub struct SuggestionClient<T> {
    executor: BackoffExecutor<T>,
    endpoint: String,
    policy: RetryPolicy,
}

impl SuggestionClient<ReqwestTransport> {
    /// Client over a real HTTP connection.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config.request_timeout())?;
        Ok(Self::new(transport, config))
    }
}

impl<T: Transport> SuggestionClient<T> {
    pub fn new(transport: T, config: &GenerationConfig) -> Self {
        Self {
            executor: BackoffExecutor::new(transport),
            endpoint: config.endpoint(),
            policy: config.retry_policy(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn transport(&self) -> &T {
        self.executor.transport()
    }

    /// Ask for a short marketing description of a bicycle.
    ///
    /// `model` and `brand` must be non-blank; `price` may be absent or
    /// blank. Validation failures never reach the network.
    pub async fn generate(
        &self,
        model: &str,
        brand: &str,
        price: Option<&str>,
    ) -> Result<SuggestedText, SuggestError> {
        let model = required(model, "model")?;
        let brand = required(brand, "brand")?;

        let prompt = Prompt::describe(&model, &brand, price);
        self.request(&prompt).await.map_err(|failure| {
            error!(%failure, %model, %brand, "description generation failed");
            SuggestError::GenerationFailed(failure)
        })
    }

    async fn request(&self, prompt: &Prompt) -> Result<SuggestedText, GenerationFailure> {
        let body = serde_json::to_vec(&GenerateContentRequest::from(prompt))
            .map_err(|e| GenerationFailure::InvalidRequest(e.to_string()))?;
        let request = HttpRequest::post_json(self.endpoint.clone(), body);

        let response = self.executor.execute(&request, self.policy).await?;
        if !response.is_success() {
            return Err(GenerationFailure::Status {
                status: response.status,
                body: response.body_text(),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_slice(&response.body)
            .map_err(|e| GenerationFailure::Malformed(e.to_string()))?;
        let text = parsed
            .first_text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(GenerationFailure::EmptyResponse)?;

        debug!(chars = text.len(), "description generated");
        Ok(SuggestedText(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::{HttpResponse, RetryReason};
    use crate::entry::ValidationError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        replies: Mutex<VecDeque<HttpResponse>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Recorder {
        fn replying(replies: Vec<HttpResponse>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn last_body(&self) -> Value {
            let seen = self.seen.lock().unwrap();
            serde_json::from_slice(&seen.last().unwrap().body).unwrap()
        }
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            let mut replies = self.replies.lock().unwrap();
            Ok(if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                replies.front().cloned().unwrap()
            })
        }
    }

    fn config() -> GenerationConfig {
        GenerationConfig {
            api_base: "http://generator.test/v1beta".into(),
            model: "text-model".into(),
            api_key: "secret".into(),
            max_retries: 2,
            initial_delay_ms: 10,
            request_timeout_secs: 5,
        }
    }

    fn text_reply(text: &str) -> HttpResponse {
        HttpResponse::new(
            200,
            json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string(),
        )
    }

    #[tokio::test]
    async fn returns_trimmed_text() {
        let client = SuggestionClient::new(
            Recorder::replying(vec![text_reply("  Fast and light.  \n")]),
            &config(),
        );

        let text = client.generate("Aero", "Zeta", Some("999.5")).await.unwrap();
        assert_eq!(text.as_str(), "Fast and light.");
        assert_eq!(
            client.endpoint(),
            "http://generator.test/v1beta/models/text-model:generateContent?key=secret"
        );

        let body = client.transport().last_body();
        let user = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(user.contains("'Aero'") && user.contains("'Zeta'") && user.contains("R$999.5"));
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            json!(SYSTEM_INSTRUCTION)
        );
    }

    #[tokio::test]
    async fn blank_model_or_brand_never_calls_out() {
        let client = SuggestionClient::new(Recorder::replying(vec![text_reply("x")]), &config());

        let err = client.generate("  ", "Zeta", None).await.unwrap_err();
        assert_eq!(err, SuggestError::Validation(ValidationError::MissingField("model")));
        let err = client.generate("Aero", "", None).await.unwrap_err();
        assert_eq!(err, SuggestError::Validation(ValidationError::MissingField("brand")));
        assert_eq!(client.transport().calls(), 0);
    }

    #[tokio::test]
    async fn empty_candidates_fail() {
        for body in [json!({}), json!({ "candidates": [] }), json!({
            "candidates": [{ "content": { "parts": [{ "text": "   " }] } }]
        })] {
            let client = SuggestionClient::new(
                Recorder::replying(vec![HttpResponse::new(200, body.to_string())]),
                &config(),
            );
            let err = client.generate("Aero", "Zeta", None).await.unwrap_err();
            assert_eq!(
                err,
                SuggestError::GenerationFailed(GenerationFailure::EmptyResponse)
            );
        }
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let client = SuggestionClient::new(
            Recorder::replying(vec![HttpResponse::new(200, "<html>")]),
            &config(),
        );
        let err = client.generate("Aero", "Zeta", None).await.unwrap_err();
        assert!(matches!(
            err,
            SuggestError::GenerationFailed(GenerationFailure::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn client_error_status_is_not_retried() {
        let client = SuggestionClient::new(
            Recorder::replying(vec![HttpResponse::new(403, "no key")]),
            &config(),
        );
        let err = client.generate("Aero", "Zeta", None).await.unwrap_err();
        assert_eq!(
            err,
            SuggestError::GenerationFailed(GenerationFailure::Status {
                status: 403,
                body: "no key".into()
            })
        );
        assert_eq!(client.transport().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_server_errors_exhaust_the_budget() {
        let client = SuggestionClient::new(
            Recorder::replying(vec![HttpResponse::new(500, "down")]),
            &config(),
        );
        let err = client.generate("Aero", "Zeta", None).await.unwrap_err();
        assert_eq!(
            err,
            SuggestError::GenerationFailed(GenerationFailure::RetryExhausted {
                attempts: 3,
                last: RetryReason::Status {
                    status: 500,
                    body: "down".into()
                }
            })
        );
        assert_eq!(client.transport().calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let client = SuggestionClient::new(
            Recorder::replying(vec![
                HttpResponse::new(429, ""),
                HttpResponse::new(503, ""),
                text_reply("Ready to ride."),
            ]),
            &config(),
        );
        let text = client.generate("Aero", "Zeta", None).await.unwrap();
        assert_eq!(text.to_string(), "Ready to ride.");
        assert_eq!(client.transport().calls(), 3);
    }
}
