use std::error::Error;
use std::fmt;

use crate::backoff::{BackoffError, RetryReason};
use crate::entry::ValidationError;

/// What went wrong on the way to a generated description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    /// Every attempt hit a network error, 429 or 5xx.
    RetryExhausted { attempts: u32, last: RetryReason },
    /// The request could not be built or sent.
    InvalidRequest(String),
    /// A non-retriable, non-2xx response.
    Status { status: u16, body: String },
    /// The response body was not the expected JSON envelope.
    Malformed(String),
    /// The envelope held no generated text.
    EmptyResponse,
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationFailure::RetryExhausted { attempts, last } => write!(
                f,
                "gave up after {} attempts (last: {})",
                attempts, last
            ),
            GenerationFailure::InvalidRequest(msg) => write!(f, "invalid request: {}", msg),
            GenerationFailure::Status { status, body } => {
                write!(f, "endpoint answered {}: {}", status, body)
            }
            GenerationFailure::Malformed(msg) => write!(f, "malformed response: {}", msg),
            GenerationFailure::EmptyResponse => write!(f, "response contained no text"),
        }
    }
}

impl Error for GenerationFailure {}

impl From<BackoffError> for GenerationFailure {
    fn from(err: BackoffError) -> Self {
        match err {
            BackoffError::RetryExhausted { attempts, last } => {
                GenerationFailure::RetryExhausted { attempts, last }
            }
            BackoffError::InvalidRequest(msg) => GenerationFailure::InvalidRequest(msg),
        }
    }
}

/// Error type for description generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestError {
    /// Model or brand missing; the endpoint was not called.
    Validation(ValidationError),
    /// The call was made and produced no usable text.
    GenerationFailed(GenerationFailure),
}

impl fmt::Display for SuggestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestError::Validation(e) => write!(f, "cannot generate description: {}", e),
            SuggestError::GenerationFailed(e) => write!(f, "description generation failed: {}", e),
        }
    }
}

impl Error for SuggestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SuggestError::Validation(e) => Some(e),
            SuggestError::GenerationFailed(e) => Some(e),
        }
    }
}

impl From<ValidationError> for SuggestError {
    fn from(err: ValidationError) -> Self {
        SuggestError::Validation(err)
    }
}

impl From<GenerationFailure> for SuggestError {
    fn from(err: GenerationFailure) -> Self {
        SuggestError::GenerationFailed(err)
    }
}
