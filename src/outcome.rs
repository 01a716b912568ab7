//! The observed outcome of a request: a completed response or a validation
//! failure raised while handling it.

use std::sync::Arc;

use http::StatusCode;
use serde_json::Value;

use crate::messages::{ErrorBags, ValidationFailure};

/// Pre-serialization payload of a structured JSON response.
///
/// Hosts attach this as a response extension when building JSON responses,
/// which lets observers inspect the object graph instead of re-parsing body
/// bytes. Responses without it are treated as opaque.
#[derive(Clone, Debug)]
pub struct JsonPayload(Arc<Value>);

impl JsonPayload {
    pub fn new(value: Value) -> Self {
        Self(Arc::new(value))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

/// Session-flashed error bags exposed on a redirect response by the host's
/// session layer.
#[derive(Clone, Debug)]
pub struct FlashErrors(Arc<ErrorBags>);

impl FlashErrors {
    pub fn new(bags: ErrorBags) -> Self {
        Self(Arc::new(bags))
    }

    pub fn bags(&self) -> &ErrorBags {
        &self.0
    }
}

/// A completed response as the extractor sees it.
#[derive(Clone, Debug)]
pub struct ResponseView {
    pub status: StatusCode,
    pub payload: Option<JsonPayload>,
    pub flash: Option<FlashErrors>,
}

impl ResponseView {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            payload: None,
            flash: None,
        }
    }

    pub fn with_payload(mut self, value: Value) -> Self {
        self.payload = Some(JsonPayload::new(value));
        self
    }

    pub fn with_flash(mut self, bags: ErrorBags) -> Self {
        self.flash = Some(FlashErrors::new(bags));
        self
    }
}

/// What the pipeline is asked to classify.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// A validation failure raised mid-request.
    Failure(ValidationFailure),
    /// A completed response.
    Response(ResponseView),
}
