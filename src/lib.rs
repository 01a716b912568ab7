//! # Validation Error Recorder
//!
//! Dashboard plugin that watches HTTP request/response cycles and
//! live-component failures in an axum application, extracts which form
//! fields failed validation, and counts occurrences under a canonical
//! low-cardinality key for display on a dashboard card.
//!
//! ## Features
//!
//! - Classifies five error-reporting conventions: in-process validation
//!   failures, session-flashed redirects, structured JSON API errors,
//!   Inertia error sharing, and a coarse fallback for unrecognized 422s
//! - Canonical route resolution with regex grouping and ignore rules
//! - Probabilistic sampling to bound volume on high-traffic endpoints
//! - Request-scoped dedup so overlapping signal sources count once
//! - Pluggable [`EntryStore`] seam toward the dashboard's ingest pipeline
//!
//! The pipeline runs synchronously in the request's task once the response
//! shape is final: sampling gate, dedup check, path resolution, ignore
//! filter, classification, then one counted entry per failed field.

mod config;
mod context;
mod error;
mod extract;
mod key;
mod messages;
mod middleware;
mod outcome;
mod recorder;
mod resolve;
mod sampler;

pub use config::RecorderConfig;
pub use context::{LiveOrigin, RecordedFlag, RequestContext, Route};
pub use error::RecorderError;
pub use extract::{extract, FieldError, DEFAULT_BAG, UNKNOWN_FIELD};
pub use key::{encode_key, DecodedKey};
pub use messages::{ErrorBags, ErrorKey, MessageBag, ValidationFailure};
pub use middleware::{
    json_response, observe_requests, request_context, response_view, with_flash_errors,
    INERTIA_HEADER,
};
pub use outcome::{FlashErrors, JsonPayload, Outcome, ResponseView};
pub use recorder::{EntryStore, MemoryStore, Recorder, VALIDATION_ERROR};
pub use resolve::{resolve_path, CompiledRules, LIVE_UPDATE_PATH, TOKEN_PLACEHOLDER};
pub use sampler::{sample, should_sample};
