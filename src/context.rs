//! Per-request state handed through the recording pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use http::Method;

/// Request-scoped marker set once the pipeline has handled a request.
///
/// A single logical request can produce several signals (a failure raised
/// mid-handler plus the completed response); the first one to run the
/// pipeline sets the flag and later signals are dropped. Reentrant
/// transports that pipeline several logical sub-requests through one request
/// object must [`reset`](RecordedFlag::reset) before each sub-request.
#[derive(Clone, Debug, Default)]
pub struct RecordedFlag(Arc<AtomicBool>);

impl RecordedFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Clear the flag before dispatching a new logical sub-request.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// The route the host's router matched for the request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    /// Declared path template, e.g. `/users/:name`, not the concrete URL.
    pub template: String,
    /// Handler descriptor, when the host knows one.
    pub action: Option<String>,
}

/// Originating page of a live-component sub-request.
///
/// Component updates travel through the runtime's own endpoint; the page the
/// component lives on is what the dashboard should key by. Inserted as a
/// request extension by the runtime's dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveOrigin {
    /// Path of the page the component was rendered on.
    pub path: String,
    /// The opaque per-session token embedded in `path`, when the runtime
    /// knows it.
    pub token: Option<String>,
}

/// Everything the pipeline needs to know about one in-flight request.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub method: Method,
    pub raw_path: String,
    pub route: Option<Route>,
    pub live_origin: Option<LiveOrigin>,
    /// The request carried the Inertia protocol marker header.
    pub inertia: bool,
    pub recorded: RecordedFlag,
}

impl RequestContext {
    pub fn new(method: Method, raw_path: impl Into<String>) -> Self {
        Self {
            method,
            raw_path: raw_path.into(),
            route: None,
            live_origin: None,
            inertia: false,
            recorded: RecordedFlag::new(),
        }
    }

    pub fn with_route(mut self, template: impl Into<String>, action: Option<&str>) -> Self {
        self.route = Some(Route {
            template: template.into(),
            action: action.map(str::to_string),
        });
        self
    }

    pub fn with_live_origin(mut self, path: impl Into<String>, token: Option<&str>) -> Self {
        self.live_origin = Some(LiveOrigin {
            path: path.into(),
            token: token.map(str::to_string),
        });
        self
    }

    pub fn with_inertia(mut self, inertia: bool) -> Self {
        self.inertia = inertia;
        self
    }
}
