//! The recording pipeline and the seam toward the dashboard's ingest store.

use std::sync::{Arc, Mutex};

use tracing::{debug, trace};

use crate::config::RecorderConfig;
use crate::context::RequestContext;
use crate::error::RecorderError;
use crate::extract;
use crate::key::encode_key;
use crate::messages::ValidationFailure;
use crate::outcome::Outcome;
use crate::resolve::{self, CompiledRules};
use crate::sampler;

/// Entry type under which validation errors are counted.
pub const VALIDATION_ERROR: &str = "validation_error";

/// The dashboard's ingest surface. One call per occurrence; batching, rollup
/// and persistence belong to the store.
pub trait EntryStore: Send + Sync {
    fn count(&self, kind: &str, key: &str);
}

impl<S: EntryStore> EntryStore for Arc<S> {
    fn count(&self, kind: &str, key: &str) {
        (**self).count(kind, key);
    }
}

/// In-memory store, for tests and local inspection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<(String, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(kind, key)` entries in record order.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries.lock().expect("entry store lock poisoned").clone()
    }

    /// Keys recorded under `kind`, in record order.
    pub fn keys(&self, kind: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(entry_kind, _)| entry_kind == kind)
            .map(|(_, key)| key)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("entry store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EntryStore for MemoryStore {
    fn count(&self, kind: &str, key: &str) {
        self.entries
            .lock()
            .expect("entry store lock poisoned")
            .push((kind.to_string(), key.to_string()));
    }
}

/// Observes request outcomes and records validation-error entries.
pub struct Recorder<S> {
    config: RecorderConfig,
    rules: CompiledRules,
    store: S,
}

impl<S: EntryStore> Recorder<S> {
    /// Build a recorder, compiling the configured path rules up front.
    pub fn new(config: RecorderConfig, store: S) -> Result<Self, RecorderError> {
        let rules = config.compile()?;
        Ok(Self {
            config,
            rules,
            store,
        })
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Run the pipeline for one observed outcome.
    ///
    /// The sampling gate runs first, then the request-scoped dedup flag: a
    /// request whose pipeline already ran is never processed again, even
    /// when that earlier run produced zero entries, no matter how many
    /// signal sources fire for it.
    pub fn observe(&self, ctx: &RequestContext, outcome: &Outcome) {
        if !sampler::sample(self.config.sample_rate) {
            trace!(path = %ctx.raw_path, "sampled out");
            return;
        }
        if ctx.recorded.is_set() {
            trace!(path = %ctx.raw_path, "request already handled");
            return;
        }

        let (path, via) = resolve::resolve_path(ctx);
        if self.rules.should_ignore(&path) {
            debug!(%path, "path is on the ignore list");
            return;
        }

        // Mark the request handled before emission so a later signal cannot
        // re-run the pipeline even when nothing gets recorded here.
        ctx.recorded.set();

        let path = self.rules.group(path);
        for error in extract::extract(ctx, outcome, self.config.capture_messages) {
            let key = encode_key(&ctx.method, &path, via.as_deref(), &error);
            debug!(%key, "recording validation error");
            self.store.count(VALIDATION_ERROR, &key);
        }
    }

    /// Record a validation failure raised mid-request, from a component
    /// callback or an explicit dispatch by the host.
    ///
    /// Reentrant transports reuse one request object for several logical
    /// sub-requests, so the dedup flag is cleared before this failure is
    /// processed.
    pub fn observe_failure(&self, ctx: &RequestContext, failure: &ValidationFailure) {
        ctx.recorded.reset();
        self.observe(ctx, &Outcome::Failure(failure.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ErrorBags;
    use crate::outcome::ResponseView;
    use http::{Method, StatusCode};

    fn recorder(config: RecorderConfig) -> (Recorder<Arc<MemoryStore>>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (Recorder::new(config, store.clone()).unwrap(), store)
    }

    fn flash_outcome() -> Outcome {
        let mut bags = ErrorBags::new();
        bags.bag_mut("default").add("email", "The email field is required.");
        Outcome::Response(ResponseView::new(StatusCode::FOUND).with_flash(bags))
    }

    fn ctx() -> RequestContext {
        RequestContext::new(Method::POST, "/users").with_route("/users", None)
    }

    #[test]
    fn records_one_entry_per_field_error() {
        let (recorder, store) = recorder(RecorderConfig {
            capture_messages: false,
            ..RecorderConfig::default()
        });

        recorder.observe(&ctx(), &flash_outcome());

        assert_eq!(
            store.keys(VALIDATION_ERROR),
            vec![r#"["POST","/users","route","default","email"]"#.to_string()]
        );
    }

    #[test]
    fn a_second_signal_for_the_same_request_is_dropped() {
        let (recorder, store) = recorder(RecorderConfig::default());
        let ctx = ctx();

        recorder.observe(&ctx, &flash_outcome());
        recorder.observe(&ctx, &flash_outcome());

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn a_clean_outcome_still_marks_the_request_handled() {
        let (recorder, store) = recorder(RecorderConfig::default());
        let ctx = ctx();

        recorder.observe(&ctx, &Outcome::Response(ResponseView::new(StatusCode::OK)));
        assert!(ctx.recorded.is_set());

        // A later, noisier signal must not resurrect the request.
        recorder.observe(&ctx, &flash_outcome());
        assert!(store.is_empty());
    }

    #[test]
    fn a_failure_signal_preempts_the_completion_signal() {
        let (recorder, store) = recorder(RecorderConfig::default());
        let ctx = ctx();

        let failure = ValidationFailure::new("default").field("email", ["required"]);
        recorder.observe_failure(&ctx, &failure);
        recorder.observe(&ctx, &flash_outcome());

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.keys(VALIDATION_ERROR),
            vec![r#"["POST","/users","route","default","email","required"]"#.to_string()]
        );
    }

    #[test]
    fn the_failure_hook_resets_the_flag_for_sub_requests() {
        let (recorder, store) = recorder(RecorderConfig::default());
        let ctx = ctx();

        let failure = ValidationFailure::new("default").field("email", ["required"]);
        recorder.observe_failure(&ctx, &failure);
        // Second logical sub-request through the same request object.
        recorder.observe_failure(&ctx, &failure);

        assert_eq!(store.len(), 2);
    }

    #[test]
    fn ignored_paths_record_nothing_and_stay_unhandled() {
        let (recorder, store) = recorder(RecorderConfig {
            ignore: vec!["^/users$".to_string()],
            ..RecorderConfig::default()
        });
        let ctx = ctx();

        recorder.observe(&ctx, &flash_outcome());

        assert!(store.is_empty());
        assert!(!ctx.recorded.is_set());
    }

    #[test]
    fn grouping_rewrites_the_key_path() {
        let (recorder, store) = recorder(RecorderConfig {
            capture_messages: false,
            groups: vec![("^/users/.*$".to_string(), "/users/{user}".to_string())],
            ..RecorderConfig::default()
        });
        let ctx = RequestContext::new(Method::POST, "/users/42")
            .with_route("/users/:id", None);

        recorder.observe(&ctx, &flash_outcome());

        assert_eq!(
            store.keys(VALIDATION_ERROR),
            vec![r#"["POST","/users/{user}","route","default","email"]"#.to_string()]
        );
    }

    #[test]
    fn invalid_patterns_fail_construction() {
        let config = RecorderConfig {
            groups: vec![("(".to_string(), "/x".to_string())],
            ..RecorderConfig::default()
        };
        assert!(Recorder::new(config, MemoryStore::new()).is_err());
    }
}
