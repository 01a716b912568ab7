//! Host integration: the axum middleware adapter, context construction and
//! response helpers.

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde_json::Value;

use crate::context::{LiveOrigin, RecordedFlag, RequestContext, Route};
use crate::messages::ErrorBags;
use crate::outcome::{FlashErrors, JsonPayload, Outcome, ResponseView};
use crate::recorder::{EntryStore, Recorder};

/// Marker header identifying Inertia-protocol requests.
pub const INERTIA_HEADER: &str = "x-inertia";

/// Middleware observing completed responses.
///
/// Layer it with `axum::middleware::from_fn_with_state`:
///
/// ```ignore
/// let app = Router::new()
///     .route("/users", post(create_user))
///     .layer(middleware::from_fn_with_state(recorder.clone(), observe_requests));
/// ```
///
/// The request context is inserted as a request extension so in-handler
/// hooks ([`Recorder::observe_failure`]) share the same dedup flag, and the
/// response itself is observed only once it is final.
pub async fn observe_requests<S>(
    State(recorder): State<Arc<Recorder<S>>>,
    mut req: Request,
    next: Next,
) -> Response
where
    S: EntryStore + 'static,
{
    if !recorder.config().enabled {
        return next.run(req).await;
    }

    let ctx = request_context(&req);
    req.extensions_mut().insert(ctx.clone());

    let res = next.run(req).await;

    recorder.observe(&ctx, &Outcome::Response(response_view(&res)));

    res
}

/// Build a [`RequestContext`] from an incoming request's parts.
///
/// The matched route template comes from axum's [`MatchedPath`] extension;
/// live-component sub-requests are recognized by the [`LiveOrigin`]
/// extension their dispatcher inserts.
pub fn request_context(req: &Request) -> RequestContext {
    let route = req.extensions().get::<MatchedPath>().map(|matched| Route {
        template: matched.as_str().to_string(),
        action: None,
    });

    RequestContext {
        method: req.method().clone(),
        raw_path: req.uri().path().to_string(),
        route,
        live_origin: req.extensions().get::<LiveOrigin>().cloned(),
        inertia: req.headers().contains_key(INERTIA_HEADER),
        recorded: RecordedFlag::new(),
    }
}

/// Project a completed response into the extractor's view of it.
pub fn response_view(res: &Response) -> ResponseView {
    ResponseView {
        status: res.status(),
        payload: res.extensions().get::<JsonPayload>().cloned(),
        flash: res.extensions().get::<FlashErrors>().cloned(),
    }
}

/// Build a structured JSON response that keeps its pre-serialization value
/// attached as an extension, so observers can inspect the object graph
/// instead of re-parsing body bytes.
pub fn json_response(status: StatusCode, value: Value) -> Response {
    let payload = JsonPayload::new(value);
    let mut res = (status, Json(payload.value().clone())).into_response();
    res.extensions_mut().insert(payload);
    res
}

/// Attach session-flashed error bags to a response, the way a session layer
/// exposes them to observers after a failed validation redirect.
pub fn with_flash_errors(mut res: Response, bags: ErrorBags) -> Response {
    res.extensions_mut().insert(FlashErrors::new(bags));
    res
}
