//! Classification of request outcomes into field errors.
//!
//! Applications report failed validation in several shapes: a failure raised
//! mid-handler, bags flashed to the session before a redirect, a structured
//! JSON API body, Inertia's `props.errors` sharing, or nothing recognizable
//! at all. The shapes are tried in priority order, most specific first, and
//! the first applicable one wins; the chain is evaluated lazily so no shape
//! is inspected once an earlier one has matched.

use http::{Method, StatusCode};
use serde_json::Value;

use crate::context::RequestContext;
use crate::messages::{ErrorKey, ValidationFailure};
use crate::outcome::{Outcome, ResponseView};

/// Bag name used when a convention carries no bag of its own.
pub const DEFAULT_BAG: &str = "default";

/// Field marker recorded when an error response has no recognizable shape.
pub const UNKNOWN_FIELD: &str = "__unknown__";

/// One failed field, ready to be encoded into an entry key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub bag: String,
    pub field: String,
    pub message: Option<String>,
}

impl FieldError {
    fn new(bag: &str, field: &str, message: Option<&str>) -> Self {
        Self {
            bag: bag.to_string(),
            field: field.to_string(),
            message: message.map(str::to_string),
        }
    }
}

/// Classify `outcome` and return its field errors in emission order.
///
/// An empty result means no validation failure was observed. Error-class
/// responses with unrecognized shapes never come back empty; they produce
/// the single [`UNKNOWN_FIELD`] entry instead.
pub fn extract(ctx: &RequestContext, outcome: &Outcome, capture_messages: bool) -> Vec<FieldError> {
    match outcome {
        Outcome::Failure(failure) => from_failure(failure, capture_messages),
        Outcome::Response(view) => from_session(view, capture_messages)
            .or_else(|| from_json(view, capture_messages))
            .or_else(|| from_inertia(ctx, view, capture_messages))
            .or_else(|| from_unknown(view, capture_messages))
            .unwrap_or_default(),
    }
}

/// A failure raised by a validation call or a live-component callback.
///
/// Positional entries merged in by component runtimes are not field errors
/// and are dropped. One entry per field, keeping the field's first message
/// when capture is on; a field failing three rules still counts once.
fn from_failure(failure: &ValidationFailure, capture: bool) -> Vec<FieldError> {
    failure
        .errors
        .iter()
        .filter_map(|(key, messages)| match key {
            ErrorKey::Field(name) => {
                let message = capture.then(|| messages.first()).flatten();
                Some(FieldError::new(
                    &failure.bag,
                    name,
                    message.map(String::as_str),
                ))
            }
            ErrorKey::Position(_) => None,
        })
        .collect()
}

/// A redirect whose session flash carries structured error bags.
fn from_session(view: &ResponseView, capture: bool) -> Option<Vec<FieldError>> {
    if !matches!(view.status.as_u16(), 302 | 303) {
        return None;
    }
    let flash = view.flash.as_ref()?;

    let mut out = Vec::new();
    for (bag_name, bag) in flash.bags().iter() {
        for (field, messages) in bag.iter() {
            push_field(&mut out, bag_name, field, messages, capture);
        }
    }
    Some(out)
}

/// A 422 whose introspectable JSON payload has an `errors` map.
///
/// Only the host's structured JSON responses qualify; opaque byte bodies are
/// never re-parsed. A missing, list-shaped or empty `errors` value falls
/// through to the unknown shape.
fn from_json(view: &ResponseView, capture: bool) -> Option<Vec<FieldError>> {
    if view.status != StatusCode::UNPROCESSABLE_ENTITY {
        return None;
    }
    let payload = view.payload.as_ref()?;
    let errors = payload.value().as_object()?.get("errors")?.as_object()?;
    if errors.is_empty() {
        return None;
    }

    let mut out = Vec::new();
    for (field, value) in errors {
        push_messages(&mut out, DEFAULT_BAG, field, value, capture);
    }
    Some(out)
}

/// Inertia error sharing: unsafe requests carrying the protocol's marker
/// header receive their validation errors under `props.errors`, either flat
/// (`{field: message}`, implicit default bag) or keyed by bag
/// (`{bag: {field: message}}`).
fn from_inertia(
    ctx: &RequestContext,
    view: &ResponseView,
    capture: bool,
) -> Option<Vec<FieldError>> {
    if !ctx.inertia || !is_unsafe(&ctx.method) {
        return None;
    }
    let payload = view.payload.as_ref()?;
    let errors = payload.value().get("props")?.get("errors")?.as_object()?;

    // The first value tells the two shapes apart: a string means a flat map
    // on the default bag, an object means one map per bag.
    let first = errors.values().next()?;

    let mut out = Vec::new();
    if first.is_string() {
        for (field, message) in errors {
            out.push(FieldError::new(
                DEFAULT_BAG,
                field,
                capture.then(|| message.as_str()).flatten(),
            ));
        }
    } else {
        for (bag, fields) in errors {
            let Some(fields) = fields.as_object() else {
                continue;
            };
            for (field, message) in fields {
                out.push(FieldError::new(
                    bag,
                    field,
                    capture.then(|| message.as_str()).flatten(),
                ));
            }
        }
    }
    Some(out)
}

/// Any other 422: something failed validation but the shape is foreign.
/// Record one coarse entry rather than staying silent.
fn from_unknown(view: &ResponseView, capture: bool) -> Option<Vec<FieldError>> {
    if view.status != StatusCode::UNPROCESSABLE_ENTITY {
        return None;
    }
    Some(vec![FieldError::new(
        DEFAULT_BAG,
        UNKNOWN_FIELD,
        capture.then_some(UNKNOWN_FIELD),
    )])
}

// Capture on: one entry per message. Capture off: one entry per field no
// matter how many rules failed on it.
fn push_field(out: &mut Vec<FieldError>, bag: &str, field: &str, messages: &[String], capture: bool) {
    if capture {
        for message in messages {
            out.push(FieldError::new(bag, field, Some(message.as_str())));
        }
    } else {
        out.push(FieldError::new(bag, field, None));
    }
}

// `value` is one message or a list of messages.
fn push_messages(out: &mut Vec<FieldError>, bag: &str, field: &str, value: &Value, capture: bool) {
    match value {
        Value::String(message) => push_field(out, bag, field, std::slice::from_ref(message), capture),
        Value::Array(values) => {
            let messages: Vec<String> = values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            push_field(out, bag, field, &messages, capture);
        }
        _ => {}
    }
}

fn is_unsafe(method: &Method) -> bool {
    matches!(method.as_str(), "POST" | "PUT" | "PATCH" | "DELETE")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ErrorBags;
    use http::Method;
    use serde_json::json;

    fn ctx(method: Method) -> RequestContext {
        RequestContext::new(method, "/users").with_route("/users", None)
    }

    fn flash_view(status: u16, bags: ErrorBags) -> ResponseView {
        ResponseView::new(StatusCode::from_u16(status).unwrap()).with_flash(bags)
    }

    fn one_bag(bag: &str, field: &str, messages: &[&str]) -> ErrorBags {
        let mut bags = ErrorBags::new();
        bags.bag_mut(bag).insert(field, messages.iter().copied());
        bags
    }

    #[test]
    fn failure_emits_one_entry_per_field() {
        let failure = ValidationFailure::new("default")
            .field("email", ["required", "must be an email"])
            .field("name", ["required"]);

        let entries = from_failure(&failure, false);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], FieldError::new("default", "email", None));
        assert_eq!(entries[1], FieldError::new("default", "name", None));
    }

    #[test]
    fn failure_capture_keeps_only_the_first_message() {
        let failure =
            ValidationFailure::new("settings").field("email", ["required", "must be an email"]);

        let entries = from_failure(&failure, true);
        assert_eq!(
            entries,
            vec![FieldError::new("settings", "email", Some("required"))]
        );
    }

    #[test]
    fn failure_drops_positional_entries() {
        let failure = ValidationFailure::new("default")
            .position(0, ["not a field"])
            .field("email", ["required"])
            .position(1, ["also not a field"]);

        let entries = from_failure(&failure, true);
        assert_eq!(
            entries,
            vec![FieldError::new("default", "email", Some("required"))]
        );
    }

    #[test]
    fn session_emits_per_field_without_capture() {
        let view = flash_view(302, one_bag("default", "email", &["required", "too short"]));
        let entries = extract(&ctx(Method::POST), &Outcome::Response(view), false);
        assert_eq!(entries, vec![FieldError::new("default", "email", None)]);
    }

    #[test]
    fn session_emits_per_message_with_capture() {
        let view = flash_view(303, one_bag("default", "email", &["required", "too short"]));
        let entries = extract(&ctx(Method::POST), &Outcome::Response(view), true);
        assert_eq!(
            entries,
            vec![
                FieldError::new("default", "email", Some("required")),
                FieldError::new("default", "email", Some("too short")),
            ]
        );
    }

    #[test]
    fn session_walks_every_bag() {
        let mut bags = ErrorBags::new();
        bags.bag_mut("default").add("email", "required");
        bags.bag_mut("custom_1").add("email", "required");
        bags.bag_mut("custom_2").add("email", "required");

        let entries = extract(&ctx(Method::POST), &Outcome::Response(flash_view(302, bags)), false);
        let bags: Vec<&str> = entries.iter().map(|e| e.bag.as_str()).collect();
        assert_eq!(bags, vec!["default", "custom_1", "custom_2"]);
    }

    #[test]
    fn redirect_without_flash_is_clean() {
        let view = ResponseView::new(StatusCode::FOUND);
        assert!(extract(&ctx(Method::POST), &Outcome::Response(view), true).is_empty());
    }

    #[test]
    fn json_errors_map_to_the_default_bag() {
        let view = ResponseView::new(StatusCode::UNPROCESSABLE_ENTITY)
            .with_payload(json!({"message": "invalid", "errors": {"email": ["required"]}}));
        let entries = extract(&ctx(Method::POST), &Outcome::Response(view), false);
        assert_eq!(entries, vec![FieldError::new("default", "email", None)]);
    }

    #[test]
    fn json_errors_capture_each_message() {
        let view = ResponseView::new(StatusCode::UNPROCESSABLE_ENTITY)
            .with_payload(json!({"errors": {"email": ["required", "too short"]}}));
        let entries = extract(&ctx(Method::POST), &Outcome::Response(view), true);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].message.as_deref(), Some("too short"));
    }

    #[test]
    fn json_accepts_a_bare_message_string() {
        let view = ResponseView::new(StatusCode::UNPROCESSABLE_ENTITY)
            .with_payload(json!({"errors": {"email": "required"}}));
        let entries = extract(&ctx(Method::POST), &Outcome::Response(view), true);
        assert_eq!(
            entries,
            vec![FieldError::new("default", "email", Some("required"))]
        );
    }

    #[test]
    fn list_shaped_errors_fall_through_to_unknown() {
        let view = ResponseView::new(StatusCode::UNPROCESSABLE_ENTITY)
            .with_payload(json!({"errors": ["something went wrong"]}));
        let entries = extract(&ctx(Method::POST), &Outcome::Response(view), false);
        assert_eq!(entries, vec![FieldError::new("default", UNKNOWN_FIELD, None)]);
    }

    #[test]
    fn empty_errors_object_falls_through_to_unknown() {
        let view = ResponseView::new(StatusCode::UNPROCESSABLE_ENTITY)
            .with_payload(json!({"errors": {}}));
        let entries = extract(&ctx(Method::POST), &Outcome::Response(view), false);
        assert_eq!(entries, vec![FieldError::new("default", UNKNOWN_FIELD, None)]);
    }

    #[test]
    fn payload_without_an_errors_key_falls_through_to_unknown() {
        let view = ResponseView::new(StatusCode::UNPROCESSABLE_ENTITY)
            .with_payload(json!({"message": "An error occurred."}));
        let entries = extract(&ctx(Method::POST), &Outcome::Response(view), false);
        assert_eq!(entries, vec![FieldError::new("default", UNKNOWN_FIELD, None)]);
    }

    #[test]
    fn scalar_payload_falls_through_to_unknown() {
        let view = ResponseView::new(StatusCode::UNPROCESSABLE_ENTITY)
            .with_payload(json!("an error occurred"));
        let entries = extract(&ctx(Method::POST), &Outcome::Response(view), false);
        assert_eq!(entries, vec![FieldError::new("default", UNKNOWN_FIELD, None)]);
    }

    #[test]
    fn opaque_422_produces_the_unknown_marker() {
        let view = ResponseView::new(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            extract(&ctx(Method::POST), &Outcome::Response(view.clone()), false),
            vec![FieldError::new("default", UNKNOWN_FIELD, None)]
        );
        assert_eq!(
            extract(&ctx(Method::POST), &Outcome::Response(view), true),
            vec![FieldError::new(
                "default",
                UNKNOWN_FIELD,
                Some(UNKNOWN_FIELD)
            )]
        );
    }

    #[test]
    fn inertia_flat_shape_uses_the_default_bag() {
        let view = ResponseView::new(StatusCode::OK)
            .with_payload(json!({"props": {"errors": {"email": "required"}}}));
        let ctx = ctx(Method::POST).with_inertia(true);
        let entries = extract(&ctx, &Outcome::Response(view), true);
        assert_eq!(
            entries,
            vec![FieldError::new("default", "email", Some("required"))]
        );
    }

    #[test]
    fn inertia_nested_shape_names_each_bag() {
        let view = ResponseView::new(StatusCode::OK).with_payload(json!({
            "props": {"errors": {"custom": {"email": "required"}, "default": {"name": "required"}}}
        }));
        let ctx = ctx(Method::PUT).with_inertia(true);
        let entries = extract(&ctx, &Outcome::Response(view), false);
        assert_eq!(
            entries,
            vec![
                FieldError::new("custom", "email", None),
                FieldError::new("default", "name", None),
            ]
        );
    }

    #[test]
    fn inertia_requires_the_marker_header() {
        let view = ResponseView::new(StatusCode::OK)
            .with_payload(json!({"props": {"errors": {"email": "required"}}}));
        assert!(extract(&ctx(Method::POST), &Outcome::Response(view), true).is_empty());
    }

    #[test]
    fn inertia_ignores_safe_methods() {
        let view = ResponseView::new(StatusCode::OK)
            .with_payload(json!({"props": {"errors": {"email": "required"}}}));
        let ctx = ctx(Method::GET).with_inertia(true);
        assert!(extract(&ctx, &Outcome::Response(view), true).is_empty());
    }

    #[test]
    fn clean_responses_emit_nothing() {
        for status in [200, 201, 301, 404, 500] {
            let view = ResponseView::new(StatusCode::from_u16(status).unwrap());
            assert!(
                extract(&ctx(Method::POST), &Outcome::Response(view), true).is_empty(),
                "status {status} should not record"
            );
        }
    }
}
