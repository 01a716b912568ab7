//! Canonical path resolution, grouping rewrites and the ignore list.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::RecorderConfig;
use crate::context::{LiveOrigin, RequestContext};
use crate::error::RecorderError;

/// Route template of the live-component update endpoint.
pub const LIVE_UPDATE_PATH: &str = "/_live/update";

/// Placeholder substituted for opaque per-session tokens.
pub const TOKEN_PLACEHOLDER: &str = "{token}";

// Path segments this long without punctuation are session tokens, not
// meaningful route segments.
static OPAQUE_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[A-Za-z0-9]{20,}$").expect("known-good pattern"));

/// Resolve the canonical path and `via` descriptor for a request.
///
/// Routed requests use the matched template, with the host's handler
/// descriptor (or a plain `route` marker) as `via`. Live-component
/// sub-requests travel through the runtime's update endpoint, so they are
/// keyed by the page the component lives on (token normalized) and annotated
/// with the endpoint they came through. Anything else falls back to the raw
/// path with no descriptor.
pub fn resolve_path(ctx: &RequestContext) -> (String, Option<String>) {
    if let Some(route) = &ctx.route {
        if route.template == LIVE_UPDATE_PATH {
            if let Some(origin) = &ctx.live_origin {
                return resolve_origin(origin);
            }
        }
        let via = route.action.clone().unwrap_or_else(|| "route".to_string());
        return (route.template.clone(), Some(via));
    }

    // Sub-requests can reach us unrouted when the runtime dispatches
    // internally; the origin still resolves them.
    if let Some(origin) = &ctx.live_origin {
        return resolve_origin(origin);
    }

    (ctx.raw_path.clone(), None)
}

fn resolve_origin(origin: &LiveOrigin) -> (String, Option<String>) {
    (
        normalize_origin_path(origin),
        Some(format!("via {LIVE_UPDATE_PATH}")),
    )
}

fn normalize_origin_path(origin: &LiveOrigin) -> String {
    if let Some(token) = origin.token.as_deref().filter(|t| !t.is_empty()) {
        return origin.path.replace(token, TOKEN_PLACEHOLDER);
    }
    origin
        .path
        .split('/')
        .map(|segment| {
            if OPAQUE_SEGMENT.is_match(segment) {
                TOKEN_PLACEHOLDER
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Ignore and grouping patterns compiled once at recorder construction.
#[derive(Debug, Default)]
pub struct CompiledRules {
    ignore: Vec<Regex>,
    groups: Vec<(Regex, String)>,
}

impl CompiledRules {
    pub fn compile(config: &RecorderConfig) -> Result<Self, RecorderError> {
        let ignore = config
            .ignore
            .iter()
            .map(|pattern| compile_pattern(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        let groups = config
            .groups
            .iter()
            .map(|(pattern, replacement)| Ok((compile_pattern(pattern)?, replacement.clone())))
            .collect::<Result<Vec<_>, RecorderError>>()?;

        Ok(Self { ignore, groups })
    }

    /// True when any ignore pattern matches the resolved path.
    pub fn should_ignore(&self, path: &str) -> bool {
        self.ignore.iter().any(|pattern| pattern.is_match(path))
    }

    /// Apply the first matching grouping rule. The replacement may reference
    /// capture groups.
    pub fn group(&self, path: String) -> String {
        for (pattern, replacement) in &self.groups {
            if pattern.is_match(&path) {
                return pattern.replace(&path, replacement.as_str()).into_owned();
            }
        }
        path
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, RecorderError> {
    Regex::new(pattern).map_err(|source| RecorderError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}
