use tracing::debug;

use super::error::{CorsConfigError, PolicyLocation};
use crate::config::RawOrigin;

/// Canonical origin rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginSpec {
    /// Every origin is allowed; responses carry a literal `*`
    Any,
    /// Every origin is allowed; responses echo the request's `Origin`
    AnyReflected,
    /// Exact, case-sensitive match against one of these origins
    List(Vec<String>),
}

impl OriginSpec {
    /// Check if an origin is allowed
    #[must_use]
    pub fn matches(&self, origin: &str) -> bool {
        match self {
            OriginSpec::Any | OriginSpec::AnyReflected => true,
            OriginSpec::List(origins) => origins.iter().any(|o| o == origin),
        }
    }

    /// Check if wildcard is enabled (for credentials validation)
    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, OriginSpec::Any)
    }
}

/// Result of parsing a raw origin value.
///
/// `Disabled` is not an origin rule: a policy whose origin is `false` emits
/// no CORS headers at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedOrigin {
    Disabled,
    Spec(OriginSpec),
}

/// Normalise a raw origin value.
///
/// - `true` or `"*"` → [`OriginSpec::Any`]
/// - `"https://a.com"` → `List(["https://a.com"])`
/// - `"https://a.com, https://b.com"` → `List` of the trimmed segments
/// - `["https://a.com", ..]` → `List` of the entries as given
/// - `false` → [`ParsedOrigin::Disabled`]
///
/// Safety (wildcard + credentials) is not checked here; see
/// [`super::validate_policy`].
pub fn parse_origin(
    raw: &RawOrigin,
    location: &PolicyLocation,
) -> Result<ParsedOrigin, CorsConfigError> {
    let spec = match raw {
        RawOrigin::Flag(true) => OriginSpec::Any,
        RawOrigin::Flag(false) => return Ok(ParsedOrigin::Disabled),
        RawOrigin::Text(text) => {
            let text = text.trim();
            if text == "*" {
                OriginSpec::Any
            } else if text.is_empty() {
                return Err(CorsConfigError::shape(
                    location,
                    "origin",
                    "empty string; use false to disable CORS",
                ));
            } else if text.contains(',') {
                let mut origins = Vec::new();
                for segment in text.split(',').map(str::trim) {
                    if segment.is_empty() {
                        return Err(CorsConfigError::shape(
                            location,
                            "origin",
                            format!("empty entry in comma-separated list '{}'", text),
                        ));
                    }
                    push_unique(&mut origins, segment.to_string());
                }
                OriginSpec::List(origins)
            } else {
                OriginSpec::List(vec![text.to_string()])
            }
        }
        RawOrigin::List(entries) => {
            if entries.is_empty() {
                return Err(CorsConfigError::shape(
                    location,
                    "origin",
                    "empty list; use false to disable CORS",
                ));
            }
            let mut origins = Vec::with_capacity(entries.len());
            for entry in entries {
                if entry.is_empty() {
                    return Err(CorsConfigError::shape(location, "origin", "empty entry in list"));
                }
                push_unique(&mut origins, entry.clone());
            }
            OriginSpec::List(origins)
        }
        RawOrigin::Invalid(value) => {
            return Err(CorsConfigError::shape(
                location,
                "origin",
                format!(
                    "expected a boolean, a string or a list of strings, got {}",
                    value
                ),
            ));
        }
    };

    if let OriginSpec::List(origins) = &spec {
        for origin in origins {
            if !is_serialized_origin(origin) {
                debug!(
                    location = %location,
                    origin = %origin,
                    "CORS origin entry is not a serialized origin; it only matches byte-for-byte"
                );
            }
        }
    }

    Ok(ParsedOrigin::Spec(spec))
}

fn push_unique(origins: &mut Vec<String>, origin: String) {
    if !origins.contains(&origin) {
        origins.push(origin);
    }
}

/// `scheme://host[:port]` with nothing after it, as browsers send it.
fn is_serialized_origin(origin: &str) -> bool {
    match url::Url::parse(origin) {
        Ok(url) => url.origin().ascii_serialization() == origin,
        Err(_) => false,
    }
}
