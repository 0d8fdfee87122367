use http::Method;

use super::error::{CorsConfigError, PolicyLocation};
use super::merge::CorsSettings;
use super::origin::{parse_origin, OriginSpec, ParsedOrigin};
use crate::config::RawList;

/// Methods allowed when `methods` is not configured, in emission order.
pub const DEFAULT_ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::HEAD,
    Method::PUT,
    Method::PATCH,
    Method::POST,
    Method::DELETE,
];

/// Fully parsed CORS policy for one route (or the global default).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub origin: OriginSpec,
    pub credentials: bool,
    pub allow_any_origin_with_credentials_unsafe: bool,
    /// Methods a preflight may ask for, in emission order
    pub methods: Vec<Method>,
    /// Request headers advertised on preflight responses
    pub headers: Vec<String>,
    /// Response headers exposed to scripts
    pub expose_headers: Vec<String>,
    /// Preflight cache duration in seconds
    pub max_age: Option<u32>,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            origin: OriginSpec::Any,
            credentials: false,
            allow_any_origin_with_credentials_unsafe: false,
            methods: DEFAULT_ALLOWED_METHODS.to_vec(),
            headers: vec!["content-type".to_string()],
            expose_headers: Vec::new(),
            max_age: None,
        }
    }
}

impl CorsPolicy {
    /// Any origin with credentials and no explicit opt-in.
    #[must_use]
    pub fn is_unsafe(&self) -> bool {
        self.origin.is_any() && self.credentials && !self.allow_any_origin_with_credentials_unsafe
    }

    /// The origin rule applied when answering requests.
    ///
    /// `Any` with credentials (opted in via
    /// `allow_any_origin_with_credentials_unsafe`) is answered as
    /// `AnyReflected` so `*` never travels with `Allow-Credentials: true`.
    #[must_use]
    pub fn response_origin(&self) -> &OriginSpec {
        static REFLECTED: OriginSpec = OriginSpec::AnyReflected;
        if self.origin.is_any() && self.credentials && self.allow_any_origin_with_credentials_unsafe {
            &REFLECTED
        } else {
            &self.origin
        }
    }

    /// Case-insensitive check of an `Access-Control-Request-Method` value.
    #[must_use]
    pub fn allows_method(&self, requested: &str) -> bool {
        let requested = requested.trim();
        self.methods
            .iter()
            .any(|m| m.as_str().eq_ignore_ascii_case(requested))
    }

    /// Parse merged raw settings.
    ///
    /// Returns [`EffectiveCors::Disabled`] when the origin is `false`.
    pub fn from_settings(
        settings: &CorsSettings,
        location: &PolicyLocation,
    ) -> Result<EffectiveCors, CorsConfigError> {
        let origin = match parse_origin(&settings.origin, location)? {
            ParsedOrigin::Disabled => return Ok(EffectiveCors::Disabled),
            ParsedOrigin::Spec(spec) => spec,
        };

        let methods = parse_list(&settings.methods, location, "methods")?
            .into_iter()
            .map(|token| parse_method(&token, location))
            .collect::<Result<Vec<_>, _>>()?;
        let mut unique_methods: Vec<Method> = Vec::with_capacity(methods.len());
        for method in methods {
            if !unique_methods.contains(&method) {
                unique_methods.push(method);
            }
        }

        Ok(EffectiveCors::Enabled(CorsPolicy {
            origin,
            credentials: settings.credentials,
            allow_any_origin_with_credentials_unsafe: settings
                .allow_any_origin_with_credentials_unsafe,
            methods: unique_methods,
            headers: dedup_header_names(parse_list(&settings.headers, location, "headers")?),
            expose_headers: dedup_header_names(parse_list(
                &settings.expose_headers,
                location,
                "exposeHeaders",
            )?),
            max_age: settings.max_age,
        }))
    }
}

/// Effective CORS behaviour of a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectiveCors {
    /// No CORS headers are ever emitted
    Disabled,
    Enabled(CorsPolicy),
}

impl EffectiveCors {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(self, EffectiveCors::Enabled(_))
    }

    #[must_use]
    pub fn policy(&self) -> Option<&CorsPolicy> {
        match self {
            EffectiveCors::Disabled => None,
            EffectiveCors::Enabled(policy) => Some(policy),
        }
    }
}

/// Split a comma list, trimming segments and dropping empty ones.
fn parse_list(
    raw: &RawList,
    location: &PolicyLocation,
    field: &'static str,
) -> Result<Vec<String>, CorsConfigError> {
    match raw {
        RawList::Csv(text) => Ok(text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()),
        RawList::Items(items) => Ok(items
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()),
        RawList::Invalid(value) => Err(CorsConfigError::shape(
            location,
            field,
            format!(
                "expected a comma-separated string or a list of strings, got {}",
                value
            ),
        )),
    }
}

fn parse_method(token: &str, location: &PolicyLocation) -> Result<Method, CorsConfigError> {
    Method::from_bytes(token.to_ascii_uppercase().as_bytes()).map_err(|_| {
        CorsConfigError::shape(location, "methods", format!("'{}' is not an HTTP method", token))
    })
}

fn dedup_header_names(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
            out.push(name);
        }
    }
    out
}
