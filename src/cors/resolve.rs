use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE, VARY,
};
use http::{HeaderName, Method};
use serde::ser::{Serialize, SerializeMap, Serializer};
use smallvec::SmallVec;
use tracing::debug;

use super::origin::OriginSpec;
use super::policy::EffectiveCors;

/// CORS response headers in emission order.
///
/// Stack-allocated for the common case: a full preflight answer has at most
/// seven entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsHeaders(SmallVec<[(HeaderName, String); 8]>);

impl CorsHeaders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: HeaderName, value: impl Into<String>) {
        self.0.push((name, value.into()));
    }

    /// Value of a header, if emitted.
    #[must_use]
    pub fn get(&self, name: &HeaderName) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &str)> {
        self.0.iter().map(|(n, v)| (n, v.as_str()))
    }

    /// True when this header set answers a preflight.
    #[must_use]
    pub fn is_preflight(&self) -> bool {
        self.get(&ACCESS_CONTROL_ALLOW_METHODS).is_some()
    }
}

impl<'a> IntoIterator for &'a CorsHeaders {
    type Item = &'a (HeaderName, String);
    type IntoIter = std::slice::Iter<'a, (HeaderName, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for CorsHeaders {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name.as_str(), value)?;
        }
        map.end()
    }
}

/// Compute the CORS headers for a request.
///
/// `origin` is the request's `Origin` header and `requested_method` its
/// `Access-Control-Request-Method` header. An empty result is not an error:
/// it means the request gets no CORS treatment.
///
/// `OPTIONS` requests only receive headers when they are genuine preflights,
/// i.e. they carry a requested method the policy allows. Only preflights get
/// `Allow-Methods`, `Allow-Headers` and `Max-Age`.
pub fn resolve_headers(
    policy: &EffectiveCors,
    method: &Method,
    origin: Option<&str>,
    requested_method: Option<&str>,
) -> CorsHeaders {
    let mut headers = CorsHeaders::new();

    let (EffectiveCors::Enabled(policy), Some(origin)) = (policy, origin) else {
        return headers;
    };

    let preflight = if *method == Method::OPTIONS {
        match requested_method {
            Some(requested) if policy.allows_method(requested) => true,
            Some(requested) => {
                debug!(
                    origin = %origin,
                    requested_method = %requested,
                    "Preflight requested a method outside the policy, no CORS headers"
                );
                return headers;
            }
            None => return headers,
        }
    } else {
        false
    };

    let rule = policy.response_origin();
    let vary = match rule {
        OriginSpec::Any => {
            headers.push(ACCESS_CONTROL_ALLOW_ORIGIN, "*");
            false
        }
        OriginSpec::AnyReflected => {
            headers.push(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            true
        }
        OriginSpec::List(_) => {
            if !rule.matches(origin) {
                debug!(origin = %origin, "Origin not allowed by CORS policy");
                return headers;
            }
            headers.push(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            true
        }
    };

    if policy.credentials {
        headers.push(ACCESS_CONTROL_ALLOW_CREDENTIALS, "true");
    }
    if !policy.expose_headers.is_empty() {
        headers.push(ACCESS_CONTROL_EXPOSE_HEADERS, policy.expose_headers.join(","));
    }

    if preflight {
        let methods = policy
            .methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(",");
        headers.push(ACCESS_CONTROL_ALLOW_METHODS, methods);
        if !policy.headers.is_empty() {
            headers.push(ACCESS_CONTROL_ALLOW_HEADERS, policy.headers.join(","));
        }
        if let Some(max_age) = policy.max_age {
            headers.push(ACCESS_CONTROL_MAX_AGE, max_age.to_string());
        }
    }

    if vary {
        headers.push(VARY, "Origin");
    }

    headers
}
