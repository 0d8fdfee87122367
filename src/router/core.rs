use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use tracing::debug;

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Names are `Arc<str>` shared with the compiled route; values are per-request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Verbs accepted in a route address.
const ROUTE_VERBS: [Method; 9] = [
    Method::GET,
    Method::HEAD,
    Method::PUT,
    Method::PATCH,
    Method::POST,
    Method::DELETE,
    Method::OPTIONS,
    Method::TRACE,
    Method::CONNECT,
];

/// A parsed route key: `"PUT /widgets/:id"` or `"/widgets"` (every verb).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteAddress {
    /// `None` matches every method
    pub method: Option<Method>,
    pub path: String,
}

/// Route key that is not `"VERB /path"` or `"/path"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAddressError {
    pub address: String,
    pub reason: String,
}

impl fmt::Display for RouteAddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid route address '{}': {}", self.address, self.reason)
    }
}

impl std::error::Error for RouteAddressError {}

impl RouteAddress {
    pub fn new(method: Option<Method>, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    /// Parse a route key.
    ///
    /// The verb is case-insensitive and must be a standard HTTP method. The
    /// path must start with `/` and contain no whitespace.
    pub fn parse(address: &str) -> Result<Self, RouteAddressError> {
        let err = |reason: &str| RouteAddressError {
            address: address.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = address.trim();
        let (method, path) = match trimmed.split_once(char::is_whitespace) {
            Some((verb, rest)) => {
                let upper = verb.to_ascii_uppercase();
                let method = ROUTE_VERBS
                    .iter()
                    .find(|m| m.as_str() == upper)
                    .cloned()
                    .ok_or_else(|| err(&format!("unknown method '{}'", verb)))?;
                (Some(method), rest.trim())
            }
            None => (None, trimmed),
        };

        if !path.starts_with('/') {
            return Err(err("path must start with '/'"));
        }
        if path.contains(char::is_whitespace) {
            return Err(err("path must not contain whitespace"));
        }

        Ok(Self::new(method, path))
    }

    /// True if this address accepts requests with `method`.
    #[inline]
    #[must_use]
    pub fn accepts(&self, method: &Method) -> bool {
        self.method.as_ref().map_or(true, |m| m == method)
    }
}

impl FromStr for RouteAddress {
    type Err = RouteAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RouteAddress::parse(s)
    }
}

impl fmt::Display for RouteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(method) => write!(f, "{} {}", method, self.path),
            None => write!(f, "{}", self.path),
        }
    }
}

/// Result of matching a request against a [`RouteTable`].
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    pub address: &'a RouteAddress,
    pub value: &'a T,
    /// Values captured by `:name`, `{name}` and `*` segments
    pub path_params: ParamVec,
}

impl<T> RouteMatch<'_, T> {
    /// Get a path parameter by name. The last occurrence wins.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

struct CompiledRoute<T> {
    address: RouteAddress,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    value: T,
}

/// Ordered route table: the first route (in insertion order) whose verb and
/// path match wins.
pub struct RouteTable<T> {
    routes: Vec<CompiledRoute<T>>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<T> fmt::Debug for RouteTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|r| r.address.to_string()))
            .finish()
    }
}

impl<T> RouteTable<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Its path is compiled once, here.
    pub fn insert(&mut self, address: RouteAddress, value: T) -> Result<(), RouteAddressError> {
        let (regex, param_names) =
            path_to_regex(&address.path).map_err(|e| RouteAddressError {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        self.routes.push(CompiledRoute {
            address,
            regex,
            param_names,
            value,
        });
        Ok(())
    }

    /// Find the first route accepting `method` whose pattern matches `path`.
    ///
    /// Any query string or fragment on `path` is ignored.
    #[must_use]
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let path = strip_query(path);
        for route in &self.routes {
            if !route.address.accepts(method) {
                continue;
            }
            let Some(caps) = route.regex.captures(path) else {
                continue;
            };
            let mut path_params = ParamVec::new();
            for (i, name) in route.param_names.iter().enumerate() {
                if let Some(m) = caps.get(i + 1) {
                    path_params.push((Arc::clone(name), m.as_str().to_string()));
                }
            }
            debug!(
                method = %method,
                path = %path,
                route = %route.address,
                "Route matched"
            );
            return Some(RouteMatch {
                address: &route.address,
                value: &route.value,
                path_params,
            });
        }
        None
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes in match order.
    pub fn iter(&self) -> impl Iterator<Item = (&RouteAddress, &T)> {
        self.routes.iter().map(|r| (&r.address, &r.value))
    }
}

fn strip_query(path: &str) -> &str {
    match path.find(['?', '#']) {
        Some(idx) => &path[..idx],
        None => path,
    }
}

/// Convert a route path to an anchored regex and its parameter names.
///
/// `/users/:id` and `/users/{id}` both become `^/users/([^/]+)/?$`; a `*`
/// segment captures the rest of the path (possibly empty) under the name `*`.
/// A trailing slash on the request is optional.
pub(crate) fn path_to_regex(path: &str) -> Result<(Regex, Vec<Arc<str>>), regex::Error> {
    let mut pattern = String::with_capacity(path.len() + 8);
    pattern.push('^');
    let mut param_names = Vec::new();

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if segment == "*" {
            pattern.push_str("(?:/(.*))?");
            param_names.push(Arc::from("*"));
        } else if let Some(name) = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .or_else(|| segment.strip_prefix(':'))
        {
            pattern.push_str("/([^/]+)");
            param_names.push(Arc::from(name));
        } else {
            pattern.push('/');
            pattern.push_str(&regex::escape(segment));
        }
    }

    pattern.push_str("/?$");
    Ok((Regex::new(&pattern)?, param_names))
}
