use std::sync::Arc;
use std::time::{Duration, Instant};

use http::Method;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use tracing::{debug, error, info, info_span, warn};

use crate::ids::RequestId;
use crate::middleware::Middleware;
use crate::router::{ParamVec, RouteAddress, RouteAddressError, RouteTable};

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path
///
/// Header names use `Arc<str>` so repeated names are cheap to clone.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Header carrying a caller-supplied request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request data passed to middleware and handlers
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Name of the handler that should process this request; empty when no
    /// route matched
    pub handler_name: String,
    /// Path parameters extracted from the URL (stack-allocated for ≤8 params)
    pub path_params: ParamVec,
    /// HTTP headers (stack-allocated for ≤16 headers)
    pub headers: HeaderVec,
}

impl HandlerRequest {
    /// Get a path parameter by name. The last occurrence wins.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response produced by a handler or a short-circuiting middleware
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers (stack-allocated for ≤16 headers)
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body as JSON
    pub body: Value,
}

impl HandlerResponse {
    /// Create a new response with the given status, headers, and body
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with default headers
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// `200` with no body
    #[must_use]
    pub fn ok() -> Self {
        Self::new(200, HeaderVec::new(), Value::Null)
    }

    /// Create an error response
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Request handler. Runs synchronously on the dispatching thread.
pub type Handler = Arc<dyn Fn(&HandlerRequest) -> HandlerResponse + Send + Sync>;

#[derive(Clone)]
struct Registration {
    handler_name: String,
    handler: Handler,
}

/// In-process dispatcher: an ordered route table of handlers wrapped in a
/// middleware chain.
///
/// - Unmatched `OPTIONS` requests are answered `200` with no body so that
///   middleware (CORS in particular) decides what they carry.
/// - Other unmatched requests get a `404` JSON error.
/// - A panicking handler becomes a `500` JSON error.
#[derive(Default)]
pub struct Dispatcher {
    routes: RouteTable<Registration>,
    /// Ordered list of middleware to apply to requests/responses
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Dispatcher {
    /// Create a new empty dispatcher
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a route address such as `"PUT /widgets/:id"`.
    ///
    /// Routes match in registration order.
    pub fn add_route<F>(
        &mut self,
        address: &str,
        handler_name: &str,
        handler: F,
    ) -> Result<(), RouteAddressError>
    where
        F: Fn(&HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
    {
        let address = RouteAddress::parse(address)?;
        info!(
            route = %address,
            handler_name = %handler_name,
            total_handlers = self.routes.len() + 1,
            "Handler registered successfully"
        );
        self.routes.insert(
            address,
            Registration {
                handler_name: handler_name.to_string(),
                handler: Arc::new(handler),
            },
        )
    }

    /// Add middleware to the processing pipeline
    ///
    /// Middleware is executed in the order it's added.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Run a request through middleware and the matched handler.
    ///
    /// `path` may include a query string. An `x-request-id` header carrying a
    /// valid ULID is reused as the request id.
    pub fn dispatch(&self, method: Method, path: &str, headers: HeaderVec) -> HandlerResponse {
        let request_id = RequestId::from_header_or_new(
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(REQUEST_ID_HEADER))
                .map(|(_, v)| v.as_str()),
        );
        let span = info_span!(
            "request",
            request_id = %request_id,
            method = %method,
            path = %path
        );
        let _enter = span.enter();

        let route = self.routes.find(&method, path);
        let (handler, handler_name, path_params) = match route {
            Some(m) => (
                Some(Arc::clone(&m.value.handler)),
                m.value.handler_name.clone(),
                m.path_params,
            ),
            None => (None, String::new(), ParamVec::new()),
        };

        let request = HandlerRequest {
            request_id,
            method,
            path: path.split(['?', '#']).next().unwrap_or(path).to_string(),
            handler_name,
            path_params,
            headers,
        };

        let mut early_resp: Option<HandlerResponse> = None;
        for (idx, mw) in self.middlewares.iter().enumerate() {
            if early_resp.is_none() {
                early_resp = mw.before(&request);
                if early_resp.is_some() {
                    debug!(
                        middleware_idx = idx,
                        middleware_name = std::any::type_name_of_val(mw.as_ref()),
                        "Middleware returned early response"
                    );
                }
            } else {
                mw.before(&request);
            }
        }

        let (mut resp, latency) = match early_resp {
            Some(r) => (r, Duration::from_millis(0)),
            None => {
                let start = Instant::now();
                let r = match handler {
                    Some(handler) => self.run_handler(&handler, &request),
                    None if request.method == Method::OPTIONS => {
                        debug!("Unrouted OPTIONS request answered with 200");
                        HandlerResponse::ok()
                    }
                    None => {
                        warn!("No route matched");
                        HandlerResponse::error(404, "Not Found")
                    }
                };
                (r, start.elapsed())
            }
        };

        for mw in &self.middlewares {
            mw.after(&request, &mut resp, latency);
        }

        resp
    }

    fn run_handler(&self, handler: &Handler, request: &HandlerRequest) -> HandlerResponse {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(request))) {
            Ok(resp) => resp,
            Err(panic) => {
                let panic_message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(
                    handler_name = %request.handler_name,
                    panic_message = %panic_message,
                    "Handler panicked - CRITICAL"
                );
                HandlerResponse::error(500, &format!("Handler panicked: {}", panic_message))
            }
        }
    }
}
