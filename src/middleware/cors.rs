use std::sync::Arc;
use std::time::Duration;

use http::header::VARY;
use http::Method;
use tracing::debug;

use super::Middleware;
use crate::config::CorsConfig;
use crate::cors::{CorsConfigError, CorsHeaders, CorsRouteTable};
use crate::dispatcher::{HandlerRequest, HandlerResponse};

const ORIGIN: &str = "origin";
const ACCESS_CONTROL_REQUEST_METHOD: &str = "access-control-request-method";

/// Route-aware CORS middleware
///
/// Every decision is delegated to a shared [`CorsRouteTable`]; the middleware
/// only moves headers between the request, the resolver and the response.
///
/// # CORS Flow
///
/// 1. **Preflight**: an `OPTIONS` request carrying
///    `Access-Control-Request-Method` that resolves to a non-empty header set
///    is answered `200` with those headers; the handler never runs.
/// 2. **Anything else**: the handler runs and the resolved headers are merged
///    into its response in `after()`. `Vary: Origin` is appended to an
///    existing `Vary` value. The status is never changed.
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    table: Arc<CorsRouteTable>,
}

impl CorsMiddleware {
    pub fn new(table: Arc<CorsRouteTable>) -> Self {
        Self { table }
    }

    /// Merge and validate `config`, failing on the first invalid policy.
    pub fn from_config(config: &CorsConfig) -> Result<Self, CorsConfigError> {
        Ok(Self::new(Arc::new(CorsRouteTable::from_config(config)?)))
    }

    #[must_use]
    pub fn table(&self) -> &CorsRouteTable {
        &self.table
    }

    fn resolve(&self, req: &HandlerRequest) -> CorsHeaders {
        self.table.resolve(
            &req.method,
            &req.path,
            req.get_header(ORIGIN),
            req.get_header(ACCESS_CONTROL_REQUEST_METHOD),
        )
    }
}

/// Write resolved headers onto a response. Running it twice is harmless.
fn apply_headers(headers: &CorsHeaders, res: &mut HandlerResponse) {
    for (name, value) in headers.iter() {
        if *name == VARY {
            append_vary(res, value);
        } else {
            res.set_header(name.as_str(), value.to_string());
        }
    }
}

fn append_vary(res: &mut HandlerResponse, value: &str) {
    match res.get_header(VARY.as_str()) {
        Some(existing)
            if existing
                .split(',')
                .map(str::trim)
                .any(|v| v == "*" || v.eq_ignore_ascii_case(value)) => {}
        Some(existing) => {
            let merged = format!("{}, {}", existing, value);
            res.set_header(VARY.as_str(), merged);
        }
        None => res.set_header(VARY.as_str(), value.to_string()),
    }
}

impl Middleware for CorsMiddleware {
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        if req.method != Method::OPTIONS || req.get_header(ACCESS_CONTROL_REQUEST_METHOD).is_none()
        {
            return None;
        }
        let headers = self.resolve(req);
        if headers.is_empty() {
            debug!(
                path = %req.path,
                origin = ?req.get_header(ORIGIN),
                requested_method = ?req.get_header(ACCESS_CONTROL_REQUEST_METHOD),
                "OPTIONS request is not a CORS preflight for this route"
            );
            return None;
        }
        let mut res = HandlerResponse::ok();
        apply_headers(&headers, &mut res);
        debug!(path = %req.path, headers = headers.len(), "Answered CORS preflight");
        Some(res)
    }

    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, _latency: Duration) {
        let headers = self.resolve(req);
        apply_headers(&headers, res);
    }
}
