use std::time::Duration;

use tracing::{debug, info, warn};

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Logs one line per request inside the dispatcher's `request` span
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        debug!(
            method = %req.method,
            path = %req.path,
            handler = %req.handler_name,
            origin = ?req.get_header("origin"),
            "Request received"
        );
        None
    }

    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, latency: Duration) {
        let latency_ms = latency.as_millis() as u64;
        if res.status >= 500 {
            warn!(
                method = %req.method,
                path = %req.path,
                status = res.status,
                latency_ms,
                "Request failed"
            );
        } else {
            info!(
                method = %req.method,
                path = %req.path,
                status = res.status,
                latency_ms,
                cors = res.get_header("access-control-allow-origin").is_some(),
                "Request complete"
            );
        }
    }
}
