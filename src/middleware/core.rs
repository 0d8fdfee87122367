use std::time::Duration;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Hooks run by the [`Dispatcher`](crate::dispatcher::Dispatcher) around
/// every request.
pub trait Middleware: Send + Sync {
    /// Runs before the handler. Returning a response skips the handler; the
    /// remaining `before` hooks still run.
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }
    /// Runs on every response, including short-circuited ones.
    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, _latency: Duration) {}
}
