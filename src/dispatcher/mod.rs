//! # Dispatcher Module
//!
//! A synchronous, in-process request pipeline used to exercise middleware
//! end to end. It never binds a socket.
//!
//! ## Request Flow
//!
//! 1. The route table matches `(method, path)` to a registered handler
//! 2. Every middleware's `before` hook runs; the first response returned
//!    short-circuits the handler
//! 3. Otherwise the handler runs (panics become `500`); unmatched `OPTIONS`
//!    requests get `200`, anything else unmatched gets `404`
//! 4. Every middleware's `after` hook runs on the response
//!
//! Each dispatch runs inside a `request` tracing span carrying a ULID
//! request id.
//!
//! ```rust
//! use brrtcors::dispatcher::{Dispatcher, HandlerResponse, HeaderVec};
//! use http::Method;
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher
//!     .add_route("PUT /widgets/:id", "update_widget", |_req| HandlerResponse::ok())
//!     .unwrap();
//!
//! let resp = dispatcher.dispatch(Method::PUT, "/widgets/7", HeaderVec::new());
//! assert_eq!(resp.status, 200);
//! ```

mod core;

pub use core::{
    Dispatcher, Handler, HandlerRequest, HandlerResponse, HeaderVec, MAX_INLINE_HEADERS,
    REQUEST_ID_HEADER,
};
