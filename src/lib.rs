//! # brrtcors
//!
//! **brrtcors** is a route-aware CORS policy engine. It reads a global `cors`
//! block plus per-route `cors` settings, merges them into one immutable policy
//! per route, refuses to start on unsafe combinations, and computes the
//! `Access-Control-*` response headers for every request.
//!
//! ## Architecture
//!
//! - **[`config`]** - Deserialisable configuration shapes and YAML/TOML/JSON loading
//! - **[`cors`]** - Origin parsing, policy merging, validation and header resolution
//! - **[`router`]** - `"VERB /path"` route addresses and first-match path tables
//! - **[`dispatcher`]** - Transport-free request dispatch with middleware hooks
//! - **[`middleware`]** - Pluggable middleware (CORS, tracing)
//! - **[`ids`]** - ULID request identifiers
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - The `brrtcors` command-line tool
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Dispatcher
//!     participant Cors as CorsMiddleware
//!     participant Table as CorsRouteTable
//!     participant Handler
//!
//!     Client->>Dispatcher: OPTIONS /widgets<br/>Origin, Access-Control-Request-Method
//!     Dispatcher->>Cors: before()
//!     Cors->>Table: resolve(method, path, origin, requested)
//!     alt Preflight allowed
//!         Table-->>Cors: Access-Control-* headers
//!         Cors-->>Client: 200 with preflight headers
//!     else Not allowed
//!         Cors-->>Dispatcher: continue
//!         Dispatcher->>Handler: handle
//!         Handler-->>Dispatcher: HandlerResponse
//!         Dispatcher->>Cors: after()
//!         Cors-->>Client: response without CORS headers
//!     end
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use brrtcors::config::{parse_config, ConfigFormat};
//! use brrtcors::dispatcher::{Dispatcher, HandlerResponse, HeaderVec};
//! use brrtcors::middleware::CorsMiddleware;
//! use http::Method;
//!
//! let config = parse_config(
//!     r#"
//! cors:
//!   origin: "*"
//! routes:
//!   "PUT /cors-true": { cors: true }
//! "#,
//!     ConfigFormat::Yaml,
//! )
//! .unwrap();
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher
//!     .add_route("PUT /cors-true", "cors_true", |_req| HandlerResponse::ok())
//!     .unwrap();
//! dispatcher.add_middleware(Arc::new(CorsMiddleware::from_config(&config).unwrap()));
//!
//! let mut headers = HeaderVec::new();
//! headers.push((Arc::from("origin"), "http://example.com".to_string()));
//! let resp = dispatcher.dispatch(Method::PUT, "/cors-true", headers);
//! assert_eq!(resp.get_header("access-control-allow-origin"), Some("*"));
//! ```
//!
//! ## Safety Rule
//!
//! A policy allowing any origin together with credentials is rejected at
//! construction unless it sets `allowAnyOriginWithCredentialsUnsafe: true`.
//! The unsafe variant reflects the request `Origin` rather than sending `*`.

pub mod cli;
pub mod config;
pub mod cors;
pub mod dispatcher;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod router;

pub use config::{load_config, CorsConfig, GlobalCorsConfig, RouteConfig};
pub use cors::{CorsConfigError, CorsHeaders, CorsRouteTable, EffectiveCors, OriginSpec};
pub use logging::{init_logging_with_config, LogConfig};
