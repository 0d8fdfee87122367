//! # Configuration Module
//!
//! Deserialisable shapes for the global `cors` block and per-route `cors`
//! settings, plus file loading.
//!
//! ## Example (YAML)
//!
//! ```yaml
//! cors:
//!   allRoutes: false
//!   origin: "*"
//!   credentials: false
//!   methods: GET,HEAD,PUT,PATCH,POST,DELETE
//!   headers: content-type
//! routes:
//!   "PUT /cors-true": { cors: true }
//!   "/widgets": { cors: { origin: "https://app.example.com", credentials: true } }
//!   "GET /legacy": { cors: false }
//! ```
//!
//! Keys use camelCase. The newer spellings `allowOrigins`, `allowCredentials`,
//! `allowRequestMethods`, `allowRequestHeaders` and `allowResponseHeaders` are
//! accepted as aliases. Route order is preserved: the first route matching a
//! request decides its policy.

mod load;
mod types;

pub use load::{load_config, parse_config, ConfigFormat};
pub use types::{
    CorsConfig, CorsOverride, GlobalCorsConfig, RawList, RawOrigin, RouteConfig, RouteCors,
    DEFAULT_HEADERS, DEFAULT_METHODS,
};
