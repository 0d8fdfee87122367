//! # CORS Policy Engine
//!
//! Turns the global `cors` block and per-route `cors` settings into one
//! validated, immutable policy per route, and computes the response headers
//! for each request.
//!
//! ## Pipeline
//!
//! 1. [`parse_origin`] normalises `true`, `"*"`, a single origin, a
//!    comma-separated string or an array into an [`OriginSpec`], or the
//!    disabled marker for `false`.
//! 2. [`merge_route_policies`] combines the global settings with each route's
//!    override (whole-field replacement) into an [`EffectiveCors`].
//! 3. [`validate_all_policies`] rejects any origin with credentials unless
//!    `allowAnyOriginWithCredentialsUnsafe` is set.
//! 4. [`resolve_headers`] computes the `Access-Control-*` headers for one
//!    request.
//!
//! [`CorsRouteTable`] runs steps 1-3 at construction and step 4 per request.
//!
//! ## Example
//!
//! ```rust
//! use brrtcors::config::{CorsConfig, CorsOverride, GlobalCorsConfig, RouteConfig};
//! use brrtcors::cors::CorsRouteTable;
//! use http::Method;
//!
//! let config = CorsConfig::new(GlobalCorsConfig::default()).route(
//!     "/widgets",
//!     RouteConfig::with_override(CorsOverride {
//!         origin: Some("https://app.example.com".into()),
//!         ..CorsOverride::default()
//!     }),
//! );
//! let table = CorsRouteTable::from_config(&config).unwrap();
//!
//! let headers = table.resolve(&Method::GET, "/widgets", Some("https://app.example.com"), None);
//! assert_eq!(
//!     headers.get(&http::header::ACCESS_CONTROL_ALLOW_ORIGIN),
//!     Some("https://app.example.com")
//! );
//! assert_eq!(headers.get(&http::header::VARY), Some("Origin"));
//! ```

mod error;
mod merge;
mod origin;
mod policy;
mod resolve;
mod table;
mod validate;

pub use error::{CorsConfigError, PolicyLocation};
pub use merge::{
    effective_route_policy, merge_route_policies, CorsSettings, PolicySource, ResolvedPolicies,
    RoutePolicy,
};
pub use origin::{parse_origin, OriginSpec, ParsedOrigin};
pub use policy::{CorsPolicy, EffectiveCors, DEFAULT_ALLOWED_METHODS};
pub use resolve::{resolve_headers, CorsHeaders};
pub use table::CorsRouteTable;
pub use validate::{validate_all_policies, validate_policy, validate_resolved};
