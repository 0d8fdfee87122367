//! # Router Module
//!
//! Route addresses and an ordered, regex-compiled route table.
//!
//! ## Route addresses
//!
//! Route keys are written `"VERB /path"` or `"/path"` (every verb). Paths may
//! contain `:name` or `{name}` parameter segments and a `*` segment that
//! captures the remainder of the path.
//!
//! ## Matching
//!
//! 1. **Compilation**: each path is turned into an anchored regex once, when
//!    the route is inserted.
//! 2. **Matching**: routes are tried in insertion order and the first one
//!    whose verb and pattern match wins. Query strings are ignored and a
//!    trailing slash is optional.
//!
//! ## Example
//!
//! ```rust
//! use brrtcors::router::{RouteAddress, RouteTable};
//! use http::Method;
//!
//! let mut table = RouteTable::new();
//! table.insert(RouteAddress::parse("GET /pets/:id").unwrap(), "get_pet").unwrap();
//!
//! let m = table.find(&Method::GET, "/pets/42?full=true").unwrap();
//! assert_eq!(*m.value, "get_pet");
//! assert_eq!(m.get_path_param("id"), Some("42"));
//! ```
//!
//! The same table backs both CORS policy lookup and handler dispatch, so a
//! preflight is only recognised for a method and path the table knows about.

mod core;

pub use core::{
    ParamVec, RouteAddress, RouteAddressError, RouteMatch, RouteTable, MAX_INLINE_PARAMS,
};
