use http::Method;
use tracing::{debug, info};

use super::error::CorsConfigError;
use super::merge::{merge_route_policies, PolicySource, RoutePolicy};
use super::policy::EffectiveCors;
use super::resolve::{resolve_headers, CorsHeaders};
use super::validate::validate_resolved;
use crate::config::{CorsConfig, GlobalCorsConfig, RouteConfig};
use crate::router::{RouteAddress, RouteTable};

static DISABLED: EffectiveCors = EffectiveCors::Disabled;

/// Route entry kept by the table.
#[derive(Debug, Clone)]
struct TableEntry {
    key: String,
    policy: EffectiveCors,
    source: PolicySource,
}

/// Immutable map from routes to effective CORS policies.
///
/// Construction merges and validates every policy; a table therefore never
/// holds an unsafe policy. Lookups take `&self` and allocate nothing beyond
/// the returned headers, so one table can be shared through an `Arc` by any
/// number of threads.
#[derive(Debug)]
pub struct CorsRouteTable {
    global: EffectiveCors,
    all_routes: bool,
    routes: RouteTable<TableEntry>,
}

impl CorsRouteTable {
    /// Build a table from loaded configuration.
    pub fn from_config(config: &CorsConfig) -> Result<Self, CorsConfigError> {
        Self::new(&config.cors, &config.routes)
    }

    /// Merge, validate and compile. Fails on the first invalid policy.
    pub fn new(
        global: &GlobalCorsConfig,
        routes: &[(String, RouteConfig)],
    ) -> Result<Self, CorsConfigError> {
        let resolved = merge_route_policies(global, routes)?;
        validate_resolved(&resolved)?;

        let mut table = RouteTable::new();
        let mut enabled = 0usize;
        for RoutePolicy {
            key,
            address,
            policy,
            source,
        } in resolved.routes
        {
            if policy.is_enabled() {
                enabled += 1;
            }
            table
                .insert(address, TableEntry { key, policy, source })
                .map_err(|e| CorsConfigError::InvalidRouteAddress {
                    address: e.address,
                    reason: e.reason,
                })?;
        }

        info!(
            routes_count = table.len(),
            cors_enabled_routes = enabled,
            all_routes = resolved.all_routes,
            global_enabled = resolved.global.is_enabled(),
            "CORS route table built"
        );

        Ok(Self {
            global: resolved.global,
            all_routes: resolved.all_routes,
            routes: table,
        })
    }

    /// Policy for requests that match no route.
    #[must_use]
    pub fn fallback_policy(&self) -> &EffectiveCors {
        if self.all_routes {
            &self.global
        } else {
            &DISABLED
        }
    }

    /// The parsed global policy, whether or not `allRoutes` applies it.
    #[must_use]
    pub fn global_policy(&self) -> &EffectiveCors {
        &self.global
    }

    #[must_use]
    pub fn all_routes(&self) -> bool {
        self.all_routes
    }

    /// Effective policy for `method` and `path`.
    ///
    /// The first declared route whose verb and path match decides; when none
    /// matches the global policy applies if `allRoutes` is set.
    #[must_use]
    pub fn policy_for(&self, method: &Method, path: &str) -> &EffectiveCors {
        match self.routes.find(method, path) {
            Some(m) => &m.value.policy,
            None => self.fallback_policy(),
        }
    }

    /// Key of the route that decides the policy for `method` and `path`, as
    /// written in configuration.
    #[must_use]
    pub fn matched_route(&self, method: &Method, path: &str) -> Option<&str> {
        self.routes.find(method, path).map(|m| m.value.key.as_str())
    }

    /// Method used to pick the route for a request: the requested method on
    /// an `OPTIONS` carrying `Access-Control-Request-Method`, the request
    /// method otherwise. `None` when the requested method does not parse.
    #[must_use]
    pub fn lookup_method(method: &Method, requested_method: Option<&str>) -> Option<Method> {
        match requested_method {
            Some(requested) if *method == Method::OPTIONS => {
                Method::from_bytes(requested.trim().to_ascii_uppercase().as_bytes()).ok()
            }
            _ => Some(method.clone()),
        }
    }

    /// Resolve CORS headers for a request.
    ///
    /// For `OPTIONS` with an `Access-Control-Request-Method`, the route is
    /// looked up with the requested method, so a preflight is only answered
    /// for a method the route table serves on that path.
    #[must_use]
    pub fn resolve(
        &self,
        method: &Method,
        path: &str,
        origin: Option<&str>,
        requested_method: Option<&str>,
    ) -> CorsHeaders {
        let Some(lookup) = Self::lookup_method(method, requested_method) else {
            debug!(
                path = %path,
                requested_method = ?requested_method,
                "Unparseable Access-Control-Request-Method"
            );
            return CorsHeaders::new();
        };
        let policy = self.policy_for(&lookup, path);
        resolve_headers(policy, method, origin, requested_method)
    }

    /// Routes in declaration order: key, address, policy and how it was derived.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &RouteAddress, &EffectiveCors, PolicySource)> {
        self.routes
            .iter()
            .map(|(address, e)| (e.key.as_str(), address, &e.policy, e.source))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorsOverride;
    use http::header::{ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN};

    fn table(global: GlobalCorsConfig, routes: &[(&str, RouteConfig)]) -> CorsRouteTable {
        let routes: Vec<_> = routes
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        CorsRouteTable::new(&global, &routes).unwrap()
    }

    #[test]
    fn test_preflight_uses_requested_method_for_lookup() {
        let t = table(
            GlobalCorsConfig::default(),
            &[("PUT /cors-true", RouteConfig::enabled())],
        );
        let h = t.resolve(&Method::OPTIONS, "/cors-true", Some("http://example.com"), Some("PUT"));
        assert_eq!(h.get(&ACCESS_CONTROL_ALLOW_ORIGIN), Some("*"));
        assert!(h.get(&ACCESS_CONTROL_ALLOW_METHODS).is_some());

        let h = t.resolve(&Method::OPTIONS, "/cors-true", Some("http://example.com"), Some("POST"));
        assert!(h.is_empty());
    }

    #[test]
    fn test_unmatched_path_uses_fallback() {
        let off = table(GlobalCorsConfig::default(), &[]);
        assert_eq!(off.policy_for(&Method::GET, "/x"), &EffectiveCors::Disabled);

        let on = table(
            GlobalCorsConfig {
                all_routes: true,
                ..GlobalCorsConfig::default()
            },
            &[],
        );
        assert!(on.policy_for(&Method::GET, "/x").is_enabled());
        let h = on.resolve(&Method::OPTIONS, "/x", Some("http://a.com"), Some("DELETE"));
        assert!(h.is_preflight());
    }

    #[test]
    fn test_unsafe_route_fails_construction() {
        let routes = vec![(
            "/invalid".to_string(),
            RouteConfig::with_override(CorsOverride {
                origin: Some("*".into()),
                credentials: Some(true),
                ..CorsOverride::default()
            }),
        )];
        let err = CorsRouteTable::new(&GlobalCorsConfig::default(), &routes).unwrap_err();
        assert!(err.is_unsafe());
    }

    #[test]
    fn test_garbage_request_method_yields_nothing() {
        let t = table(
            GlobalCorsConfig {
                all_routes: true,
                ..GlobalCorsConfig::default()
            },
            &[],
        );
        assert!(t
            .resolve(&Method::OPTIONS, "/", Some("http://a.com"), Some("NOT VALID"))
            .is_empty());
    }

    #[test]
    fn test_lookup_method() {
        assert_eq!(
            CorsRouteTable::lookup_method(&Method::OPTIONS, Some(" put ")),
            Some(Method::PUT)
        );
        assert_eq!(
            CorsRouteTable::lookup_method(&Method::OPTIONS, None),
            Some(Method::OPTIONS)
        );
        assert_eq!(
            CorsRouteTable::lookup_method(&Method::GET, Some("NOT VALID")),
            Some(Method::GET)
        );
        assert_eq!(CorsRouteTable::lookup_method(&Method::OPTIONS, Some("NOT VALID")), None);
    }

    #[test]
    fn test_routes_listing_keeps_order() {
        let t = table(
            GlobalCorsConfig::default(),
            &[
                ("/b", RouteConfig::disabled()),
                ("GET /a", RouteConfig::enabled()),
            ],
        );
        let keys: Vec<&str> = t.routes().map(|(k, ..)| k).collect();
        assert_eq!(keys, vec!["/b", "GET /a"]);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_table_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CorsRouteTable>();
    }
}
