use std::fmt;

use tracing::debug;

use super::error::{CorsConfigError, PolicyLocation};
use super::policy::{CorsPolicy, EffectiveCors};
use crate::config::{CorsOverride, GlobalCorsConfig, RawList, RawOrigin, RouteConfig, RouteCors};
use crate::router::RouteAddress;

/// Raw CORS fields with every value present.
///
/// Merging happens at this level, before parsing, so an override replaces a
/// global field exactly as written (no list unioning).
#[derive(Debug, Clone, PartialEq)]
pub struct CorsSettings {
    pub origin: RawOrigin,
    pub credentials: bool,
    pub allow_any_origin_with_credentials_unsafe: bool,
    pub methods: RawList,
    pub headers: RawList,
    pub expose_headers: RawList,
    pub max_age: Option<u32>,
}

impl From<&GlobalCorsConfig> for CorsSettings {
    fn from(global: &GlobalCorsConfig) -> Self {
        Self {
            origin: global.origin.clone(),
            credentials: global.credentials,
            allow_any_origin_with_credentials_unsafe: global
                .allow_any_origin_with_credentials_unsafe,
            methods: global.methods.clone(),
            headers: global.headers.clone(),
            expose_headers: global.expose_headers.clone(),
            max_age: global.max_age,
        }
    }
}

impl CorsSettings {
    /// Field-by-field override: set fields win, unset fields inherit.
    #[must_use]
    pub fn overridden_by(&self, o: &CorsOverride) -> Self {
        Self {
            origin: o.origin.clone().unwrap_or_else(|| self.origin.clone()),
            credentials: o.credentials.unwrap_or(self.credentials),
            allow_any_origin_with_credentials_unsafe: o
                .allow_any_origin_with_credentials_unsafe
                .unwrap_or(self.allow_any_origin_with_credentials_unsafe),
            methods: o.methods.clone().unwrap_or_else(|| self.methods.clone()),
            headers: o.headers.clone().unwrap_or_else(|| self.headers.clone()),
            expose_headers: o
                .expose_headers
                .clone()
                .unwrap_or_else(|| self.expose_headers.clone()),
            max_age: o.max_age.or(self.max_age),
        }
    }
}

/// How a route obtained its effective policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicySource {
    /// No `cors` key and `allRoutes: false`
    Unset,
    /// No `cors` key, global policy applied through `allRoutes: true`
    AllRoutes,
    /// `cors: true`
    Global,
    /// `cors: false`
    Disabled,
    /// `cors: { .. }` or an origin shorthand
    Override,
}

impl fmt::Display for PolicySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PolicySource::Unset => "unset",
            PolicySource::AllRoutes => "allRoutes",
            PolicySource::Global => "cors: true",
            PolicySource::Disabled => "cors: false",
            PolicySource::Override => "override",
        };
        write!(f, "{}", s)
    }
}

/// Effective policy of one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    /// Route key as written in configuration
    pub key: String,
    pub address: RouteAddress,
    pub policy: EffectiveCors,
    pub source: PolicySource,
}

impl RoutePolicy {
    #[must_use]
    pub fn location(&self) -> PolicyLocation {
        PolicyLocation::route(self.key.as_str())
    }
}

/// Output of the merger: the global policy and one policy per route, in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPolicies {
    pub all_routes: bool,
    pub global: EffectiveCors,
    pub routes: Vec<RoutePolicy>,
}

/// Merge the global configuration with every route's `cors` setting.
///
/// Fails on malformed values or route addresses. Safety is checked separately
/// by [`super::validate_resolved`].
pub fn merge_route_policies(
    global: &GlobalCorsConfig,
    routes: &[(String, RouteConfig)],
) -> Result<ResolvedPolicies, CorsConfigError> {
    let global_settings = CorsSettings::from(global);
    let global_policy = CorsPolicy::from_settings(&global_settings, &PolicyLocation::Global)?;

    let mut resolved = Vec::with_capacity(routes.len());
    for (key, route) in routes {
        let address =
            RouteAddress::parse(key).map_err(|e| CorsConfigError::InvalidRouteAddress {
                address: key.clone(),
                reason: e.reason,
            })?;
        let location = PolicyLocation::route(key.as_str());
        let (policy, source) = effective_route_policy(
            &global_settings,
            &global_policy,
            global.all_routes,
            route,
            &location,
        )?;
        debug!(
            route = %key,
            source = %source,
            enabled = policy.is_enabled(),
            "Resolved route CORS policy"
        );
        resolved.push(RoutePolicy {
            key: key.clone(),
            address,
            policy,
            source,
        });
    }

    Ok(ResolvedPolicies {
        all_routes: global.all_routes,
        global: global_policy,
        routes: resolved,
    })
}

/// Effective policy for a single route.
pub fn effective_route_policy(
    global_settings: &CorsSettings,
    global_policy: &EffectiveCors,
    all_routes: bool,
    route: &RouteConfig,
    location: &PolicyLocation,
) -> Result<(EffectiveCors, PolicySource), CorsConfigError> {
    match &route.cors {
        None if all_routes => Ok((global_policy.clone(), PolicySource::AllRoutes)),
        None => Ok((EffectiveCors::Disabled, PolicySource::Unset)),
        Some(RouteCors::Flag(false)) => Ok((EffectiveCors::Disabled, PolicySource::Disabled)),
        Some(RouteCors::Flag(true)) => Ok((global_policy.clone(), PolicySource::Global)),
        Some(cors) => {
            let o = cors.as_override().unwrap_or_default();
            let settings = global_settings.overridden_by(&o);
            Ok((
                CorsPolicy::from_settings(&settings, location)?,
                PolicySource::Override,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cors::OriginSpec;
    use http::Method;

    fn routes(entries: &[(&str, RouteConfig)]) -> Vec<(String, RouteConfig)> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn origin_override(origin: &str) -> RouteConfig {
        RouteConfig::with_override(CorsOverride {
            origin: Some(origin.into()),
            ..CorsOverride::default()
        })
    }

    #[test]
    fn test_absent_cors_follows_all_routes() {
        let table = routes(&[("PUT /no-cors-config", RouteConfig::default())]);

        let off = merge_route_policies(&GlobalCorsConfig::default(), &table).unwrap();
        assert_eq!(off.routes[0].policy, EffectiveCors::Disabled);
        assert_eq!(off.routes[0].source, PolicySource::Unset);

        let global = GlobalCorsConfig {
            all_routes: true,
            ..GlobalCorsConfig::default()
        };
        let on = merge_route_policies(&global, &table).unwrap();
        assert_eq!(on.routes[0].policy, on.global);
        assert_eq!(on.routes[0].source, PolicySource::AllRoutes);
    }

    #[test]
    fn test_false_disables_even_with_all_routes() {
        let global = GlobalCorsConfig {
            all_routes: true,
            ..GlobalCorsConfig::default()
        };
        let merged =
            merge_route_policies(&global, &routes(&[("/off", RouteConfig::disabled())])).unwrap();
        assert_eq!(merged.routes[0].policy, EffectiveCors::Disabled);
    }

    #[test]
    fn test_true_inherits_global_verbatim() {
        let global = GlobalCorsConfig {
            origin: "http://example.com".into(),
            credentials: true,
            ..GlobalCorsConfig::default()
        };
        let merged =
            merge_route_policies(&global, &routes(&[("/on", RouteConfig::enabled())])).unwrap();
        assert_eq!(merged.routes[0].policy, merged.global);
        assert_eq!(merged.routes[0].source, PolicySource::Global);
    }

    #[test]
    fn test_override_replaces_fields_without_unioning() {
        let global = GlobalCorsConfig {
            origin: "http://global.com, http://other.com".into(),
            expose_headers: "X-Global".into(),
            ..GlobalCorsConfig::default()
        };
        let route = RouteConfig::with_override(CorsOverride {
            origin: Some("http://example.com".into()),
            methods: Some("PUT".into()),
            ..CorsOverride::default()
        });
        let merged = merge_route_policies(&global, &routes(&[("/x", route)])).unwrap();
        let policy = merged.routes[0].policy.policy().unwrap();
        assert_eq!(policy.origin, OriginSpec::List(vec!["http://example.com".into()]));
        assert_eq!(policy.methods, vec![Method::PUT]);
        // inherited
        assert_eq!(policy.expose_headers, vec!["X-Global"]);
        assert_eq!(policy.headers, vec!["content-type"]);
    }

    #[test]
    fn test_origin_shorthand_matches_override() {
        let shorthand = RouteConfig::new(Some(RouteCors::Origin("http://example.com".into())));
        let merged = merge_route_policies(
            &GlobalCorsConfig::default(),
            &routes(&[("/a", shorthand), ("/b", origin_override("http://example.com"))]),
        )
        .unwrap();
        assert_eq!(merged.routes[0].policy, merged.routes[1].policy);
    }

    #[test]
    fn test_override_can_enable_route_when_global_origin_is_false() {
        let global = GlobalCorsConfig {
            origin: false.into(),
            all_routes: true,
            ..GlobalCorsConfig::default()
        };
        let merged = merge_route_policies(
            &global,
            &routes(&[
                ("/inherits", RouteConfig::default()),
                ("/explicit", origin_override("http://example.com")),
            ]),
        )
        .unwrap();
        assert_eq!(merged.global, EffectiveCors::Disabled);
        assert_eq!(merged.routes[0].policy, EffectiveCors::Disabled);
        assert!(merged.routes[1].policy.is_enabled());
    }

    #[test]
    fn test_invalid_address_is_reported() {
        let err = merge_route_policies(
            &GlobalCorsConfig::default(),
            &routes(&[("FETCH", RouteConfig::enabled())]),
        )
        .unwrap_err();
        assert!(matches!(err, CorsConfigError::InvalidRouteAddress { .. }));
    }

    #[test]
    fn test_shape_error_names_route() {
        let route = RouteConfig::with_override(CorsOverride {
            origin: Some(RawOrigin::List(vec![])),
            ..CorsOverride::default()
        });
        let err =
            merge_route_policies(&GlobalCorsConfig::default(), &routes(&[("GET /bad", route)]))
                .unwrap_err();
        assert_eq!(err.location(), Some(&PolicyLocation::route("GET /bad")));
    }
}
