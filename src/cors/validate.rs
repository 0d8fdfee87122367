use tracing::error;

use super::error::{CorsConfigError, PolicyLocation};
use super::merge::{ResolvedPolicies, RoutePolicy};
use super::policy::EffectiveCors;

/// Reject a policy that allows any origin with credentials.
///
/// Browsers refuse `Access-Control-Allow-Origin: *` together with
/// `Access-Control-Allow-Credentials: true`, so the only way to serve such a
/// policy is to reflect the origin, which must be asked for explicitly.
/// Disabled policies always pass.
pub fn validate_policy(
    policy: &EffectiveCors,
    location: &PolicyLocation,
) -> Result<(), CorsConfigError> {
    match policy {
        EffectiveCors::Enabled(p) if p.is_unsafe() => Err(CorsConfigError::UnsafeCorsConfig {
            location: location.clone(),
        }),
        _ => Ok(()),
    }
}

/// Validate the global policy, then every route policy in declaration order.
///
/// Stops at the first failure.
pub fn validate_all_policies(
    global: &EffectiveCors,
    routes: &[RoutePolicy],
) -> Result<(), CorsConfigError> {
    let checks = std::iter::once((global, PolicyLocation::Global))
        .chain(routes.iter().map(|r| (&r.policy, r.location())));
    for (policy, location) in checks {
        if let Err(e) = validate_policy(policy, &location) {
            error!(location = %location, error = %e, "CORS policy validation failed");
            return Err(e);
        }
    }
    Ok(())
}

/// [`validate_all_policies`] over the merger's output.
pub fn validate_resolved(resolved: &ResolvedPolicies) -> Result<(), CorsConfigError> {
    validate_all_policies(&resolved.global, &resolved.routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CorsOverride, GlobalCorsConfig, RouteConfig};
    use crate::cors::{merge_route_policies, CorsPolicy};

    fn unsafe_policy() -> EffectiveCors {
        EffectiveCors::Enabled(CorsPolicy {
            credentials: true,
            ..CorsPolicy::default()
        })
    }

    #[test]
    fn test_any_with_credentials_is_rejected() {
        let err = validate_policy(&unsafe_policy(), &PolicyLocation::Global).unwrap_err();
        assert_eq!(
            err,
            CorsConfigError::UnsafeCorsConfig {
                location: PolicyLocation::Global
            }
        );
    }

    #[test]
    fn test_opt_in_and_lists_pass() {
        let opted_in = EffectiveCors::Enabled(CorsPolicy {
            credentials: true,
            allow_any_origin_with_credentials_unsafe: true,
            ..CorsPolicy::default()
        });
        assert!(validate_policy(&opted_in, &PolicyLocation::Global).is_ok());

        let listed = EffectiveCors::Enabled(CorsPolicy {
            origin: crate::cors::OriginSpec::List(vec!["http://example.com".into()]),
            credentials: true,
            ..CorsPolicy::default()
        });
        assert!(validate_policy(&listed, &PolicyLocation::Global).is_ok());
        assert!(validate_policy(&EffectiveCors::Disabled, &PolicyLocation::Global).is_ok());
    }

    #[test]
    fn test_global_checked_before_routes() {
        let global = GlobalCorsConfig {
            credentials: true,
            ..GlobalCorsConfig::default()
        };
        let routes = vec![("/invalid".to_string(), RouteConfig::enabled())];
        let resolved = merge_route_policies(&global, &routes).unwrap();
        let err = validate_resolved(&resolved).unwrap_err();
        assert_eq!(err.location(), Some(&PolicyLocation::Global));
    }

    #[test]
    fn test_route_failure_names_route() {
        let routes = vec![
            ("/fine".to_string(), RouteConfig::enabled()),
            (
                "/invalid".to_string(),
                RouteConfig::with_override(CorsOverride {
                    origin: Some("*".into()),
                    credentials: Some(true),
                    ..CorsOverride::default()
                }),
            ),
        ];
        let resolved = merge_route_policies(&GlobalCorsConfig::default(), &routes).unwrap();
        let err = validate_resolved(&resolved).unwrap_err();
        assert!(err.is_unsafe());
        assert_eq!(err.location(), Some(&PolicyLocation::route("/invalid")));
    }

    #[test]
    fn test_disabled_global_with_credentials_passes() {
        let global = GlobalCorsConfig {
            origin: false.into(),
            credentials: true,
            ..GlobalCorsConfig::default()
        };
        let resolved = merge_route_policies(&global, &[]).unwrap();
        assert!(validate_resolved(&resolved).is_ok());
    }
}
