use std::fmt;

/// Where a CORS policy came from: the process-wide default or a named route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PolicyLocation {
    /// The global `cors` block
    Global,
    /// A route override, keyed by its address as written in configuration
    Route(String),
}

impl PolicyLocation {
    /// Build a route location from a route address.
    pub fn route(address: impl Into<String>) -> Self {
        PolicyLocation::Route(address.into())
    }
}

impl fmt::Display for PolicyLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyLocation::Global => write!(f, "global"),
            PolicyLocation::Route(address) => write!(f, "route `{}`", address),
        }
    }
}

/// CORS configuration error
///
/// Every variant is fatal: it is produced while building the route table at
/// startup and must prevent the server from accepting connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsConfigError {
    /// Any origin (`*`) combined with credentials, without
    /// `allowAnyOriginWithCredentialsUnsafe: true`
    UnsafeCorsConfig {
        /// The policy that failed validation
        location: PolicyLocation,
    },
    /// A configuration value has the wrong shape (e.g. a number where an
    /// origin list was expected)
    ConfigShape {
        /// The policy containing the malformed value
        location: PolicyLocation,
        /// Configuration key, as spelled in the config file
        field: &'static str,
        /// Human readable description of the problem
        reason: String,
    },
    /// A route key could not be parsed as `"VERB /path"` or `"/path"`
    InvalidRouteAddress {
        /// The route key as written
        address: String,
        /// Human readable description of the problem
        reason: String,
    },
}

impl CorsConfigError {
    pub(crate) fn shape(
        location: &PolicyLocation,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        CorsConfigError::ConfigShape {
            location: location.clone(),
            field,
            reason: reason.into(),
        }
    }

    /// The policy location the error refers to, if any.
    #[must_use]
    pub fn location(&self) -> Option<&PolicyLocation> {
        match self {
            CorsConfigError::UnsafeCorsConfig { location }
            | CorsConfigError::ConfigShape { location, .. } => Some(location),
            CorsConfigError::InvalidRouteAddress { .. } => None,
        }
    }

    /// True for the wildcard-with-credentials violation.
    #[must_use]
    pub fn is_unsafe(&self) -> bool {
        matches!(self, CorsConfigError::UnsafeCorsConfig { .. })
    }
}

impl fmt::Display for CorsConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorsConfigError::UnsafeCorsConfig { location } => {
                write!(
                    f,
                    "CORS configuration error ({}): Cannot allow any origin (*) with credentials. \
                    Specify exact origins, or set allowAnyOriginWithCredentialsUnsafe: true \
                    to reflect the request origin instead.",
                    location
                )
            }
            CorsConfigError::ConfigShape {
                location,
                field,
                reason,
            } => {
                write!(
                    f,
                    "CORS configuration error ({}): Invalid `{}`: {}",
                    location, field, reason
                )
            }
            CorsConfigError::InvalidRouteAddress { address, reason } => {
                write!(
                    f,
                    "CORS configuration error: Invalid route address '{}': {}",
                    address, reason
                )
            }
        }
    }
}

impl std::error::Error for CorsConfigError {}
