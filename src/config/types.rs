use std::fmt;

use serde::de::value::{MapAccessDeserializer, SeqAccessDeserializer};
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Default `methods` list, in the order it is emitted on preflight responses.
pub const DEFAULT_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";
/// Default `headers` list.
pub const DEFAULT_HEADERS: &str = "content-type";

/// Origin rule as written in configuration.
///
/// Accepts a boolean, a single origin, a comma-separated string or an array of
/// strings. Anything else lands in `Invalid` so the parser can reject it with
/// the offending location instead of a generic deserialization error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawOrigin {
    Flag(bool),
    Text(String),
    List(Vec<String>),
    Invalid(Value),
}

impl Default for RawOrigin {
    fn default() -> Self {
        RawOrigin::Text("*".to_string())
    }
}

impl From<&str> for RawOrigin {
    fn from(value: &str) -> Self {
        RawOrigin::Text(value.to_string())
    }
}

impl From<bool> for RawOrigin {
    fn from(value: bool) -> Self {
        RawOrigin::Flag(value)
    }
}

impl From<Vec<&str>> for RawOrigin {
    fn from(value: Vec<&str>) -> Self {
        RawOrigin::List(value.into_iter().map(str::to_string).collect())
    }
}

/// Comma list (`methods`, `headers`, `exposeHeaders`) as written in configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawList {
    Csv(String),
    Items(Vec<String>),
    Invalid(Value),
}

impl RawList {
    pub fn csv(value: &str) -> Self {
        RawList::Csv(value.to_string())
    }

    pub fn empty() -> Self {
        RawList::Csv(String::new())
    }
}

impl From<&str> for RawList {
    fn from(value: &str) -> Self {
        RawList::csv(value)
    }
}

impl From<Vec<&str>> for RawList {
    fn from(value: Vec<&str>) -> Self {
        RawList::Items(value.into_iter().map(str::to_string).collect())
    }
}

fn default_methods() -> RawList {
    RawList::csv(DEFAULT_METHODS)
}

fn default_headers() -> RawList {
    RawList::csv(DEFAULT_HEADERS)
}

/// The global `cors` block.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GlobalCorsConfig {
    /// Apply the global policy to routes that have no `cors` setting
    #[serde(default)]
    pub all_routes: bool,
    #[serde(default, alias = "allowOrigins")]
    pub origin: RawOrigin,
    #[serde(default, alias = "allowCredentials")]
    pub credentials: bool,
    #[serde(default)]
    pub allow_any_origin_with_credentials_unsafe: bool,
    #[serde(default = "default_methods", alias = "allowRequestMethods")]
    pub methods: RawList,
    #[serde(default = "default_headers", alias = "allowRequestHeaders")]
    pub headers: RawList,
    #[serde(default = "RawList::empty", alias = "allowResponseHeaders")]
    pub expose_headers: RawList,
    /// Seconds a browser may cache a preflight response
    #[serde(default)]
    pub max_age: Option<u32>,
}

impl Default for GlobalCorsConfig {
    fn default() -> Self {
        Self {
            all_routes: false,
            origin: RawOrigin::default(),
            credentials: false,
            allow_any_origin_with_credentials_unsafe: false,
            methods: default_methods(),
            headers: default_headers(),
            expose_headers: RawList::empty(),
            max_age: None,
        }
    }
}

/// Partial policy attached to a single route.
///
/// Every field that is `Some` replaces the corresponding global field
/// entirely; `None` inherits it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct CorsOverride {
    #[serde(alias = "allowOrigins")]
    pub origin: Option<RawOrigin>,
    #[serde(alias = "allowCredentials")]
    pub credentials: Option<bool>,
    pub allow_any_origin_with_credentials_unsafe: Option<bool>,
    #[serde(alias = "allowRequestMethods")]
    pub methods: Option<RawList>,
    #[serde(alias = "allowRequestHeaders")]
    pub headers: Option<RawList>,
    #[serde(alias = "allowResponseHeaders")]
    pub expose_headers: Option<RawList>,
    pub max_age: Option<u32>,
}

/// Value of a route's `cors` key, read by value kind: boolean, string,
/// list or map.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteCors {
    /// `true` inherits the global policy, `false` disables CORS
    Flag(bool),
    /// Shorthand for `{ origin: "<value>" }`
    Origin(String),
    /// Shorthand for `{ origin: [..] }`
    OriginList(Vec<String>),
    Override(CorsOverride),
}

impl<'de> Deserialize<'de> for RouteCors {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RouteCorsVisitor;

        impl<'de> Visitor<'de> for RouteCorsVisitor {
            type Value = RouteCors;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a boolean, an origin string, a list of origins or a CORS settings map")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(RouteCors::Flag(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(RouteCors::Origin(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(RouteCors::Origin(v))
            }

            fn visit_seq<A>(self, seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                Vec::<String>::deserialize(SeqAccessDeserializer::new(seq)).map(RouteCors::OriginList)
            }

            fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                CorsOverride::deserialize(MapAccessDeserializer::new(map)).map(RouteCors::Override)
            }
        }

        deserializer.deserialize_any(RouteCorsVisitor)
    }
}

impl RouteCors {
    /// Normalise the shorthands into an override object.
    pub(crate) fn as_override(&self) -> Option<CorsOverride> {
        match self {
            RouteCors::Flag(_) => None,
            RouteCors::Origin(origin) => Some(CorsOverride {
                origin: Some(RawOrigin::Text(origin.clone())),
                ..CorsOverride::default()
            }),
            RouteCors::OriginList(origins) => Some(CorsOverride {
                origin: Some(RawOrigin::List(origins.clone())),
                ..CorsOverride::default()
            }),
            RouteCors::Override(o) => Some(o.clone()),
        }
    }
}

/// Route definition. Only `cors` is interpreted here; other route keys
/// (`target`, `action`, ...) are accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub cors: Option<RouteCors>,
}

impl RouteConfig {
    pub fn new(cors: Option<RouteCors>) -> Self {
        Self { cors }
    }

    /// `cors: true`
    pub fn enabled() -> Self {
        Self::new(Some(RouteCors::Flag(true)))
    }

    /// `cors: false`
    pub fn disabled() -> Self {
        Self::new(Some(RouteCors::Flag(false)))
    }

    /// `cors: { .. }`
    pub fn with_override(o: CorsOverride) -> Self {
        Self::new(Some(RouteCors::Override(o)))
    }
}

/// One route value: a plain target string (`"GET /x": "Ctrl.action"`) or a
/// route definition map. Errors inside the map are prefixed with the route key.
struct RouteDefinitionSeed<'a> {
    key: &'a str,
}

impl<'de> DeserializeSeed<'de> for RouteDefinitionSeed<'_> {
    type Value = RouteConfig;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for RouteDefinitionSeed<'_> {
    type Value = RouteConfig;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a target string or a route definition map for `{}`", self.key)
    }

    fn visit_str<E: de::Error>(self, _target: &str) -> Result<Self::Value, E> {
        Ok(RouteConfig::default())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(RouteConfig::default())
    }

    fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let key = self.key;
        RouteConfig::deserialize(MapAccessDeserializer::new(map))
            .map_err(|e| de::Error::custom(format_args!("route `{}`: {}", key, e)))
    }
}

/// Complete CORS-relevant configuration: the global block plus the ordered
/// route definitions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub cors: GlobalCorsConfig,
    #[serde(deserialize_with = "deserialize_ordered_routes")]
    pub routes: Vec<(String, RouteConfig)>,
}

impl CorsConfig {
    pub fn new(cors: GlobalCorsConfig) -> Self {
        Self {
            cors,
            routes: Vec::new(),
        }
    }

    /// Append a route definition; declaration order is match order.
    pub fn route(mut self, address: &str, config: RouteConfig) -> Self {
        self.routes.push((address.to_string(), config));
        self
    }
}

/// Deserialize a map into a list, keeping the order entries appear in the
/// source document.
fn deserialize_ordered_routes<'de, D>(deserializer: D) -> Result<Vec<(String, RouteConfig)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct RoutesVisitor;

    impl<'de> Visitor<'de> for RoutesVisitor {
        type Value = Vec<(String, RouteConfig)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of route addresses to route definitions")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut routes = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(address) = map.next_key::<String>()? {
                let config = map.next_value_seed(RouteDefinitionSeed { key: &address })?;
                routes.push((address, config));
            }
            Ok(routes)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_map(RoutesVisitor)
}
