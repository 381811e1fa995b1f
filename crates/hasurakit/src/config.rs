//! Provider configuration: admin endpoint and secret.
//!
//! The configuration is resolved once from the provider attributes, with
//! environment variables as fallback, and is immutable afterwards.

use crate::error::{Error, Result};
use declarative::schema::{AttributeKind, AttributeSchema, Schema};
use declarative::{Attributes, Value};
use std::fmt;
use url::Url;

/// Environment variable holding the Hasura host (or full endpoint URL).
pub const HOST_ENV: &str = "HASURA_HOST";

/// Environment variable holding the admin secret.
pub const ADMIN_SECRET_ENV: &str = "HASURA_GRAPHQL_ADMIN_SECRET";

/// Path of the metadata API, appended to host-derived endpoints.
pub const QUERY_PATH: &str = "/v1/query";

/// A string that never shows up in logs or debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The plain secret, for the request header only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

/// Resolved provider configuration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    base_url: String,
    admin_secret: Secret,
}

impl ProviderConfig {
    /// Create a configuration from an already resolved endpoint and secret.
    pub fn new(base_url: impl Into<String>, admin_secret: Secret) -> Self {
        Self {
            base_url: base_url.into(),
            admin_secret,
        }
    }

    /// Full URL of the metadata API endpoint.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn admin_secret(&self) -> &Secret {
        &self.admin_secret
    }

    /// Schema of the provider configuration block.
    pub fn schema() -> Schema {
        Schema::new()
            .with_attribute("host", AttributeSchema::optional(AttributeKind::String))
            .with_attribute("query_uri", AttributeSchema::optional(AttributeKind::String))
            .with_attribute(
                "admin_secret",
                AttributeSchema::optional(AttributeKind::String).sensitive(),
            )
    }

    /// Resolve from provider attributes, falling back to the process environment.
    pub fn resolve(attrs: &Attributes) -> Result<Self> {
        Self::resolve_with(attrs, |key| std::env::var(key).ok())
    }

    /// Resolve from provider attributes with an injected environment lookup.
    ///
    /// `query_uri` is used verbatim and wins over `host`. Unknown values
    /// are rejected: every later call assumes a fully resolved endpoint.
    pub fn resolve_with<F>(attrs: &Attributes, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = match attribute(attrs, "query_uri")? {
            Some(uri) => {
                parse_endpoint("query_uri", &uri)?;
                uri
            }
            None => {
                let host = attribute(attrs, "host")?
                    .or_else(|| non_empty(env(HOST_ENV)))
                    .ok_or_else(|| {
                        Error::config("host", format!("not set and {HOST_ENV} is empty"))
                    })?;
                endpoint_from_host(&host)?
            }
        };

        let secret = attribute(attrs, "admin_secret")?
            .or_else(|| non_empty(env(ADMIN_SECRET_ENV)))
            .ok_or_else(|| {
                Error::config(
                    "admin_secret",
                    format!("not set and {ADMIN_SECRET_ENV} is empty"),
                )
            })?;

        log::debug!("Resolved Hasura endpoint {base_url}");
        Ok(Self::new(base_url, Secret::new(secret)))
    }
}

/// Read a string attribute, treating empty strings as unset.
fn attribute(attrs: &Attributes, name: &str) -> Result<Option<String>> {
    match attrs.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Unknown) => Err(Error::config(
            name,
            "value is not known yet; the provider cannot be configured from values computed by other resources",
        )),
        Some(Value::String(s)) => Ok(non_empty(Some(s.clone()))),
        Some(other) => Err(Error::config(
            name,
            format!("expected a string, got {}", other.kind()),
        )),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build the metadata endpoint from a host.
///
/// A bare host gets `https://`; an explicit `http://` or `https://` scheme
/// is kept. The path is always [`QUERY_PATH`].
pub fn endpoint_from_host(host: &str) -> Result<String> {
    let host = host.trim();
    let url = if host.contains("://") {
        parse_endpoint("host", host)?
    } else {
        parse_endpoint("host", &format!("https://{host}"))?
    };

    let endpoint = url
        .join(QUERY_PATH)
        .map_err(|e| Error::config("host", format!("cannot build endpoint from {host:?}: {e}")))?;
    Ok(endpoint.into())
}

/// Check that `url` is an absolute http(s) URL with a host.
pub fn parse_endpoint(attribute: &str, url: &str) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|e| Error::config(attribute, format!("{url:?} is not a valid URL: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::config(
            attribute,
            format!("{url:?} is not an http(s) URL"),
        ));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(Error::config(attribute, format!("{url:?} has no host")));
    }
    Ok(parsed)
}
