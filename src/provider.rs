//! Provider: resolves the admin API configuration once and hands it to
//! every resource handler.

use crate::resource::RemoteSchemaResource;
use declarative::{Attributes, Diagnostic, Diagnostics, Schema};
use hasurakit::{AdminClient, ProviderConfig};

/// Configured (or failed-to-configure) provider instance
#[derive(Debug, Default)]
pub struct Provider {
    client: Option<AdminClient>,
}

impl Provider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider with an already built client
    pub fn with_client(client: AdminClient) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Schema of the `[provider]` block
    pub fn schema() -> Schema {
        ProviderConfig::schema()
    }

    /// Configure from the `[provider]` block, falling back to the environment
    pub fn configure(&mut self, attrs: &Attributes) -> Diagnostics {
        self.configure_with(attrs, |key| std::env::var(key).ok())
    }

    /// Configure with an injected environment lookup
    ///
    /// On failure the provider stays unconfigured and every resource call
    /// short-circuits.
    pub fn configure_with<F>(&mut self, attrs: &Attributes, env: F) -> Diagnostics
    where
        F: Fn(&str) -> Option<String>,
    {
        self.client = None;

        let mut diags = Self::schema().validate(attrs);
        if diags.has_errors() {
            return diags;
        }

        match ProviderConfig::resolve_with(attrs, env) {
            Ok(config) => {
                log::info!("Configured Hasura provider for {}", config.base_url());
                self.client = Some(AdminClient::new(config));
            }
            Err(e) => {
                let category = e.category();
                diags.push(Diagnostic::error(
                    "Unable to configure Hasura provider",
                    format!("{e}. {}", category.advice()),
                ));
            }
        }
        diags
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Handler for `hasura_remote_schema` resources
    pub fn remote_schema(&self) -> RemoteSchemaResource {
        RemoteSchemaResource::new(self.client.clone())
    }
}
