//! Request envelopes and response types of the metadata admin API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Timeout Hasura applies to calls forwarded to a remote schema.
pub const DEFAULT_TIMEOUT_SECONDS: u32 = 30;

/// Kind of admin API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    AddRemoteSchema,
    UpdateRemoteSchema,
    ReloadRemoteSchema,
    RemoveRemoteSchema,
    ExportMetadata,
}

impl RequestType {
    /// Wire name of the call.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddRemoteSchema => "add_remote_schema",
            Self::UpdateRemoteSchema => "update_remote_schema",
            Self::ReloadRemoteSchema => "reload_remote_schema",
            Self::RemoveRemoteSchema => "remove_remote_schema",
            Self::ExportMetadata => "export_metadata",
        }
    }
}

/// Envelope POSTed to the admin endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminRequest {
    #[serde(rename = "type")]
    pub kind: RequestType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    pub args: RequestArgs,
}

/// Operation-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestArgs {
    RemoteSchema(RemoteSchemaArgs),
    Name(NameArgs),
    Empty(EmptyArgs),
}

impl AdminRequest {
    pub fn add_remote_schema(args: RemoteSchemaArgs) -> Self {
        Self {
            kind: RequestType::AddRemoteSchema,
            version: None,
            args: RequestArgs::RemoteSchema(args),
        }
    }

    pub fn update_remote_schema(args: RemoteSchemaArgs) -> Self {
        Self {
            kind: RequestType::UpdateRemoteSchema,
            version: None,
            args: RequestArgs::RemoteSchema(args),
        }
    }

    pub fn reload_remote_schema(name: impl Into<String>) -> Self {
        Self {
            kind: RequestType::ReloadRemoteSchema,
            version: None,
            args: RequestArgs::Name(NameArgs { name: name.into() }),
        }
    }

    pub fn remove_remote_schema(name: impl Into<String>) -> Self {
        Self {
            kind: RequestType::RemoveRemoteSchema,
            version: None,
            args: RequestArgs::Name(NameArgs { name: name.into() }),
        }
    }

    /// Full metadata dump; the API has no lookup by remote schema name.
    pub fn export_metadata() -> Self {
        Self {
            kind: RequestType::ExportMetadata,
            version: Some(1),
            args: RequestArgs::Empty(EmptyArgs {}),
        }
    }
}

/// Arguments of `add_remote_schema` / `update_remote_schema`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSchemaArgs {
    pub name: String,
    pub definition: RemoteSchemaDefinition,
}

/// Arguments carrying only a remote schema name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameArgs {
    pub name: String,
}

/// Serializes as `{}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyArgs {}

/// Definition of a remote schema as sent to the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSchemaDefinition {
    pub url: String,
    pub forward_client_headers: bool,
    pub timeout_seconds: u32,
    pub headers: Vec<HeaderEntry>,
}

impl RemoteSchemaDefinition {
    /// Build a definition with the fixed timeout and flattened headers.
    pub fn new(
        url: impl Into<String>,
        forward_client_headers: bool,
        headers: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            url: url.into(),
            forward_client_headers,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            headers: headers_from_map(headers),
        }
    }
}

/// A single additional header sent by Hasura to the remote schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

/// Flatten a header map into name/value pairs.
///
/// The admin API does not treat header order as significant; the pairs
/// come out sorted by name.
pub fn headers_from_map(headers: &BTreeMap<String, String>) -> Vec<HeaderEntry> {
    headers
        .iter()
        .map(|(name, value)| HeaderEntry {
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}

/// Response of `export_metadata`, reduced to what remote schemas need.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MetadataExport {
    #[serde(default)]
    pub remote_schemas: Vec<ExportedRemoteSchema>,
}

impl MetadataExport {
    /// Linear scan for a remote schema by name.
    pub fn remote_schema(&self, name: &str) -> Option<&ExportedRemoteSchema> {
        self.remote_schemas.iter().find(|rs| rs.name == name)
    }
}

/// A remote schema entry of the metadata export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportedRemoteSchema {
    pub name: String,
    pub definition: ExportedDefinition,
}

/// Definition as exported; headers are not exposed in a reusable shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportedDefinition {
    /// Absent when the schema is configured through `url_from_env`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_from_env: Option<String>,
    #[serde(default)]
    pub forward_client_headers: bool,
    #[serde(default)]
    pub timeout_seconds: Option<u32>,
}
