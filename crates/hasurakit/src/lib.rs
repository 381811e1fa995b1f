//! # hasurakit
//!
//! Blocking client for the Hasura metadata admin API.
//!
//! This crate provides functionality for:
//! - Resolving the admin endpoint and secret from provider attributes and the environment
//! - Registering, updating, reloading and removing remote schemas
//! - Exporting metadata and looking up remote schemas by name
//!
//! ## Example
//!
//! ```no_run
//! use declarative::CallContext;
//! use hasurakit::{AdminClient, ProviderConfig, Secret};
//! use std::time::Duration;
//!
//! let config = ProviderConfig::new("https://hasura.example.com/v1/query", Secret::new("s3cret"));
//! let client = AdminClient::new(config);
//!
//! let ctx = CallContext::with_timeout(Duration::from_secs(30));
//! let schema = client.find_remote_schema(&ctx, "github").expect("lookup failed");
//! println!("{} -> {:?}", schema.name, schema.definition.url);
//! ```
//!
//! ## Testing
//!
//! [`transport::MockTransport`] records requests and replays scripted
//! responses, so handlers built on [`AdminClient`] can be tested offline.

#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;

pub use client::AdminClient;
pub use config::{ADMIN_SECRET_ENV, HOST_ENV, ProviderConfig, QUERY_PATH, Secret};
pub use error::{Error, ErrorCategory, Result};
pub use transport::{MockTransport, Transport};
pub use types::{
    AdminRequest, DEFAULT_TIMEOUT_SECONDS, ExportedDefinition, ExportedRemoteSchema, HeaderEntry,
    MetadataExport, RemoteSchemaArgs, RemoteSchemaDefinition, RequestType,
};
