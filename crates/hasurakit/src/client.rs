//! Admin API client.
//!
//! Every operation is a single JSON POST to the configured endpoint,
//! authenticated with the admin secret header. Only status `200` counts
//! as success; any other status becomes [`Error::Status`] carrying the
//! response body.
//!
//! Requests run on a worker thread while the caller watches its
//! [`CallContext`]. Cancelling the context returns
//! [`Error::Interrupted`] right away; the abandoned request is left to
//! finish or hit its timeout on the worker.

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::transport::http::UreqTransport;
use crate::transport::{ADMIN_SECRET_HEADER, HttpRequest, HttpResponse, Transport};
use crate::types::{AdminRequest, ExportedRemoteSchema, MetadataExport, RemoteSchemaArgs};
use declarative::CallContext;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// How often a pending request looks at the call context.
const INTERRUPT_POLL: Duration = Duration::from_millis(50);

/// Client for the Hasura metadata admin API.
///
/// Cheap to clone; clones share the same transport.
#[derive(Clone)]
pub struct AdminClient {
    config: ProviderConfig,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AdminClient {
    /// Create a client that talks HTTP through `ureq`.
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_transport(config, Arc::new(UreqTransport::new()))
    }

    /// Create a client with a custom transport (for testing).
    pub fn with_transport(config: ProviderConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Send one admin request and return the raw response.
    ///
    /// Non-200 responses are returned as-is; see [`Self::execute_ok`].
    pub fn execute(&self, ctx: &CallContext, request: &AdminRequest) -> Result<HttpResponse> {
        ctx.check()?;

        let body = serde_json::to_vec(request)?;
        let http = HttpRequest::json(self.config.base_url(), body)
            .with_header(ADMIN_SECRET_HEADER, self.config.admin_secret().expose());

        log::debug!(
            "POST {} ({})",
            self.config.base_url(),
            request.kind.as_str()
        );
        let response = self.post(ctx, http)?;

        if !response.is_ok() {
            log::warn!(
                "{} returned status {}",
                request.kind.as_str(),
                response.status
            );
        }
        Ok(response)
    }

    /// POST on a worker thread, giving up as soon as `ctx` is interrupted.
    fn post(&self, ctx: &CallContext, request: HttpRequest) -> Result<HttpResponse> {
        let transport = Arc::clone(&self.transport);
        let timeout = ctx.remaining();
        let (tx, rx) = mpsc::sync_channel(1);

        thread::Builder::new()
            .name("hasurakit-request".to_string())
            .spawn(move || {
                // Fails only when the caller stopped waiting
                let _ = tx.send(transport.post(&request, timeout));
            })
            .map_err(|e| Error::transport(format!("failed to start request: {e}")))?;

        loop {
            match rx.recv_timeout(INTERRUPT_POLL) {
                Ok(result) => return result,
                Err(RecvTimeoutError::Timeout) => {
                    if let Err(interrupted) = ctx.check() {
                        log::debug!("Abandoning in-flight request: {interrupted}");
                        return Err(interrupted.into());
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::transport("request worker exited without a reply"));
                }
            }
        }
    }

    /// Send one admin request, failing on any status other than `200`.
    pub fn execute_ok(&self, ctx: &CallContext, request: &AdminRequest) -> Result<HttpResponse> {
        let response = self.execute(ctx, request)?;
        if response.is_ok() {
            Ok(response)
        } else {
            Err(Error::Status {
                status: response.status,
                body: response.body,
            })
        }
    }

    /// Register a new remote schema.
    pub fn add_remote_schema(&self, ctx: &CallContext, args: RemoteSchemaArgs) -> Result<()> {
        self.execute_ok(ctx, &AdminRequest::add_remote_schema(args))
            .map(drop)
    }

    /// Replace the definition of an existing remote schema.
    pub fn update_remote_schema(&self, ctx: &CallContext, args: RemoteSchemaArgs) -> Result<()> {
        self.execute_ok(ctx, &AdminRequest::update_remote_schema(args))
            .map(drop)
    }

    /// Ask Hasura to refetch the remote schema's GraphQL schema.
    pub fn reload_remote_schema(&self, ctx: &CallContext, name: &str) -> Result<()> {
        self.execute_ok(ctx, &AdminRequest::reload_remote_schema(name))
            .map(drop)
    }

    pub fn remove_remote_schema(&self, ctx: &CallContext, name: &str) -> Result<()> {
        self.execute_ok(ctx, &AdminRequest::remove_remote_schema(name))
            .map(drop)
    }

    /// Export the full metadata document.
    pub fn export_metadata(&self, ctx: &CallContext) -> Result<MetadataExport> {
        let response = self.execute_ok(ctx, &AdminRequest::export_metadata())?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Find a remote schema by name in the exported metadata.
    pub fn find_remote_schema(&self, ctx: &CallContext, name: &str) -> Result<ExportedRemoteSchema> {
        let export = self.export_metadata(ctx)?;
        export
            .remote_schema(name)
            .cloned()
            .ok_or_else(|| Error::RemoteSchemaNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;
    use crate::error::ErrorCategory;
    use crate::transport::MockTransport;
    use crate::types::RemoteSchemaDefinition;
    use declarative::{CancelToken, Interrupted};
    use std::collections::BTreeMap;
    use std::time::Duration;

    const METADATA: &str = r#"{
        "version": 2,
        "remote_schemas": [
            {"name": "other", "definition": {"url": "https://other.io/graphql", "timeout_seconds": 30}},
            {"name": "github", "definition": {"url": "https://api.github.com/graphql", "forward_client_headers": true, "timeout_seconds": 30}}
        ]
    }"#;

    fn client() -> (AdminClient, MockTransport) {
        let mock = MockTransport::new();
        let config = ProviderConfig::new("http://hasura:8080/v1/query", Secret::new("s3cret"));
        (
            AdminClient::with_transport(config, Arc::new(mock.clone())),
            mock,
        )
    }

    fn github_args() -> RemoteSchemaArgs {
        RemoteSchemaArgs {
            name: "github".into(),
            definition: RemoteSchemaDefinition::new(
                "https://api.github.com/graphql",
                true,
                &BTreeMap::new(),
            ),
        }
    }

    #[test]
    fn test_execute_sets_url_and_headers() {
        let (client, mock) = client();
        client
            .add_remote_schema(&CallContext::new(), github_args())
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        let sent = &requests[0].request;
        assert_eq!(sent.url, "http://hasura:8080/v1/query");
        assert_eq!(sent.header(ADMIN_SECRET_HEADER), Some("s3cret"));
        assert_eq!(sent.header("Content-Type"), Some("application/json"));
        assert_eq!(requests[0].json()["args"]["name"], "github");
    }

    #[test]
    fn test_non_200_is_status_error_with_body() {
        let (client, mock) = client();
        mock.respond(400, r#"{"error":"remote schema already exists"}"#);

        let err = client
            .add_remote_schema(&CallContext::new(), github_args())
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_non_200_from_execute_is_not_an_error() {
        let (client, mock) = client();
        mock.respond(500, "boom");
        let response = client
            .execute(&CallContext::new(), &AdminRequest::reload_remote_schema("x"))
            .unwrap();
        assert_eq!(response.status, 500);
    }

    #[test]
    fn test_transport_failure() {
        let (client, mock) = client();
        mock.fail("connection refused");
        let err = client
            .remove_remote_schema(&CallContext::new(), "github")
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Transport);
    }

    #[test]
    fn test_cancelled_context_sends_nothing() {
        let (client, mock) = client();
        let token = CancelToken::new();
        token.cancel();
        let ctx = CallContext::new().with_cancel_token(token);

        let err = client.reload_remote_schema(&ctx, "github").unwrap_err();
        assert!(matches!(err, Error::Interrupted(Interrupted::Cancelled)));
        assert!(mock.requests().is_empty());
    }

    /// Transport that holds every request until `hold` elapses.
    struct SlowTransport {
        hold: Duration,
    }

    impl Transport for SlowTransport {
        fn post(&self, _: &HttpRequest, _: Option<Duration>) -> Result<HttpResponse> {
            std::thread::sleep(self.hold);
            Ok(HttpResponse::new(200, "{}"))
        }
    }

    fn slow_client(hold: Duration) -> AdminClient {
        let config = ProviderConfig::new("http://hasura:8080/v1/query", Secret::new("s3cret"));
        AdminClient::with_transport(config, Arc::new(SlowTransport { hold }))
    }

    #[test]
    fn test_cancel_aborts_in_flight_request() {
        let client = slow_client(Duration::from_secs(4));
        let token = CancelToken::new();
        let ctx = CallContext::new().with_cancel_token(token.clone());

        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            token.cancel();
        });

        let started = std::time::Instant::now();
        let err = client.reload_remote_schema(&ctx, "github").unwrap_err();
        canceller.join().unwrap();

        assert!(matches!(err, Error::Interrupted(Interrupted::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_deadline_aborts_in_flight_request() {
        let client = slow_client(Duration::from_secs(4));
        let ctx = CallContext::with_timeout(Duration::from_millis(200));

        let started = std::time::Instant::now();
        let err = client.remove_remote_schema(&ctx, "github").unwrap_err();
        assert!(matches!(
            err,
            Error::Interrupted(Interrupted::DeadlineExceeded)
        ));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_slow_request_completes_when_not_interrupted() {
        let client = slow_client(Duration::from_millis(150));
        client
            .reload_remote_schema(&CallContext::new(), "github")
            .unwrap();
    }

    #[test]
    fn test_deadline_forwarded_as_timeout() {
        let (client, mock) = client();
        client
            .reload_remote_schema(&CallContext::with_timeout(Duration::from_secs(60)), "github")
            .unwrap();
        client
            .reload_remote_schema(&CallContext::new(), "github")
            .unwrap();

        let requests = mock.requests();
        let timeout = requests[0].timeout.unwrap();
        assert!(timeout <= Duration::from_secs(60));
        assert!(timeout > Duration::from_secs(50));
        assert_eq!(requests[1].timeout, None);
    }

    #[test]
    fn test_find_remote_schema_scans_by_name() {
        let (client, mock) = client();
        mock.respond_ok(METADATA);

        let found = client
            .find_remote_schema(&CallContext::new(), "github")
            .unwrap();
        assert_eq!(found.name, "github");
        assert_eq!(
            found.definition.url.as_deref(),
            Some("https://api.github.com/graphql")
        );
        assert_eq!(mock.request_types(), vec!["export_metadata".to_string()]);
    }

    #[test]
    fn test_find_remote_schema_missing() {
        let (client, mock) = client();
        mock.respond_ok(METADATA);
        let err = client
            .find_remote_schema(&CallContext::new(), "absent")
            .unwrap_err();
        assert!(matches!(err, Error::RemoteSchemaNotFound(ref n) if n == "absent"));
    }

    #[test]
    fn test_export_metadata_bad_body() {
        let (client, mock) = client();
        mock.respond_ok("<html>not json</html>");
        let err = client.export_metadata(&CallContext::new()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Decode);
    }

    #[test]
    fn test_debug_hides_secret() {
        let (client, _) = client();
        assert!(!format!("{client:?}").contains("s3cret"));
    }
}
