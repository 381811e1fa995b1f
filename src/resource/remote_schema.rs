//! `hasura_remote_schema` resource

use super::{decode_failed, not_configured};
use declarative::schema::{get_bool, get_string_map, require_string};
use declarative::{
    AttributeKind, AttributeSchema, Attributes, CallContext, DecodeError, Diagnostic, Diagnostics,
    PlanResponse, ResourceHandler, Response, Schema, Value,
};
use hasurakit::{AdminClient, Error, RemoteSchemaArgs, RemoteSchemaDefinition};
use std::collections::BTreeMap;
use url::Url;

/// Resource type name as used in manifests and state
pub const TYPE_NAME: &str = "hasura_remote_schema";

/// Decoded resource attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSchema {
    pub name: String,
    pub url: String,
    pub forward_headers: bool,
    pub additional_headers: BTreeMap<String, String>,
}

impl RemoteSchema {
    /// Decode from attributes, failing on any unexpected shape
    pub fn decode(attrs: &Attributes) -> Result<Self, DecodeError> {
        Ok(Self {
            name: require_string(attrs, "name")?,
            url: require_string(attrs, "url")?,
            forward_headers: get_bool(attrs, "forward_headers")?.unwrap_or(false),
            additional_headers: get_string_map(attrs, "additional_headers")?.unwrap_or_default(),
        })
    }

    /// Arguments of `add_remote_schema` / `update_remote_schema`
    pub fn to_args(&self) -> RemoteSchemaArgs {
        RemoteSchemaArgs {
            name: self.name.clone(),
            definition: RemoteSchemaDefinition::new(
                &self.url,
                self.forward_headers,
                &self.additional_headers,
            ),
        }
    }
}

/// Handler for remote schema registrations
///
/// Holds the admin client of a configured provider, or nothing when
/// configuration failed; every call then fails without touching the
/// network.
#[derive(Debug, Clone)]
pub struct RemoteSchemaResource {
    client: Option<AdminClient>,
}

impl RemoteSchemaResource {
    pub fn new(client: Option<AdminClient>) -> Self {
        Self { client }
    }

    fn client(&self) -> Result<&AdminClient, Response> {
        self.client
            .as_ref()
            .ok_or_else(|| Response::failed(not_configured()))
    }
}

/// Remote schema URLs must be absolute http(s) URLs with a host
fn validate_url(url: &str, diags: &mut Diagnostics) {
    let problem = match Url::parse(url) {
        Err(e) => Some(e.to_string()),
        Ok(parsed) if !matches!(parsed.scheme(), "http" | "https") => {
            Some(format!("unsupported scheme \"{}\"", parsed.scheme()))
        }
        Ok(parsed) if parsed.host_str().is_none_or(str::is_empty) => Some("no host".to_string()),
        Ok(_) => None,
    };
    if let Some(problem) = problem {
        diags.error(
            "Invalid remote schema URL",
            format!("\"{url}\" must be an absolute http or https URL: {problem}"),
        );
    }
}

impl ResourceHandler for RemoteSchemaResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("name", AttributeSchema::required(AttributeKind::String))
            .with_attribute("url", AttributeSchema::required(AttributeKind::String))
            .with_attribute(
                "forward_headers",
                AttributeSchema::optional(AttributeKind::Bool).computed(),
            )
            .with_attribute(
                "additional_headers",
                AttributeSchema::optional(AttributeKind::StringMap).sensitive(),
            )
    }

    fn plan(&self, prior: Option<&Attributes>, proposed: &Attributes) -> PlanResponse {
        let mut diagnostics = self.schema().validate(proposed);
        let mut planned = proposed.clone();

        if proposed.get("forward_headers").is_none_or(Value::is_null) {
            planned.insert("forward_headers".to_string(), Value::Bool(false));
        }

        if let Some(Value::String(name)) = proposed.get("name")
            && name.trim().is_empty()
        {
            diagnostics.error("Invalid remote schema name", "name must not be empty");
        }
        if let Some(Value::String(url)) = proposed.get("url") {
            validate_url(url, &mut diagnostics);
        }

        if let (Some(Value::String(old)), Some(Value::String(new))) = (
            prior.and_then(|p| p.get("name")),
            proposed.get("name"),
        ) && old != new
        {
            diagnostics.warning(
                "Remote schema name cannot change",
                format!("\"{old}\" keeps its name; \"{new}\" is ignored on update"),
            );
            planned.insert("name".to_string(), Value::String(old.clone()));
        }

        PlanResponse {
            planned,
            diagnostics,
        }
    }

    fn create(&self, ctx: &CallContext, planned: &Attributes) -> Response {
        let client = match self.client() {
            Ok(c) => c,
            Err(response) => return response,
        };
        let schema = match RemoteSchema::decode(planned) {
            Ok(s) => s,
            Err(e) => return Response::failed(decode_failed(&e)),
        };

        match client.add_remote_schema(ctx, schema.to_args()) {
            Ok(()) => {
                log::info!("Registered remote schema {}", schema.name);
                Response::set(planned.clone())
            }
            Err(e) => Response::failed(Diagnostic::error(
                "Error registering remote schema",
                e.to_string(),
            )),
        }
    }

    fn read(&self, ctx: &CallContext, current: &Attributes) -> Response {
        let client = match self.client() {
            Ok(c) => c,
            Err(response) => return response,
        };
        let name = match require_string(current, "name") {
            Ok(n) => n,
            Err(e) => return Response::failed(decode_failed(&e)),
        };

        let found = match client.find_remote_schema(ctx, &name) {
            Ok(found) => found,
            Err(Error::RemoteSchemaNotFound(_)) => {
                return Response::failed(Diagnostic::error(
                    format!("Remote schema '{name}' does not exist"),
                    "It may have been removed outside of this provider; the stored state was kept",
                ));
            }
            Err(e) => {
                return Response::failed(Diagnostic::error(
                    format!("Error reading remote schema '{name}'"),
                    e.to_string(),
                ));
            }
        };

        let mut state = current.clone();
        match found.definition.url {
            Some(url) => {
                state.insert("url".to_string(), Value::String(url));
            }
            None => log::debug!("Remote schema {name} has no literal url, keeping stored value"),
        }
        state.insert(
            "forward_headers".to_string(),
            Value::Bool(found.definition.forward_client_headers),
        );
        Response::set(state)
    }

    fn update(&self, ctx: &CallContext, prior: &Attributes, planned: &Attributes) -> Response {
        let client = match self.client() {
            Ok(c) => c,
            Err(response) => return response,
        };
        let prior_name = match require_string(prior, "name") {
            Ok(n) => n,
            Err(e) => return Response::failed(decode_failed(&e)),
        };
        let mut schema = match RemoteSchema::decode(planned) {
            Ok(s) => s,
            Err(e) => return Response::failed(decode_failed(&e)),
        };

        // Names are the admin API's key and never change
        schema.name = prior_name;

        if let Err(e) = client.update_remote_schema(ctx, schema.to_args()) {
            return Response::failed(Diagnostic::error(
                "Error updating remote schema",
                e.to_string(),
            ));
        }

        if let Err(e) = client.reload_remote_schema(ctx, &schema.name) {
            return Response::failed(Diagnostic::error(
                "Error reloading remote schema",
                format!(
                    "remote schema '{}' was updated but not reloaded; the stored state was kept: {e}",
                    schema.name
                ),
            ));
        }

        let mut state = planned.clone();
        state.insert("name".to_string(), Value::String(schema.name));
        Response::set(state)
    }

    fn delete(&self, ctx: &CallContext, current: &Attributes) -> Response {
        let client = match self.client() {
            Ok(c) => c,
            Err(response) => return response,
        };
        let name = match require_string(current, "name") {
            Ok(n) => n,
            Err(e) => return Response::failed(decode_failed(&e)),
        };

        match client.remove_remote_schema(ctx, &name) {
            Ok(()) => {
                log::info!("Removed remote schema {name}");
                Response::removed()
            }
            Err(e) => Response::failed(Diagnostic::error(
                "Error deleting remote schema",
                e.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{CancelToken, StateChange};
    use hasurakit::{MockTransport, ProviderConfig, Secret};
    use serde_json::json;
    use std::sync::Arc;

    const GITHUB_METADATA: &str = r#"{"remote_schemas":[{"name":"github","definition":{"url":"https://api.github.com/graphql","forward_client_headers":true,"timeout_seconds":30}}]}"#;

    fn handler() -> (RemoteSchemaResource, MockTransport) {
        let mock = MockTransport::new();
        let config = ProviderConfig::new("http://hasura:8080/v1/query", Secret::new("s3cret"));
        let client = AdminClient::with_transport(config, Arc::new(mock.clone()));
        (RemoteSchemaResource::new(Some(client)), mock)
    }

    fn github() -> Attributes {
        Attributes::from([
            ("name".to_string(), Value::from("github")),
            ("url".to_string(), Value::from("https://api.github.com/graphql")),
            ("forward_headers".to_string(), Value::from(true)),
        ])
    }

    fn with_headers(mut attrs: Attributes) -> Attributes {
        attrs.insert(
            "additional_headers".to_string(),
            Value::string_map([("Authorization", "Bearer t")]),
        );
        attrs
    }

    fn ctx() -> CallContext {
        CallContext::new()
    }

    fn single_error(response: &Response) -> &Diagnostic {
        assert_eq!(response.diagnostics.len(), 1, "{:?}", response.diagnostics);
        let diag = response.diagnostics.iter().next().unwrap();
        assert!(diag.is_error());
        diag
    }

    #[test]
    fn test_create_echoes_input() {
        let (handler, mock) = handler();
        let planned = with_headers(github());

        let response = handler.create(&ctx(), &planned);
        assert!(response.is_success());
        assert_eq!(response.state, StateChange::Set(planned));

        let sent = &mock.requests()[0];
        assert_eq!(sent.request.header("X-Hasura-Admin-Secret"), Some("s3cret"));
        assert_eq!(
            sent.json(),
            json!({
                "type": "add_remote_schema",
                "args": {
                    "name": "github",
                    "definition": {
                        "url": "https://api.github.com/graphql",
                        "forward_client_headers": true,
                        "timeout_seconds": 30,
                        "headers": [{"name": "Authorization", "value": "Bearer t"}]
                    }
                }
            })
        );
    }

    #[test]
    fn test_create_non_200_reports_body() {
        let (handler, mock) = handler();
        mock.respond(400, r#"{"error":"remote schema with name \"github\" already exists"}"#);

        let response = handler.create(&ctx(), &github());
        assert_eq!(response.state, StateChange::Unchanged);
        let diag = single_error(&response);
        assert_eq!(diag.summary, "Error registering remote schema");
        assert!(diag.detail.contains("already exists"));
        assert!(diag.detail.contains("400"));
    }

    #[test]
    fn test_create_transport_failure() {
        let (handler, mock) = handler();
        mock.fail("connection refused");
        let response = handler.create(&ctx(), &github());
        assert_eq!(response.reconcile(None), None);
        assert!(single_error(&response).detail.contains("connection refused"));
    }

    #[test]
    fn test_read_overwrites_url_and_forward_headers_only() {
        let (handler, mock) = handler();
        mock.respond_ok(
            r#"{"remote_schemas":[
                {"name":"other","definition":{"url":"https://other.io","timeout_seconds":30}},
                {"name":"github","definition":{"url":"https://new.github.com/graphql","forward_client_headers":false,"timeout_seconds":30}}
            ]}"#,
        );
        let current = with_headers(github());

        let response = handler.read(&ctx(), &current);
        let StateChange::Set(state) = response.state else {
            panic!("expected new state, got {:?}", response.state);
        };
        assert_eq!(state["url"], Value::from("https://new.github.com/graphql"));
        assert_eq!(state["forward_headers"], Value::from(false));
        assert_eq!(state["name"], current["name"]);
        assert_eq!(state["additional_headers"], current["additional_headers"]);
        assert_eq!(mock.request_types(), vec!["export_metadata".to_string()]);
        assert_eq!(mock.requests()[0].json()["version"], 1);
    }

    #[test]
    fn test_read_missing_keeps_state() {
        let (handler, mock) = handler();
        mock.respond_ok(r#"{"remote_schemas":[]}"#);
        let current = github();

        let response = handler.read(&ctx(), &current);
        let diag = single_error(&response);
        assert_eq!(diag.summary, "Remote schema 'github' does not exist");
        assert_eq!(response.reconcile(Some(current.clone())), Some(current));
    }

    #[test]
    fn test_read_decode_failure() {
        let (handler, mock) = handler();
        mock.respond_ok("not json");
        let response = handler.read(&ctx(), &github());
        assert!(single_error(&response).detail.contains("decode"));
        assert_eq!(response.state, StateChange::Unchanged);
    }

    #[test]
    fn test_read_url_from_env_keeps_stored_url() {
        let (handler, mock) = handler();
        mock.respond_ok(
            r#"{"remote_schemas":[{"name":"github","definition":{"url_from_env":"GITHUB_URL","forward_client_headers":true}}]}"#,
        );
        let response = handler.read(&ctx(), &github());
        assert_eq!(response.state, StateChange::Set(github()));
    }

    #[test]
    fn test_update_sends_prior_name_then_reloads() {
        let (handler, mock) = handler();
        let prior = github();
        let mut planned = github();
        planned.insert("name".to_string(), Value::from("renamed"));
        planned.insert("url".to_string(), Value::from("https://v2.github.com/graphql"));

        let response = handler.update(&ctx(), &prior, &planned);
        assert!(response.is_success());

        let requests = mock.requests();
        assert_eq!(
            mock.request_types(),
            vec!["update_remote_schema".to_string(), "reload_remote_schema".to_string()]
        );
        assert_eq!(requests[0].json()["args"]["name"], "github");
        assert_eq!(
            requests[0].json()["args"]["definition"]["url"],
            "https://v2.github.com/graphql"
        );
        assert_eq!(requests[1].json()["args"], json!({"name": "github"}));

        let StateChange::Set(state) = response.state else {
            panic!("expected new state");
        };
        assert_eq!(state["name"], Value::from("github"));
        assert_eq!(state["url"], Value::from("https://v2.github.com/graphql"));
    }

    #[test]
    fn test_update_failure_skips_reload() {
        let (handler, mock) = handler();
        mock.respond(500, "internal error");

        let response = handler.update(&ctx(), &github(), &github());
        assert_eq!(single_error(&response).summary, "Error updating remote schema");
        assert_eq!(mock.request_types(), vec!["update_remote_schema".to_string()]);
        assert_eq!(response.state, StateChange::Unchanged);
    }

    #[test]
    fn test_reload_failure_keeps_prior_state() {
        let (handler, mock) = handler();
        mock.respond_ok(r#"{"message":"success"}"#)
            .respond(400, r#"{"error":"schema fetch failed"}"#);
        let prior = github();
        let mut planned = github();
        planned.insert("url".to_string(), Value::from("https://v2.github.com/graphql"));

        let response = handler.update(&ctx(), &prior, &planned);
        let diag = single_error(&response);
        assert_eq!(diag.summary, "Error reloading remote schema");
        assert!(diag.detail.contains("updated but not reloaded"));
        assert!(diag.detail.contains("schema fetch failed"));
        assert_eq!(response.reconcile(Some(prior.clone())), Some(prior));
    }

    #[test]
    fn test_delete() {
        let (handler, mock) = handler();
        let response = handler.delete(&ctx(), &github());
        assert_eq!(response.reconcile(Some(github())), None);
        assert_eq!(
            mock.requests()[0].json(),
            json!({"type": "remove_remote_schema", "args": {"name": "github"}})
        );
    }

    #[test]
    fn test_delete_non_200_keeps_state() {
        let (handler, mock) = handler();
        mock.respond(404, r#"{"error":"not found"}"#);
        let response = handler.delete(&ctx(), &github());
        assert_eq!(single_error(&response).summary, "Error deleting remote schema");
        assert_eq!(response.reconcile(Some(github())), Some(github()));
    }

    #[test]
    fn test_github_round_trip() {
        let (handler, mock) = handler();
        mock.respond_ok(r#"{"message":"success"}"#)
            .respond_ok(GITHUB_METADATA)
            .respond_ok(r#"{"message":"success"}"#);
        let input = github();

        let created = handler.create(&ctx(), &input).reconcile(None);
        assert_eq!(created, Some(input.clone()));

        let read = handler
            .read(&ctx(), &input)
            .reconcile(created.clone());
        assert_eq!(read, created);

        let deleted = handler.delete(&ctx(), &input).reconcile(read);
        assert_eq!(deleted, None);
    }

    #[test]
    fn test_unconfigured_short_circuits() {
        let handler = RemoteSchemaResource::new(None);
        for response in [
            handler.create(&ctx(), &github()),
            handler.read(&ctx(), &github()),
            handler.update(&ctx(), &github(), &github()),
            handler.delete(&ctx(), &github()),
        ] {
            assert_eq!(single_error(&response).summary, "Provider not configured");
        }
    }

    #[test]
    fn test_cancelled_call_sends_nothing() {
        let (handler, mock) = handler();
        let token = CancelToken::new();
        token.cancel();
        let ctx = CallContext::new().with_cancel_token(token);

        let response = handler.delete(&ctx, &github());
        assert!(single_error(&response).detail.contains("cancelled"));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_bad_header_value_fails_closed() {
        let (handler, mock) = handler();
        let mut planned = github();
        planned.insert(
            "additional_headers".to_string(),
            Value::Map(BTreeMap::from([("X-Count".to_string(), Value::from(true))])),
        );

        let response = handler.create(&ctx(), &planned);
        assert!(single_error(&response).detail.contains("additional_headers.X-Count"));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_plan_fills_default_and_validates() {
        let (handler, _) = handler();
        let mut proposed = github();
        proposed.remove("forward_headers");

        let response = handler.plan(None, &proposed);
        assert!(response.diagnostics.is_empty());
        assert_eq!(response.planned["forward_headers"], Value::from(false));

        proposed.insert("url".to_string(), Value::from("ftp://nope"));
        proposed.insert("name".to_string(), Value::from(" "));
        proposed.insert("colour".to_string(), Value::from("red"));
        let response = handler.plan(None, &proposed);
        assert_eq!(response.diagnostics.error_count(), 3);
    }

    #[test]
    fn test_plan_rejects_malformed_urls() {
        let (handler, _) = handler();
        for bad in [
            "https://:80",
            "https:// ",
            "http://a b c",
            "https://?x=1",
            "https://#frag",
            "api.github.com/graphql",
        ] {
            let mut proposed = github();
            proposed.insert("url".to_string(), Value::from(bad));
            let response = handler.plan(None, &proposed);
            assert_eq!(response.diagnostics.error_count(), 1, "{bad} accepted");
        }

        let mut proposed = github();
        proposed.insert("url".to_string(), Value::from("http://10.0.0.5:4000/graphql"));
        assert!(handler.plan(None, &proposed).diagnostics.is_empty());
    }

    #[test]
    fn test_plan_keeps_prior_name() {
        let (handler, _) = handler();
        let mut proposed = github();
        proposed.insert("name".to_string(), Value::from("renamed"));

        let response = handler.plan(Some(&github()), &proposed);
        assert!(!response.diagnostics.has_errors());
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.planned["name"], Value::from("github"));
    }

    #[test]
    fn test_schema_marks_headers_sensitive() {
        let (handler, _) = handler();
        let schema = handler.schema();
        assert_eq!(
            schema.sensitive_attributes().collect::<Vec<_>>(),
            vec!["additional_headers"]
        );
        assert!(schema.attributes["forward_headers"].computed);
    }
}
