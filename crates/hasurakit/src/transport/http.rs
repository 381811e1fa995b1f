//! HTTP transport backed by `ureq`.
//!
//! Non-200 statuses are returned as responses rather than errors so the
//! caller can put the body text into its diagnostic. The body is always
//! read to the end, which returns the connection to the agent's pool.
//! Bytes that are not UTF-8 (proxy error pages) are replaced, never fatal.

use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpResponse, Transport};
use std::time::Duration;

/// Maximum response size (metadata exports of large projects included).
const MAX_BODY_SIZE: u64 = 64 * 1024 * 1024;

/// Blocking HTTP transport.
///
/// No timeout is set on the agent itself; per-call timeouts come from
/// the caller's deadline.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Create a transport with a fresh agent.
    #[must_use]
    pub fn new() -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .user_agent(concat!("hasurakit/", env!("CARGO_PKG_VERSION")))
            .build()
            .into();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn post(&self, request: &HttpRequest, timeout: Option<Duration>) -> Result<HttpResponse> {
        let mut builder = self.agent.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = timeout {
            builder = builder.config().timeout_global(Some(timeout)).build();
        }

        let mut response = builder.send(request.body.as_slice())?;
        let status = response.status().as_u16();

        let bytes = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_SIZE)
            .read_to_vec()
            .map_err(|e| Error::transport(format!("failed to read response body: {e}")))?;

        Ok(HttpResponse {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ADMIN_SECRET_HEADER;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one request, answer with `status`/`body`, return what was received.
    fn one_shot_server(status: u16, body: &'static [u8]) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/v1/query", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':')
                    && name.eq_ignore_ascii_case("content-length")
                {
                    content_length = value.trim().parse().unwrap();
                }
                head.push_str(&line);
            }
            let mut payload = vec![0u8; content_length];
            reader.read_exact(&mut payload).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )
            .unwrap();
            stream.write_all(body).unwrap();
            stream.flush().unwrap();

            format!("{head}\r\n{}", String::from_utf8_lossy(&payload))
        });

        (url, handle)
    }

    #[test]
    fn test_post_sends_headers_and_body() {
        let (url, server) = one_shot_server(200, br#"{"message":"success"}"#);
        let transport = UreqTransport::new();
        let request = HttpRequest::json(url, br#"{"type":"reload_remote_schema"}"#.to_vec())
            .with_header(ADMIN_SECRET_HEADER, "s3cret");

        let response = transport
            .post(&request, Some(Duration::from_secs(10)))
            .unwrap();
        assert_eq!(response, HttpResponse::new(200, r#"{"message":"success"}"#));

        let received = server.join().unwrap().to_ascii_lowercase();
        assert!(received.starts_with("post /v1/query"));
        assert!(received.contains("x-hasura-admin-secret: s3cret"));
        assert!(received.contains("content-type: application/json"));
        assert!(received.ends_with(r#"{"type":"reload_remote_schema"}"#));
    }

    #[test]
    fn test_error_status_is_a_response() {
        let (url, server) = one_shot_server(400, br#"{"error":"not found"}"#);
        let transport = UreqTransport::new();

        let response = transport
            .post(&HttpRequest::json(url, b"{}".to_vec()), None)
            .unwrap();
        assert_eq!(response.status, 400);
        assert_eq!(response.body, r#"{"error":"not found"}"#);
        server.join().unwrap();
    }

    #[test]
    fn test_non_utf8_error_body_keeps_status() {
        let (url, server) = one_shot_server(502, b"bad \xff\xfe gateway");
        let transport = UreqTransport::new();

        let response = transport
            .post(&HttpRequest::json(url, b"{}".to_vec()), Some(Duration::from_secs(10)))
            .unwrap();
        assert_eq!(response.status, 502);
        assert!(response.body.starts_with("bad "));
        assert!(response.body.ends_with(" gateway"));
        assert!(response.body.contains('\u{FFFD}'));
        server.join().unwrap();
    }

    #[test]
    fn test_connection_refused_is_transport_error() {
        // Bind then drop to get a port nothing listens on
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let transport = UreqTransport::new();
        let result = transport.post(
            &HttpRequest::json(format!("http://127.0.0.1:{port}/v1/query"), b"{}".to_vec()),
            Some(Duration::from_secs(5)),
        );
        assert!(matches!(result, Err(Error::Transport { .. })));
    }
}
