//! HTTP client for the energy-controller REST API.
//!
//! - Blocking client using `ureq` (no async).
//! - Every request reads the shared session and attaches `Authorization: Bearer <token>`
//!   when a token is present. Nothing is cached between requests.
//! - No retries, no reshaping of errors: transport failures and non-2xx responses reach
//!   the caller with status and body intact.
//!
//! Endpoint methods live next to their models in `crate::api::*`.

use http::{Method, Request, Response, StatusCode, header};
use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::session::SharedSession;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

#[derive(Debug)]
pub enum ClientError {
    Transport(String),
    /// Non-2xx response. `body` is the parsed JSON body, or the raw text as a JSON string.
    Http { status: StatusCode, body: Value },
    Decode(serde_path_to_error::Error<serde_json::Error>),
    Encode(serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The backend's `{"error": "..."}` message, when the response carried one.
    pub fn api_error(&self) -> Option<&str> {
        match self {
            ClientError::Http { body, .. } => body.get("error").and_then(Value::as_str),
            _ => None,
        }
    }
}

impl core::fmt::Display for ClientError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ClientError::Transport(s) => write!(f, "transport error: {}", s),
            ClientError::Http { status, body } => match body.get("error").and_then(Value::as_str) {
                Some(msg) => write!(f, "http {}: {}", status.as_u16(), msg),
                None => write!(f, "http {}: {}", status.as_u16(), body),
            },
            ClientError::Decode(e) => write!(f, "json decode error at {}: {}", e.path(), e.inner()),
            ClientError::Encode(e) => write!(f, "json encode error: {}", e),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Decode(e) => Some(e.inner()),
            ClientError::Encode(e) => Some(e),
            _ => None,
        }
    }
}

/// Sends one fully-built request and returns the response whatever its status.
pub trait Transport {
    fn execute(&self, request: Request<Vec<u8>>) -> Result<Response<String>, ClientError>;
}

pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        // Status handling happens in ApiClient so error bodies survive.
        let config = ureq::Agent::config_builder().http_status_as_error(false).build();
        UreqTransport {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: Request<Vec<u8>>) -> Result<Response<String>, ClientError> {
        let result = if request.body().is_empty() {
            self.agent.run(request.map(|_| ()))
        } else {
            self.agent.run(request)
        };
        let response = result.map_err(|e| ClientError::Transport(e.to_string()))?;
        let (parts, mut body) = response.into_parts();
        let text = body
            .read_to_string()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Response::from_parts(parts, text))
    }
}

pub struct ApiClient {
    base_url: String,
    transport: Box<dyn Transport>,
    session: SharedSession,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: SharedSession) -> Self {
        Self::with_transport(base_url, session, Box::new(UreqTransport::new()))
    }

    pub fn with_transport(base_url: impl Into<String>, session: SharedSession, transport: Box<dyn Transport>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        ApiClient {
            base_url,
            transport,
            session,
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> String {
        let mut url = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        for (i, (k, v)) in query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&encode_query_component(k));
            url.push('=');
            url.push_str(&encode_query_component(v));
        }
        url
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Vec<u8>>,
    ) -> Result<String, ClientError> {
        let url = self.url(path, query);
        let mut builder = Request::builder()
            .method(method.clone())
            .uri(url.as_str())
            .header(header::ACCEPT, "application/json");
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }

        // Read the token fresh for every request; the borrow ends before the call.
        let bearer = self.session.borrow().bearer();
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = builder
            .body(body.unwrap_or_default())
            .map_err(|e| ClientError::Transport(format!("invalid request for {}: {}", url, e)))?;

        let response = self.transport.execute(request)?;
        let status = response.status();
        debug!("{} {} -> {}", method, url, status.as_u16());

        let text = response.into_body();
        if status.is_success() {
            Ok(text)
        } else {
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            Err(ClientError::Http { status, body })
        }
    }

    fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ClientError> {
        let de = &mut serde_json::Deserializer::from_str(text);
        serde_path_to_error::deserialize(de).map_err(ClientError::Decode)
    }

    fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>, ClientError> {
        serde_json::to_vec(body).map_err(ClientError::Encode)
    }

    pub(crate) fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ClientError> {
        let text = self.send(Method::GET, path, query, None)?;
        Self::decode(&text)
    }

    pub(crate) fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let text = self.send(Method::POST, path, &[], Some(Self::encode(body)?))?;
        Self::decode(&text)
    }

    /// POST whose response body is ignored.
    pub(crate) fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ClientError> {
        self.send(Method::POST, path, &[], Some(Self::encode(body)?))?;
        Ok(())
    }

    /// POST without a request body.
    pub(crate) fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let text = self.send(Method::POST, path, &[], None)?;
        Self::decode(&text)
    }

    pub(crate) fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let text = self.send(Method::PUT, path, &[], Some(Self::encode(body)?))?;
        Self::decode(&text)
    }

    pub(crate) fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send(Method::DELETE, path, &[], None)?;
        Ok(())
    }
}

fn encode_query_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn unauthenticated_requests_carry_no_authorization_header() {
        let (client, mock) = client();
        mock.respond(200, json!([]));
        let _: Vec<Value> = client.get_json("/devices", &[]).unwrap();
        assert_eq!(mock.last().authorization, None);
    }

    #[test]
    fn token_changes_apply_to_the_next_request() {
        let (client, mock) = client_with_token("first");
        mock.respond(200, json!([])).respond(200, json!([]));

        let _: Vec<Value> = client.get_json("/devices", &[]).unwrap();
        client.session().borrow_mut().set_token_for_test("second");
        let _: Vec<Value> = client.get_json("/devices", &[]).unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer first"));
        assert_eq!(requests[1].authorization.as_deref(), Some("Bearer second"));
    }

    #[test]
    fn http_errors_keep_status_and_body() {
        let (client, mock) = client();
        mock.respond(401, json!({"error": "unauthorized"}));
        let err = client.get_json::<Value>("/auth/me", &[]).unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(err.api_error(), Some("unauthorized"));
    }

    #[test]
    fn non_json_error_bodies_are_kept_as_text() {
        let (client, mock) = client();
        mock.respond_raw(502, "Bad Gateway");
        match client.get_json::<Value>("/devices", &[]).unwrap_err() {
            ClientError::Http { status, body } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(body, Value::String("Bad Gateway".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn transport_errors_pass_through() {
        let (client, mock) = client();
        mock.fail_transport("Network error");
        let err = client.get_json::<Value>("/devices", &[]).unwrap_err();
        assert!(matches!(err, ClientError::Transport(ref m) if m == "Network error"));
        assert_eq!(err.api_error(), None);
    }

    #[test]
    fn decode_errors_report_the_field_path() {
        let (client, mock) = client();
        mock.respond(200, json!([{"id": 1, "user_id": 1, "name": 5}]));
        let err = client.get_json::<Vec<crate::models::energy::Device>>("/devices", &[]).unwrap_err();
        match err {
            ClientError::Decode(e) => assert_eq!(e.path().to_string(), "[0].name"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn query_values_are_percent_encoded() {
        assert_eq!(encode_query_component("a b&c"), "a%20b%26c");
        assert_eq!(encode_query_component("day"), "day");
    }
}
