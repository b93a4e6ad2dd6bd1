// API client module: a small blocking HTTP client that talks to the CBRAIN
// REST API. One request per call, no retries; every response body is decoded
// into a `serde_json::Value` because the server is the only schema authority.

mod files;
pub mod resource;
mod session;

pub use files::{ChangeProvider, TransferMode, UploadRequest};
pub use resource::{ListQuery, Pagination, ResourceApi, ResourceKind};
pub use session::LoginResponse;

use crate::credentials::Credentials;
use crate::error::{Error, Result};
use reqwest::blocking::multipart::Form;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Holds a reqwest blocking client, the server base URL and an optional API
/// token for authenticated calls.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

/// Body of a request, already encoded the way the endpoint expects.
pub(crate) enum Body<'a> {
    Empty,
    Json(&'a Value),
    Form(&'a [(&'a str, &'a str)]),
    Multipart(Form),
}

impl ApiClient {
    /// Anonymous client for `base_url`; only the session endpoint accepts it.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("cbrain-cli/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Client carrying the stored token of a logged-in session.
    pub fn authenticated(creds: &Credentials) -> Result<Self> {
        let mut api = Self::new(&creds.cbrain_url)?;
        api.set_token(&creds.api_token);
        Ok(api)
    }

    /// Store a token for subsequent authenticated requests.
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generic operations on one resource collection.
    pub fn resource(&self, kind: ResourceKind) -> ResourceApi<'_> {
        ResourceApi::new(self, kind)
    }

    /// Full URL for an API path such as `tags/3`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Accept header plus Authorization when a token is set.
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(t) = &self.token {
            let val = HeaderValue::from_str(&format!("Bearer {}", t))
                .map_err(|_| Error::Config("stored API token is not a valid header value".into()))?;
            headers.insert(AUTHORIZATION, val);
        }
        Ok(headers)
    }

    pub fn get<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<Value> {
        self.request(Method::GET, path, query, Body::Empty)
    }

    pub fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::POST, path, &[] as &[(&str, &str)], Body::Json(body))
    }

    pub fn put_json(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::PUT, path, &[] as &[(&str, &str)], Body::Json(body))
    }

    pub fn delete(&self, path: &str) -> Result<Value> {
        self.request(Method::DELETE, path, &[] as &[(&str, &str)], Body::Empty)
    }

    /// Issue one request and decode its JSON reply. An empty 2xx body
    /// decodes to `Value::Null`.
    pub(crate) fn request<Q: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &Q,
        body: Body<'_>,
    ) -> Result<Value> {
        let url = self.url(path);
        debug!(%method, %url, "sending request");
        let req = self
            .client
            .request(method, &url)
            .headers(self.headers()?)
            .query(query);
        let req = match body {
            Body::Empty => req,
            Body::Json(value) => req.json(value),
            Body::Form(fields) => req.form(fields),
            Body::Multipart(form) => req.multipart(form),
        };
        self.send(req)
    }

    fn send(&self, req: RequestBuilder) -> Result<Value> {
        let res = req.send().map_err(|source| Error::Transport {
            url: self.base_url.clone(),
            source,
        })?;
        let status = res.status();
        let text = res.text().map_err(|e| Error::Decode(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = text.len(), "received response");

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: error_message(&text, status.canonical_reason()),
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| Error::Decode(e.to_string()))
    }
}

/// Best human-readable message out of an error body: a JSON `notice`,
/// `error` or `message` field, else the raw text, else the status reason.
fn error_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for key in ["notice", "error", "message"] {
            match json.get(key) {
                Some(Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(Value::Array(items)) if !items.is_empty() => {
                    return items
                        .iter()
                        .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                        .collect::<Vec<_>>()
                        .join("; ")
                }
                _ => {}
            }
        }
        if !json.is_null() {
            return json.to_string();
        }
    }
    let body = body.trim();
    if body.is_empty() {
        reason.unwrap_or("Unknown error").to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Blocking-friendly wrapper around a wiremock server.

    use tokio::runtime::Runtime;
    use wiremock::{Mock, MockServer};

    pub struct TestServer {
        pub rt: Runtime,
        pub server: MockServer,
    }

    impl TestServer {
        pub fn start() -> Self {
            let rt = Runtime::new().unwrap();
            let server = rt.block_on(MockServer::start());
            TestServer { rt, server }
        }

        pub fn uri(&self) -> String {
            self.server.uri()
        }

        pub fn mount(&self, mock: Mock) {
            self.rt.block_on(mock.mount(&self.server));
        }

        pub fn received(&self) -> Vec<wiremock::Request> {
            self.rt
                .block_on(self.server.received_requests())
                .unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::TestServer;
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    fn client(server: &TestServer) -> ApiClient {
        let mut api = ApiClient::new(&server.uri()).unwrap();
        api.set_token("secret-token");
        api
    }

    #[test]
    fn url_building_normalizes_slashes() {
        let api = ApiClient::new("http://localhost:3000/").unwrap();
        assert_eq!(api.url("tags"), "http://localhost:3000/tags");
        assert_eq!(api.url("/tags/3"), "http://localhost:3000/tags/3");
    }

    #[test]
    fn get_sends_bearer_token_and_query() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("GET"))
                .and(path("/tags"))
                .and(header("authorization", "Bearer secret-token"))
                .and(query_param("page", "2"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}]))),
        );
        let value = client(&server).get("tags", &[("page", "2")]).unwrap();
        assert_eq!(value, json!([{"id": 1}]));
    }

    #[test]
    fn json_error_body_surfaces_notice() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("POST"))
                .and(path("/tags"))
                .respond_with(
                    ResponseTemplate::new(422).set_body_json(json!({"notice": "Name is taken"})),
                ),
        );
        let err = client(&server).post_json("tags", &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Request failed: HTTP 422 - Name is taken");
    }

    #[test]
    fn plain_text_error_falls_back_to_raw_body() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("GET"))
                .and(path("/tasks/1"))
                .respond_with(ResponseTemplate::new(500).set_body_string("boom")),
        );
        let err = client(&server).get("tasks/1", &[] as &[(&str, &str)]).unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().ends_with("boom"));
    }

    #[test]
    fn non_json_success_is_decode_error() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("GET"))
                .and(path("/tools"))
                .respond_with(ResponseTemplate::new(200).set_body_string("<html>")),
        );
        let err = client(&server).get("tools", &[] as &[(&str, &str)]).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn empty_success_body_is_null() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("DELETE"))
                .and(path("/tags/4"))
                .respond_with(ResponseTemplate::new(204)),
        );
        assert_eq!(client(&server).delete("tags/4").unwrap(), Value::Null);
    }

    #[test]
    fn unreachable_server_is_transport_error() {
        let api = ApiClient::new("http://127.0.0.1:1").unwrap();
        let err = api.get("tags", &[] as &[(&str, &str)]).unwrap_err();
        match err {
            Error::Transport { url, .. } => assert_eq!(url, "http://127.0.0.1:1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn error_message_prefers_known_keys() {
        assert_eq!(error_message(r#"{"error":"nope"}"#, None), "nope");
        assert_eq!(
            error_message(r#"{"message":["a","b"]}"#, None),
            "a; b"
        );
        assert_eq!(error_message("", Some("Not Found")), "Not Found");
        assert_eq!(error_message(r#"{"x":1}"#, None), r#"{"x":1}"#);
    }
}
