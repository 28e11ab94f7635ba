//! Mock implementation of the `Transport` trait for testing.
//!
//! Records every request and answers from scripted responses, so tests can
//! assert on exactly what would have gone over the wire.

use async_trait::async_trait;
use paygate_client::{DispatchRequest, GatewayError, GatewayResult, Transport};
use paygate_types::constants::{FIELD_RESULT_CODE, FIELD_RETURN_CODE, STATUS_SUCCESS};
use paygate_types::FieldMap;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// One request seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// `POST` or `GET`.
    pub http_method: &'static str,
    pub url: String,
    /// Envelope bytes for POST; empty for GET.
    pub body: Vec<u8>,
    /// Query parameters for GET; empty for POST.
    pub query: Vec<(String, String)>,
    pub timeout: Duration,
    pub had_client_cert: bool,
}

impl RecordedRequest {
    /// Decode the posted envelope.
    pub fn fields(&self) -> FieldMap {
        paygate_wire::decode(&self.body).unwrap_or_default()
    }

    /// Query parameter by name.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Body(Vec<u8>),
    Error { code: Option<u16>, reason: String },
}

impl Reply {
    fn into_result(self) -> GatewayResult<Vec<u8>> {
        match self {
            Self::Body(body) => Ok(body),
            Self::Error { code, reason } => Err(GatewayError::transport(code, reason)),
        }
    }
}

struct MockTransportInner {
    /// Every request, in order.
    requests: Vec<RecordedRequest>,
    /// One-shot replies per URL, consumed before the fixed replies.
    queued: HashMap<String, VecDeque<Reply>>,
    /// Fixed reply per URL.
    fixed: HashMap<String, Reply>,
    /// URLs that always fail.
    failing_urls: HashSet<String>,
    /// When set, unrouted POSTs echo the request back, signed with this key.
    echo_key: Option<String>,
    /// When true, every call fails.
    should_fail: bool,
}

/// A mock implementation of the `Transport` trait for testing.
///
/// Uses `Arc<RwLock<...>>` internally, so it is cheap to clone and all
/// clones share the same state. Unrouted requests fail with a transport
/// error unless echo mode is on.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<RwLock<MockTransportInner>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a mock with no routes.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MockTransportInner {
                requests: Vec::new(),
                queued: HashMap::new(),
                fixed: HashMap::new(),
                failing_urls: HashSet::new(),
                echo_key: None,
                should_fail: false,
            })),
        }
    }

    /// Create a mock that answers every unrouted POST with the request's
    /// own fields plus `return_code`/`result_code` = `SUCCESS`, signed
    /// with MD5 under `key`.
    pub fn echoing(key: &str) -> Self {
        let mock = Self::new();
        mock.inner.write().unwrap().echo_key = Some(key.to_string());
        mock
    }

    /// Always answer `url` with `body`.
    pub fn with_response(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.set_response(url, body);
        self
    }

    /// Answer the next request to `url` with `body`, once.
    pub fn with_next_response(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.inner
            .write()
            .unwrap()
            .queued
            .entry(url.to_string())
            .or_default()
            .push_back(Reply::Body(body.into()));
        self
    }

    /// Answer `url` with a non-success HTTP status.
    pub fn with_status(self, url: &str, code: u16) -> Self {
        self.inner.write().unwrap().fixed.insert(
            url.to_string(),
            Reply::Error {
                code: Some(code),
                reason: format!("mock: status {}", code),
            },
        );
        self
    }

    /// Fail every request to `url` with a network error.
    pub fn with_url_failure(self, url: &str) -> Self {
        self.inner
            .write()
            .unwrap()
            .failing_urls
            .insert(url.to_string());
        self
    }

    /// Configure the mock to fail all requests.
    pub fn with_failure(self) -> Self {
        self.set_should_fail(true);
        self
    }

    /// Replace the fixed reply for `url` at runtime.
    pub fn set_response(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.inner
            .write()
            .unwrap()
            .fixed
            .insert(url.to_string(), Reply::Body(body.into()));
    }

    /// Set the failure mode at runtime.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.inner.write().unwrap().should_fail = should_fail;
    }

    // =========================================================================
    // Assertion Helpers
    // =========================================================================

    /// All recorded requests, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.read().unwrap().requests.clone()
    }

    /// Number of recorded requests.
    pub fn request_count(&self) -> usize {
        self.inner.read().unwrap().requests.len()
    }

    /// Recorded requests to `url`.
    pub fn requests_to(&self, url: &str) -> Vec<RecordedRequest> {
        self.inner
            .read()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.url == url)
            .cloned()
            .collect()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.inner.read().unwrap().requests.last().cloned()
    }

    fn respond(&self, request: RecordedRequest) -> GatewayResult<Vec<u8>> {
        let mut inner = self.inner.write().unwrap();
        let url = request.url.clone();
        let echo = inner
            .echo_key
            .clone()
            .filter(|_| request.http_method == "POST")
            .map(|key| echo_response(&request.fields(), &key));
        inner.requests.push(request);

        if inner.should_fail {
            return Err(GatewayError::transport(None, "mock: configured to fail"));
        }
        if inner.failing_urls.contains(&url) {
            return Err(GatewayError::transport(None, format!("mock: {} unreachable", url)));
        }
        if let Some(reply) = inner.queued.get_mut(&url).and_then(VecDeque::pop_front) {
            return reply.into_result();
        }
        if let Some(reply) = inner.fixed.get(&url) {
            return reply.clone().into_result();
        }
        match echo {
            Some(body) => Ok(body),
            None => Err(GatewayError::transport(None, format!("mock: no route for {}", url))),
        }
    }
}

fn echo_response(request: &FieldMap, key: &str) -> Vec<u8> {
    let mut fields = request.clone();
    fields.remove(paygate_types::constants::FIELD_SIGN);
    fields.remove(paygate_types::constants::FIELD_SIGN_TYPE);
    fields.insert(FIELD_RETURN_CODE, STATUS_SUCCESS);
    fields.insert(FIELD_RESULT_CODE, STATUS_SUCCESS);
    crate::helpers::signed_response(fields, key)
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(&self, request: DispatchRequest<'_>) -> GatewayResult<Vec<u8>> {
        self.respond(RecordedRequest {
            http_method: "POST",
            url: request.url.to_string(),
            body: request.body.to_vec(),
            query: Vec::new(),
            timeout: request.timeout,
            had_client_cert: request.client_cert.is_some(),
        })
    }

    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> GatewayResult<Vec<u8>> {
        self.respond(RecordedRequest {
            http_method: "GET",
            url: url.to_string(),
            body: Vec::new(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            timeout,
            had_client_cert: false,
        })
    }
}
