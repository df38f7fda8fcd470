//! HTTP client for the gateway REST API.
//!
//! [`GatewayClient`] owns one pooled `reqwest::Client` configured from a
//! resolved [`ConnectionProfile`]: base URL, auth header, TLS policy and
//! timeout. All calls return typed [`GatewayError`]s.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::auth::Credentials;
use super::constants::{
    API_BASE_PATH, CONNECT_TIMEOUT_SECS, DEFAULT_PAGE_SIZE, PARTIAL_SUFFIX,
};
use super::error::GatewayError;
use super::response::ListResponse;
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use crate::config::ConnectionProfile;

/// Body of an outgoing request.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON-serialized value.
    Json(Value),
    /// Raw bytes with an explicit content type.
    Bytes {
        /// Payload.
        data: Vec<u8>,
        /// `Content-Type` header value.
        content_type: String,
    },
}

/// Query parameters as ordered key/value pairs.
pub type Query<'a> = [(&'a str, String)];

/// Client for one gateway.
///
/// Created once per command and reused for every call it makes.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    gateway_url: String,
    gateway_root: Url,
    api_base: Url,
    credentials: Credentials,
    retry_policy: RetryPolicy,
    page_size: usize,
}

impl GatewayClient {
    /// Builds a client for an already-resolved connection profile.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidUrl`] when the profile URL is not an
    /// absolute http(s) URL, or [`GatewayError::ClientBuild`] when the
    /// underlying HTTP client cannot be constructed.
    pub fn new(profile: &ConnectionProfile) -> Result<Self, GatewayError> {
        let gateway_root = Url::parse(&profile.url)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
            .ok_or_else(|| GatewayError::invalid_url(&profile.url))?;
        let api_base = Url::parse(&format!("{}{API_BASE_PATH}", profile.url))
            .map_err(|_| GatewayError::invalid_url(&profile.url))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let timeout = Duration::from_secs(profile.timeout_secs);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS.min(profile.timeout_secs)))
            .timeout(timeout)
            .gzip(true)
            .user_agent(concat!("ignition-cli/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .danger_accept_invalid_certs(!profile.verify_ssl)
            .build()
            .map_err(|source| GatewayError::ClientBuild { source })?;

        if !profile.verify_ssl {
            debug!(url = %profile.url, "TLS certificate verification disabled");
        }

        let credentials = Credentials::from_profile(profile);
        debug!(url = %profile.url, auth = credentials.label(), "gateway client ready");

        Ok(Self {
            client,
            gateway_url: profile.url.clone(),
            gateway_root,
            api_base,
            credentials,
            retry_policy: RetryPolicy::default(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Replaces the transport retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Overrides the page size used by [`Self::get_all_items`].
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// The gateway URL this client talks to (no trailing slash).
    #[must_use]
    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    /// Sends a request to an API path (relative to `/data/api/v1`).
    ///
    /// A `?query` suffix on `path` is preserved; `query` pairs are appended.
    #[instrument(skip(self, query, body), fields(method = %method, path = %path))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &Query<'_>,
        body: RequestBody,
    ) -> Result<Response, GatewayError> {
        let url = join_url(&self.api_base, path, query)?;
        let method = &method;
        let url_ref = &url;
        let body = &body;
        self.execute(url_ref, move || async move {
            Ok(self.build_request(method.clone(), url_ref.clone(), body))
        })
        .await
    }

    /// GET and decode the body as JSON.
    pub async fn get_json(&self, path: &str, query: &Query<'_>) -> Result<Value, GatewayError> {
        let response = self
            .request(Method::GET, path, query, RequestBody::Empty)
            .await?;
        read_body(response).await
    }

    /// POST a JSON body (or none) and decode the response.
    pub async fn post_json(&self, path: &str, body: Option<Value>) -> Result<Value, GatewayError> {
        let response = self
            .request(Method::POST, path, &[], json_body(body))
            .await?;
        read_body(response).await
    }

    /// PUT a JSON body (or none) and decode the response.
    pub async fn put_json(&self, path: &str, body: Option<Value>) -> Result<Value, GatewayError> {
        let response = self
            .request(Method::PUT, path, &[], json_body(body))
            .await?;
        read_body(response).await
    }

    /// DELETE and decode the response.
    pub async fn delete(&self, path: &str, query: &Query<'_>) -> Result<Value, GatewayError> {
        let response = self
            .request(Method::DELETE, path, query, RequestBody::Empty)
            .await?;
        read_body(response).await
    }

    /// Fetches every page of a list endpoint.
    ///
    /// Pages are requested with `limit`/`offset` only while the gateway
    /// answers with a `metadata` envelope. Paging stops on a short page, the
    /// reported `metadata.total`, or a page identical to the previous one.
    /// Bare lists and envelopes without metadata are a single page.
    /// `query` is copied, never modified.
    #[instrument(skip(self, query, fallback_keys), fields(path = %path))]
    pub async fn get_all_items(
        &self,
        path: &str,
        query: &Query<'_>,
        fallback_keys: &[&str],
    ) -> Result<Vec<Value>, GatewayError> {
        let mut items: Vec<Value> = Vec::new();
        let mut offset = 0_usize;
        let mut previous_len = 0_usize;

        loop {
            let mut page_query = query.to_vec();
            page_query.push(("limit", self.page_size.to_string()));
            page_query.push(("offset", offset.to_string()));

            let response = ListResponse::from_value(self.get_json(path, &page_query).await?, fallback_keys);
            let paginated = response.is_paginated();
            let total = response.metadata().and_then(|metadata| metadata.total);
            let page = response.into_items();
            let page_len = page.len();

            // A gateway ignoring `offset` serves the same page again.
            if offset > 0 && page_len == previous_len && items[items.len() - previous_len..] == page[..] {
                warn!(offset, "page repeated; gateway ignored offset");
                break;
            }

            items.extend(page);
            offset += page_len;
            previous_len = page_len;

            debug!(page_len, offset, ?total, paginated, "fetched page");

            let reached_total = total.is_some_and(|total| offset as u64 >= total);
            if !paginated || page_len == 0 || page_len < self.page_size || reached_total {
                break;
            }
        }

        Ok(items)
    }

    /// Streams a GET response body to `dest`, returning the byte count.
    ///
    /// Bytes land in `<dest>.partial` first and are renamed into place only
    /// after the stream completes. The partial file is removed on any error,
    /// and a zero-byte body is reported as [`GatewayError::EmptyResponse`].
    #[instrument(skip(self), fields(path = %path, dest = %dest.display()))]
    pub async fn stream_to_file(&self, path: &str, dest: &Path) -> Result<u64, GatewayError> {
        let response = self
            .request(Method::GET, path, &[], RequestBody::Empty)
            .await?;
        let url = response.url().to_string();
        let partial = partial_path(dest);

        let file = File::create(&partial)
            .await
            .map_err(|e| GatewayError::io(&partial, e))?;

        let outcome = match write_stream(file, response, &url, &partial).await {
            Ok(0) => Err(GatewayError::EmptyResponse {
                path: dest.to_path_buf(),
            }),
            Ok(bytes) => tokio::fs::rename(&partial, dest)
                .await
                .map(|()| bytes)
                .map_err(|e| GatewayError::io(dest, e)),
            Err(error) => Err(error),
        };

        match &outcome {
            Ok(bytes) => info!(bytes, "download complete"),
            Err(_) => {
                debug!(path = %partial.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(&partial).await;
            }
        }

        outcome
    }

    /// Streams a local file as the request body.
    ///
    /// The file is reopened for every attempt so a transport retry resends
    /// the full content.
    #[instrument(skip(self, query), fields(method = %method, path = %path, file = %file.display()))]
    pub async fn stream_upload(
        &self,
        method: Method,
        path: &str,
        file: &Path,
        query: &Query<'_>,
        content_type: &str,
    ) -> Result<Response, GatewayError> {
        let url = join_url(&self.api_base, path, query)?;
        let length = tokio::fs::metadata(file)
            .await
            .map_err(|e| GatewayError::io(file, e))?
            .len();

        let method = &method;
        let url_ref = &url;
        let response = self
            .execute(url_ref, move || async move {
                let handle = File::open(file)
                    .await
                    .map_err(|e| GatewayError::io(file, e))?;
                Ok(self
                    .build_request(method.clone(), url_ref.clone(), &RequestBody::Empty)
                    .header(CONTENT_TYPE, content_type)
                    .header(CONTENT_LENGTH, length)
                    .body(reqwest::Body::from(handle)))
            })
            .await?;

        info!(bytes = length, "upload complete");
        Ok(response)
    }

    /// Fetches the gateway's OpenAPI document (`<gateway>/openapi.json`).
    pub async fn openapi_spec(&self) -> Result<Value, GatewayError> {
        let url = join_url(&self.gateway_root, "/openapi.json", &[])?;
        let url_ref = &url;
        let response = self
            .execute(url_ref, move || async move {
                Ok(self.build_request(Method::GET, url_ref.clone(), &RequestBody::Empty))
            })
            .await?;
        read_body(response).await
    }

    fn build_request(&self, method: Method, url: Url, body: &RequestBody) -> RequestBuilder {
        let builder = self.credentials.apply(self.client.request(method, url));
        match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Bytes { data, content_type } => builder
                .header(CONTENT_TYPE, content_type.as_str())
                .body(data.clone()),
        }
    }

    /// Sends a request built by `build`, retrying transient connection failures.
    async fn execute<F, Fut>(&self, url: &Url, mut build: F) -> Result<Response, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<RequestBuilder, GatewayError>>,
    {
        let mut attempt = 1;
        loop {
            let request = build().await?;
            let error = match request.send().await {
                Ok(response) => return self.check_status(response).await,
                Err(source) => self.map_send_error(source),
            };

            match self.retry_policy.should_retry(classify_error(&error), attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    warn!(
                        url = %url,
                        attempt = next,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "connection failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(%reason, "not retrying");
                    return Err(error);
                }
            }
        }
    }

    fn map_send_error(&self, source: reqwest::Error) -> GatewayError {
        if source.is_timeout() {
            GatewayError::timeout(&self.gateway_url)
        } else if source.is_builder() {
            GatewayError::invalid_url(&self.gateway_url)
        } else {
            GatewayError::connection(&self.gateway_url, source)
        }
    }

    async fn check_status(&self, response: Response) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "gateway returned error status");
        Err(GatewayError::from_status(
            status.as_u16(),
            &body,
            &self.gateway_url,
        ))
    }
}

/// Percent-encodes a value for use as one URL path segment.
#[must_use]
pub fn encode_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Decodes a response body: JSON when it parses, text otherwise, `null` when empty.
///
/// # Errors
///
/// [`GatewayError::Decode`] when the response declares a JSON content type
/// but the body is not valid JSON.
pub async fn read_body(response: Response) -> Result<Value, GatewayError> {
    let url = response.url().to_string();
    let declared_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("json"));
    let bytes = response
        .bytes()
        .await
        .map_err(|e| GatewayError::transfer(&url, e))?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(value),
        Err(source) if declared_json => Err(GatewayError::Decode { url, source }),
        Err(_) => Ok(Value::String(String::from_utf8_lossy(&bytes).into_owned())),
    }
}

fn json_body(body: Option<Value>) -> RequestBody {
    body.map_or(RequestBody::Empty, RequestBody::Json)
}

fn join_url(base: &Url, path: &str, query: &Query<'_>) -> Result<Url, GatewayError> {
    let (path, inline_query) = match path.split_once('?') {
        Some((path, inline)) => (path, Some(inline)),
        None => (path, None),
    };

    let mut url = base.clone();
    let joined = format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    url.set_query(inline_query.filter(|q| !q.is_empty()));

    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }

    if url.cannot_be_a_base() {
        return Err(GatewayError::invalid_url(url.as_str()));
    }
    Ok(url)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    dest.with_file_name(name)
}

/// Streams a response body into `file`, returning bytes written.
async fn write_stream(
    file: File,
    response: Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, GatewayError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| GatewayError::transfer(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| GatewayError::io(file_path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| GatewayError::io(file_path, e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn profile_for(url: &str) -> ConnectionProfile {
        ConnectionProfile {
            name: "test".to_string(),
            url: url.trim_end_matches('/').to_string(),
            token: Some("key:secret".to_string()),
            username: None,
            password: None,
            verify_ssl: true,
            timeout_secs: 5,
        }
    }

    fn client_for(server: &MockServer) -> GatewayClient {
        GatewayClient::new(&profile_for(&server.uri()))
            .unwrap()
            .with_retry_policy(RetryPolicy::no_retry())
    }

    #[test]
    fn test_join_url_appends_api_path_and_query() {
        let base = Url::parse("https://gw:8043/data/api/v1").unwrap();
        let url = join_url(&base, "/projects/find/My%20Project", &[("overwrite", "true".to_string())]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://gw:8043/data/api/v1/projects/find/My%20Project?overwrite=true"
        );
    }

    #[test]
    fn test_join_url_keeps_inline_query() {
        let base = Url::parse("https://gw/data/api/v1").unwrap();
        let url = join_url(&base, "logs?limit=5", &[("level", "WARN".to_string())]).unwrap();
        assert_eq!(url.as_str(), "https://gw/data/api/v1/logs?limit=5&level=WARN");
    }

    #[test]
    fn test_new_rejects_non_http_url() {
        let error = GatewayClient::new(&profile_for("ftp://gw")).unwrap_err();
        assert!(matches!(error, GatewayError::InvalidUrl { .. }));
        let error = GatewayClient::new(&profile_for("gateway-without-scheme")).unwrap_err();
        assert!(matches!(error, GatewayError::InvalidUrl { .. }));
    }

    #[test]
    fn test_encode_segment_escapes_spaces_and_slashes() {
        assert_eq!(encode_segment("My Project"), "My%20Project");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
    }

    #[test]
    fn test_partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/tmp/out/export.zip")),
            PathBuf::from("/tmp/out/export.zip.partial")
        );
    }

    #[tokio::test]
    async fn test_get_json_sends_token_and_accept_headers() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/data/api/v1/gateway-info"))
            .and(header("X-Ignition-API-Token", "key:secret"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "gw1"})))
            .expect(1)
            .mount(&server)
            .await;

        let value = client_for(&server).get_json("/gateway-info", &[]).await.unwrap();
        assert_eq!(value["name"], "gw1");
    }

    #[tokio::test]
    async fn test_status_errors_are_typed() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/data/api/v1/projects/find/missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "no such project"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/data/api/v1/projects"))
            .respond_with(ResponseTemplate::new(409).set_body_string("already exists"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        match client.get_json("/projects/find/missing", &[]).await {
            Err(GatewayError::NotFound { detail }) => assert_eq!(detail, "no such project"),
            other => panic!("expected NotFound, got {other:?}"),
        }
        match client.post_json("/projects", Some(json!({"name": "x"}))).await {
            Err(GatewayError::Conflict { detail }) => assert_eq!(detail, "already exists"),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_post_json_sends_body() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("POST"))
            .and(path("/data/api/v1/projects/copy"))
            .and(body_json(json!({"fromName": "a", "toName": "b"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let value = client_for(&server)
            .post_json("/projects/copy", Some(json!({"fromName": "a", "toName": "b"})))
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_get_all_items_walks_pages_without_touching_query() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/data/api/v1/projects/list"))
            .and(query_param("offset", "0"))
            .and(query_param("limit", "2"))
            .and(query_param("filter", "x"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"name": "a"}, {"name": "b"}],
                "metadata": {"total": 3}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/api/v1/projects/list"))
            .and(query_param("offset", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"name": "c"}],
                "metadata": {"total": 3}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).with_page_size(2);
        let query = vec![("filter", "x".to_string())];
        let items = client.get_all_items("/projects/list", &query, &[]).await.unwrap();

        let names: Vec<_> = items.iter().map(|item| item["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(query.len(), 1);
    }

    #[tokio::test]
    async fn test_get_all_items_stops_on_bare_list() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/data/api/v1/mode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "dev"}, {"name": "prod"}])))
            .expect(1)
            .mount(&server)
            .await;

        let items = client_for(&server)
            .with_page_size(2)
            .get_all_items("/mode", &[], &[])
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_get_all_items_envelope_without_metadata_is_one_page() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/data/api/v1/gateway/loggers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "loggers": [{"name": "a"}, {"name": "b"}, {"name": "c"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).with_page_size(2);
        let items = tokio::time::timeout(
            Duration::from_secs(3),
            client.get_all_items("/gateway/loggers", &[], &["loggers"]),
        )
        .await
        .expect("listing should finish")
        .unwrap();
        assert_eq!(items.len(), 3);
    }

    #[tokio::test]
    async fn test_get_all_items_stops_when_offset_is_ignored() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/data/api/v1/resources/names/ignition/tag-provider"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "names": ["default", "system"],
                "metadata": {}
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server).with_page_size(2);
        let items = tokio::time::timeout(
            Duration::from_secs(3),
            client.get_all_items("/resources/names/ignition/tag-provider", &[], &["names"]),
        )
        .await
        .expect("listing should finish")
        .unwrap();
        assert_eq!(items, vec![json!("default"), json!("system")]);
    }

    #[tokio::test]
    async fn test_stream_to_file_writes_and_renames() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("backup.gwbk");
        let payload = vec![7_u8; 256 * 1024];

        Mock::given(method("GET"))
            .and(path("/data/api/v1/backup"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
            .mount(&server)
            .await;

        let bytes = client_for(&server).stream_to_file("/backup", &dest).await.unwrap();
        assert_eq!(bytes, payload.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), payload);
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_stream_to_file_empty_body_leaves_nothing() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("empty.zip");

        Mock::given(method("GET"))
            .and(path("/data/api/v1/projects/export/empty"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let error = client_for(&server)
            .stream_to_file("/projects/export/empty", &dest)
            .await
            .unwrap_err();
        assert!(matches!(error, GatewayError::EmptyResponse { .. }));
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_stream_to_file_error_status_creates_no_file() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("nope.zip");

        Mock::given(method("GET"))
            .and(path("/data/api/v1/projects/export/nope"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let error = client_for(&server)
            .stream_to_file("/projects/export/nope", &dest)
            .await
            .unwrap_err();
        assert!(matches!(error, GatewayError::Authentication { status: 401, .. }));
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_stream_upload_sends_file_with_content_type() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("proj.zip");
        std::fs::write(&file, b"PK\x03\x04payload").unwrap();

        Mock::given(method("POST"))
            .and(path("/data/api/v1/projects/import/proj"))
            .and(query_param("overwrite", "true"))
            .and(header("Content-Type", "application/zip"))
            .and(header_exists("X-Ignition-API-Token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .stream_upload(
                Method::POST,
                "/projects/import/proj",
                &file,
                &[("overwrite", "true".to_string())],
                "application/zip",
            )
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received[0].body, b"PK\x03\x04payload");
    }

    #[tokio::test]
    async fn test_openapi_spec_fetched_from_gateway_root() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/openapi.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"paths": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let spec = client_for(&server).openapi_spec().await.unwrap();
        assert!(spec["paths"].is_object());
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_connection_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0");
        let Ok(listener) = listener else {
            return;
        };
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = GatewayClient::new(&profile_for(&format!("http://127.0.0.1:{port}")))
            .unwrap()
            .with_retry_policy(RetryPolicy::new(2, Duration::ZERO, Duration::ZERO, 1.0));
        let error = client.get_json("/gateway-info", &[]).await.unwrap_err();
        assert!(matches!(error, GatewayError::Connection { .. }), "got {error:?}");
        assert!(error.to_string().contains("cannot connect"));
    }

    #[tokio::test]
    async fn test_read_body_falls_back_to_text() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/data/api/v1/status"))
            .respond_with(ResponseTemplate::new(200).set_body_string("RUNNING"))
            .mount(&server)
            .await;

        let value = client_for(&server).get_json("/status", &[]).await.unwrap();
        assert_eq!(value, Value::String("RUNNING".to_string()));
    }
}
