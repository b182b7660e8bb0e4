//! Single-call HTTP client that sends encoded queries.
//!
//! Each call sends exactly one request: no retries, no backoff. A response
//! whose status differs from the expected one is an error carrying the body.

use crate::endpoint::request_url;
use crate::Result;
use formquery_core::{ClientConfig, Error, Query};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

const USER_AGENT: &str = concat!("formquery-http/", env!("CARGO_PKG_VERSION"));

/// Per-request options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    expected_status: u16,
}

impl RequestOptions {
    /// Options expecting `200 OK`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            expected_status: formquery_core::config::DEFAULT_EXPECTED_STATUS,
        }
    }

    /// Expect a different status code.
    #[must_use]
    pub const fn with_status_code(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    /// The status code treated as success.
    #[must_use]
    pub const fn expected_status(&self) -> u16 {
        self.expected_status
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client bound to one base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: Client,
    config: ClientConfig,
}

impl HttpClient {
    /// Build a client from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the transport
    /// cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let config = config.validated()?;
        let user_agent = config.user_agent.as_deref().unwrap_or(USER_AGENT);

        let http = ClientBuilder::new()
            .timeout(config.timeout())
            .user_agent(user_agent)
            .build()
            .map_err(|err| Error::ConfigError(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self { http, config })
    }

    /// Build a client with default settings for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn from_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::new(base_url)?)
    }

    /// The client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Options expecting the configured status code.
    #[must_use]
    pub const fn default_options(&self) -> RequestOptions {
        RequestOptions::new().with_status_code(self.config.expected_status)
    }

    /// Start a request for `path` with the encoded `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting URL is invalid.
    pub fn request(&self, method: Method, path: &str, query: &Query) -> Result<RequestBuilder> {
        let url = request_url(&self.config.base_url, path, query)?;
        Ok(self.http.request(method, url))
    }

    /// Start a GET request.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting URL is invalid.
    pub fn get(&self, path: &str, query: &Query) -> Result<RequestBuilder> {
        self.request(Method::GET, path, query)
    }

    /// Start a POST request without a body.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting URL is invalid.
    pub fn post(&self, path: &str, query: &Query) -> Result<RequestBuilder> {
        self.request(Method::POST, path, query)
    }

    /// Start a POST request with a JSON body.
    ///
    /// The `Content-Type: application/json` header is set even when `body`
    /// is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the body cannot be encoded.
    pub fn post_json<B>(&self, path: &str, query: &Query, body: Option<&B>) -> Result<RequestBuilder>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self
            .post(path, query)?
            .header(CONTENT_TYPE, "application/json");

        if let Some(payload) = body {
            let bytes = serde_json::to_vec(payload)
                .map_err(|err| Error::Encode(format!("marshal body failed: {err}")))?;
            request = request.body(bytes);
        }
        Ok(request)
    }

    /// Send `request` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedStatus`] when the status differs from the
    /// expected one, [`Error::Decode`] when the body is not valid JSON for
    /// `T`, and a transport error otherwise.
    pub async fn execute<T>(&self, request: RequestBuilder, options: &RequestOptions) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let body = self
            .fetch(request.header(ACCEPT, "application/json"), options)
            .await?;

        serde_json::from_slice(&body).map_err(|err| {
            Error::Decode(format!(
                "unmarshal error: {err} - {}",
                String::from_utf8_lossy(&body)
            ))
        })
    }

    /// Send `request` and discard the body, returning the status code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedStatus`] when the status differs from the
    /// expected one, and a transport error otherwise.
    pub async fn execute_empty(&self, request: RequestBuilder, options: &RequestOptions) -> Result<u16> {
        self.fetch(request, options).await?;
        Ok(options.expected_status())
    }

    /// GET `path` with `query` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::execute`].
    pub async fn get_json<T>(&self, path: &str, query: &Query) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = self.get(path, query)?;
        self.execute(request, &self.default_options()).await
    }

    async fn fetch(&self, request: RequestBuilder, options: &RequestOptions) -> Result<Vec<u8>> {
        let request = request.build()?;
        debug!(method = %request.method(), url = %request.url(), "sending request");

        let response = self.http.execute(request).await?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| Error::HttpError(format!("read response error: {err}")))?;

        if status != options.expected_status() {
            return Err(Error::UnexpectedStatus {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        debug!(status, bytes = body.len(), "received response");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formquery_core::query;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order {
        id: u64,
        symbol: String,
    }

    fn test_client(server: &MockServer) -> HttpClient {
        HttpClient::from_base_url(server.uri()).unwrap()
    }

    #[tokio::test]
    async fn get_json_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orders"))
            .and(query_param("symbol", "BTC USD"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "symbol": "BTC USD"}
            ])))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let orders: Vec<Order> = client
            .get_json("/orders", &query!("symbol", "BTC USD", "limit", 5))
            .await
            .unwrap();
        assert_eq!(
            orders,
            vec![Order {
                id: 1,
                symbol: "BTC USD".into()
            }]
        );
    }

    #[tokio::test]
    async fn unexpected_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such thing"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .get_json::<Order>("/missing", &Query::new())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::UnexpectedStatus {
                status: 404,
                body: "no such thing".into()
            }
        );
    }

    #[tokio::test]
    async fn custom_expected_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"symbol": "ETH"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 9, "symbol": "ETH"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let request = client
            .post_json("/orders", &Query::new(), Some(&json!({"symbol": "ETH"})))
            .unwrap();
        let order: Order = client
            .execute(request, &RequestOptions::new().with_status_code(201))
            .await
            .unwrap();
        assert_eq!(order.id, 9);

        // the same response is an error under the default expectation
        let request = client
            .post_json("/orders", &Query::new(), Some(&json!({"symbol": "ETH"})))
            .unwrap();
        let err = client
            .execute::<Order>(request, &RequestOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(201));
    }

    #[tokio::test]
    async fn decode_failure_includes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/garbled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client
            .get_json::<Order>("/garbled", &Query::new())
            .await
            .unwrap_err();
        match err {
            Error::Decode(message) => assert!(message.contains("not json")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn execute_empty_ignores_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let request = client.post("/ping", &Query::new()).unwrap();
        let status = client
            .execute_empty(request, &RequestOptions::new().with_status_code(204))
            .await
            .unwrap();
        assert_eq!(status, 204);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = HttpClient::new(ClientConfig::default().with_timeout(0)).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
        assert!(HttpClient::from_base_url("::").is_err());
    }

    #[test]
    fn default_options_follow_config() {
        let config = ClientConfig::default().with_expected_status(202);
        let client = HttpClient::new(config).unwrap();
        assert_eq!(client.default_options().expected_status(), 202);
        assert_eq!(RequestOptions::default().expected_status(), 200);
    }
}
