//! HTTP client for the profiling backend.
//!
//! Posts the request body as JSON to the configured endpoint, typically the
//! APM web API's `query_graph_profile` resource.
//!
//! ## Example
//!
//! ```rust,no_run
//! use profview::query::{HttpQuery, ProfileQuery, QueryParams, QueryRequest};
//! use profview::data::{DiagramType, TimeRange};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpQuery::builder()
//!         .endpoint("http://localhost:8000/apm/profiling/query_graph_profile/")
//!         .token("secret")
//!         .build()?;
//!
//!     let params = QueryParams::new().with("app_name", "shop").with("service_name", "cart");
//!     let range = TimeRange::last(Duration::from_secs(3600));
//!     let request = QueryRequest::new(&params, &range, &[DiagramType::Table]);
//!
//!     let response = client.query(&request).await?;
//!     println!("got diagrams: {}", response.diagrams.is_some());
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tracing::debug;

use super::{ProfileQuery, QueryError, QueryRequest, QueryResponse};

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/apm/profiling/query_graph_profile/";

/// Profile query client backed by the HTTP API.
#[derive(Debug, Clone)]
pub struct HttpQuery {
    client: Client,
    endpoint: String,
    token: Option<String>,
    description: String,
}

impl HttpQuery {
    /// Create a new builder for configuring the client.
    pub fn builder() -> HttpQueryBuilder {
        HttpQueryBuilder::default()
    }

    /// The endpoint requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ProfileQuery for HttpQuery {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, QueryError> {
        let mut builder = self.client.post(&self.endpoint).json(&request.to_json());
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }

        debug!(
            endpoint = %self.endpoint,
            diagram_types = ?request.diagram_types,
            "posting profile query"
        );
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        QueryResponse::from_slice(&body)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for HttpQuery.
#[derive(Debug, Default)]
pub struct HttpQueryBuilder {
    endpoint: Option<String>,
    token: Option<String>,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl HttpQueryBuilder {
    /// Set the query endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Send a bearer token with every request.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Add a header sent with every request (e.g. a tenant id).
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the request timeout (default: 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<HttpQuery, QueryError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(30));

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| QueryError::Http(format!("invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| QueryError::Http(format!("invalid header value: {}", e)))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let description = format!("http: {}", endpoint);

        Ok(HttpQuery {
            client,
            endpoint,
            token: self.token,
            description,
        })
    }
}
