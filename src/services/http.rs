use crate::config::ProviderConfig;
use crate::models::error::AppError;
use async_trait::async_trait;

/// A GET request with headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Status and body of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// The one network capability the provider client needs.
///
/// Implementations return `AppError::Transport` when no HTTP status was
/// received (timeout, DNS, connection reset). Any received status, including
/// error statuses, is returned as an `HttpResponse`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, AppError>;
}

/// `HttpClient` backed by reqwest
pub struct ReqwestHttpClient {
    http: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Creates a client with the configured request timeout
    pub fn new(config: &ProviderConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http })
    }

    /// Converts a reqwest error into a transport error
    fn classify_error(error: &reqwest::Error) -> AppError {
        if error.is_timeout() {
            AppError::Transport(format!("Request timeout: {error}"))
        } else if error.is_connect() {
            AppError::Transport(format!("Connection error: {error}"))
        } else if error.is_request() {
            AppError::Transport(format!("Request error: {error}"))
        } else {
            AppError::Transport(format!("Network error: {error}"))
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, AppError> {
        let mut builder = self.http.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::classify_error(&e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Self::classify_error(&e))?;

        Ok(HttpResponse { status, body })
    }
}
