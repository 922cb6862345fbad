//! HTTP seam between the client and GitHub.

use crate::github::GitHubError;
use crate::rate_limit::{unix_now, RateLimitHeaders};
use async_trait::async_trait;
use octocrab::Octocrab;
use serde_json::Value;

/// HTTP methods used by the migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
}

impl Method {
    /// Returns true for methods that change state on GitHub.
    #[must_use]
    pub fn is_mutating(self) -> bool {
        !matches!(self, Self::Get)
    }
}

/// One GitHub API request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path and query, starting with `/`.
    pub route: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(route: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            route: route.into(),
            body: None,
        }
    }

    #[must_use]
    pub fn post(route: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            route: route.into(),
            body: Some(body),
        }
    }

    #[must_use]
    pub fn patch(route: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Patch,
            route: route.into(),
            body: Some(body),
        }
    }

    /// POST without a body.
    #[must_use]
    pub fn post_empty(route: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            route: route.into(),
            body: None,
        }
    }

    /// Appends URL-encoded query parameters to the route.
    #[must_use]
    pub fn with_query(mut self, params: &[(&str, &str)]) -> Self {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        self.route = format!("{}?{}", self.route, query);
        self
    }
}

/// A GitHub API response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Seconds to wait before repeating the request, when rate limited.
    pub retry_after: Option<u64>,
    /// Parsed JSON body, `Null` when empty or not JSON.
    pub body: Value,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            retry_after: None,
            body,
        }
    }

    /// Only 200 and 201 count as success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 201)
    }
}

/// Sends requests to GitHub.
///
/// Errors are reserved for failures where no response was received; HTTP
/// error statuses come back as an [`ApiResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, GitHubError>;
}

/// [`Transport`] backed by an authenticated [`Octocrab`] instance.
pub struct OctocrabTransport {
    octocrab: Octocrab,
}

impl OctocrabTransport {
    #[must_use]
    pub fn new(octocrab: Octocrab) -> Self {
        Self { octocrab }
    }

    /// Creates a transport sending `token` as a bearer token.
    ///
    /// Works for personal tokens, installation tokens and app JWTs alike.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError`] if the HTTP client cannot be built.
    pub fn with_token(token: String) -> Result<Self, GitHubError> {
        let octocrab = Octocrab::builder().personal_token(token).build()?;
        Ok(Self::new(octocrab))
    }
}

#[async_trait]
impl Transport for OctocrabTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, GitHubError> {
        let route = request.route.as_str();
        let response = match request.method {
            Method::Get => self.octocrab._get(route).await?,
            Method::Post => self.octocrab._post(route, request.body.as_ref()).await?,
            Method::Patch => self.octocrab._patch(route, request.body.as_ref()).await?,
        };

        let status = response.status().as_u16();
        let headers = response.headers();
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        let retry_after = RateLimitHeaders {
            retry_after: header("retry-after"),
            remaining: header("x-ratelimit-remaining"),
            reset: header("x-ratelimit-reset"),
        }
        .wait_hint(unix_now());

        let text = self.octocrab.body_to_string(response).await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);

        Ok(ApiResponse {
            status,
            retry_after,
            body,
        })
    }
}
