//! Cookie-bearing async HTTP client wrapping reqwest.
//!
//! Not a browser, just HTTP requests that look like one. Every request is a
//! single attempt: no retry and no backoff. Non-success statuses surface as
//! [`ScrapeError::Status`] so callers never parse an error page by accident.

use std::time::Duration;

use crate::config::PortalConfig;
use crate::types::{ScrapeError, ScrapeResult};

/// Header the portal expects on XHR-style calls.
pub const REQUESTED_WITH: (&str, &str) = ("x-requested-with", "XMLHttpRequest");

/// Header carrying the anti-forgery token on privileged calls.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Response from a portal request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Original requested URL.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into a transport error.
    pub fn error_for_status(self) -> ScrapeResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ScrapeError::Status {
                status: self.status,
                url: self.url,
            })
        }
    }
}

/// HTTP client with its own cookie jar. Clones share the jar.
#[derive(Clone)]
pub struct PortalClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl PortalClient {
    /// Build a client with a fresh, empty cookie jar.
    pub fn new(config: &PortalConfig) -> ScrapeResult<Self> {
        config.validate()?;
        let timeout = Duration::from_millis(config.timeout_ms);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(config.user_agent.as_str())
            .cookie_store(true)
            .build()?;

        Ok(Self { client, timeout })
    }

    /// GET `url` with the browser headers plus `extra_headers`.
    pub async fn get(&self, url: &str, extra_headers: &[(&str, &str)]) -> ScrapeResult<HttpResponse> {
        tracing::debug!("GET {url}");
        let builder = self.client.get(url).timeout(self.timeout);
        self.send(url, builder, extra_headers).await
    }

    /// POST url-encoded `form_fields` to `url`.
    pub async fn post_form(
        &self,
        url: &str,
        form_fields: &[(&str, &str)],
        extra_headers: &[(&str, &str)],
    ) -> ScrapeResult<HttpResponse> {
        tracing::debug!("POST {url} ({} form fields)", form_fields.len());
        let builder = self
            .client
            .post(url)
            .timeout(self.timeout)
            .form(form_fields);
        self.send(url, builder, extra_headers).await
    }

    async fn send(
        &self,
        url: &str,
        mut builder: reqwest::RequestBuilder,
        extra_headers: &[(&str, &str)],
    ) -> ScrapeResult<HttpResponse> {
        builder = builder.header(REQUESTED_WITH.0, REQUESTED_WITH.1);
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }

        let r = builder.send().await?;
        let status = r.status().as_u16();
        let body = r.text().await?;
        tracing::debug!("{status} from {url} ({} bytes)", body.len());

        Ok(HttpResponse {
            url: url.to_string(),
            status,
            body,
        })
    }
}
