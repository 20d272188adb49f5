use super::template::{TemplateError, UrlTemplate};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Request, StatusCode};
use std::fmt::Write as _;
use thiserror::Error;
use tracing::{debug, info, warn};

const APPLICATION_JSON: &str = "application/json";

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("invalid API URL template: {0}")]
    Template(#[from] TemplateError),

    #[error("API key is not a valid HTTP header value")]
    InvalidApiKey,

    #[error("failed to initialise HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to send request: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Non 200 HTTP status: {status}\nBody: {body}")]
    Remote { status: StatusCode, body: String },
}

/// Terminal states of a publish attempt that did not fail.
#[derive(Debug)]
pub enum PublishOutcome {
    /// The request was built but never sent
    DryRun(Request),
    /// The endpoint answered 200; holds the response body
    Published(Vec<u8>),
}

/// Builds and sends the request that uploads a report file.
///
/// Requests are sent exactly once. There is no retry, no backoff and no
/// timeout beyond the transport defaults.
#[derive(Debug, Clone)]
pub struct Publisher {
    client: Client,
}

impl Publisher {
    pub fn new() -> Result<Self, PublishError> {
        let client = Client::builder()
            .user_agent(concat!("sv/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(PublishError::Client)?;
        Ok(Self { client })
    }

    /// Build the `PUT` request for `report`, streaming the file as the body.
    pub fn build_request(
        &self,
        url_template: &UrlTemplate,
        pr_id: &str,
        api_key: &str,
        report: tokio::fs::File,
    ) -> Result<Request, PublishError> {
        let url = url_template.resolve(pr_id)?;

        let mut headers = HeaderMap::new();
        headers.insert("accepts", HeaderValue::from_static(APPLICATION_JSON));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        let mut token = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| PublishError::InvalidApiKey)?;
        token.set_sensitive(true);
        headers.insert(AUTHORIZATION, token);

        let request = self
            .client
            .request(Method::PUT, url)
            .headers(headers)
            .body(report)
            .build()
            .map_err(PublishError::Client)?;

        debug!(method = %request.method(), url = %request.url(), "Built publish request");
        Ok(request)
    }

    /// Send `request` once and return the body of a `200` response.
    ///
    /// Any other status becomes [`PublishError::Remote`] carrying the body.
    pub async fn send(&self, request: Request) -> Result<Vec<u8>, PublishError> {
        let url = request.url().clone();
        let response = self
            .client
            .execute(request)
            .await
            .map_err(PublishError::Network)?;

        let status = response.status();
        if status != StatusCode::OK {
            // The status is reported even when the body cannot be read
            let body = response
                .bytes()
                .await
                .inspect_err(|e| warn!(%url, error = %e, "Failed to read error response body"))
                .unwrap_or_default();
            warn!(%url, %status, "Publish rejected by remote endpoint");
            return Err(PublishError::Remote {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let body = response.bytes().await.map_err(PublishError::Network)?;
        info!(%url, bytes = body.len(), "Report published");
        Ok(body.to_vec())
    }

    /// Build the request and, unless `dry_run` is set, send it.
    ///
    /// `on_built` sees the finished request before anything goes over the wire.
    pub async fn publish(
        &self,
        url_template: &UrlTemplate,
        pr_id: &str,
        api_key: &str,
        report: tokio::fs::File,
        dry_run: bool,
        on_built: impl FnOnce(&Request),
    ) -> Result<PublishOutcome, PublishError> {
        let request = self.build_request(url_template, pr_id, api_key, report)?;
        on_built(&request);
        if dry_run {
            info!(url = %request.url(), "Dry run, request not sent");
            return Ok(PublishOutcome::DryRun(request));
        }
        self.send(request).await.map(PublishOutcome::Published)
    }
}

/// Human readable dump of a request line and its headers.
///
/// Sensitive header values (the bearer token) are masked.
pub fn describe_request(request: &Request) -> String {
    let mut out = format!("{} {}\n", request.method(), request.url());
    for (name, value) in request.headers() {
        let shown = if value.is_sensitive() {
            "Bearer ****".to_string()
        } else {
            String::from_utf8_lossy(value.as_bytes()).into_owned()
        };
        let _ = writeln!(out, "{name}: {shown}");
    }
    out
}
