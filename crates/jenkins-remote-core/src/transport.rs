//! reqwest-backed [`HttpSession`]

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use jenkins_remote_api::{
    Credentials,
    HttpResponse,
    HttpSession,
    JenkinsError,
    JenkinsResult,
    PostBody,
};
use reqwest::header::{
    HeaderMap,
    HeaderValue,
    AUTHORIZATION,
    CONTENT_TYPE,
};
use reqwest::redirect::Policy;
use reqwest::Client;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// One HTTP client shared by every handle of a connection
pub struct ReqwestSession {
    client: Client,
    credentials: Option<Credentials>,
    ssl_verify: bool,
}

impl ReqwestSession {
    pub fn new(
        credentials: Option<Credentials>, ssl_verify: bool, request_timeout: Duration,
        connect_timeout: Duration,
    ) -> JenkinsResult<Self> {
        // Fails when the host application already installed a provider
        let _ = rustls::crypto::ring::default_provider().install_default();

        let mut headers = HeaderMap::new();
        if let Some(creds) = &credentials {
            headers.insert(AUTHORIZATION, basic_auth(creds)?);
        }

        let client = Client::builder()
            .use_rustls_tls()
            .default_headers(headers)
            .danger_accept_invalid_certs(!ssl_verify)
            .redirect(Policy::none())
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| {
                JenkinsError::InvalidConfig(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            credentials,
            ssl_verify,
        })
    }

    async fn into_response(
        &self, url: &str, response: reqwest::Response, accept_redirect: bool,
    ) -> JenkinsResult<HttpResponse> {
        let status = response.status();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| JenkinsError::transport(url, Some(status.as_u16()), e.to_string()))?;

        let accepted = status.is_success() || (accept_redirect && status.is_redirection());
        if !accepted {
            tracing::debug!(url, status = status.as_u16(), "Request rejected");
            return Err(JenkinsError::transport(
                url,
                Some(status.as_u16()),
                format!("HTTP {status}: {}", truncate(&body)),
            ));
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

#[async_trait]
impl HttpSession for ReqwestSession {
    async fn get(&self, url: &str) -> JenkinsResult<HttpResponse> {
        tracing::debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| JenkinsError::transport(url, None, e.to_string()))?;
        self.into_response(url, response, false).await
    }

    async fn post(&self, url: &str, body: PostBody) -> JenkinsResult<HttpResponse> {
        tracing::debug!(url, content_type = body.content_type(), "POST");
        let request = self.client.post(url);
        let request = match body {
            PostBody::Empty => request,
            PostBody::Form(pairs) => request.form(&pairs),
            PostBody::Xml(xml) => request
                .header(CONTENT_TYPE, "text/xml; charset=utf-8")
                .body(xml),
        };

        let response = request
            .send()
            .await
            .map_err(|e| JenkinsError::transport(url, None, e.to_string()))?;
        self.into_response(url, response, true).await
    }

    fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    fn ssl_verify(&self) -> bool {
        self.ssl_verify
    }
}

impl fmt::Debug for ReqwestSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestSession")
            .field("credentials", &self.credentials)
            .field("ssl_verify", &self.ssl_verify)
            .finish()
    }
}

fn basic_auth(creds: &Credentials) -> JenkinsResult<HeaderValue> {
    let raw = format!("{}:{}", creds.username, creds.token);
    let encoded = base64::engine::general_purpose::STANDARD.encode(raw.as_bytes());
    let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
        .map_err(|e| JenkinsError::InvalidConfig(format!("Invalid auth format: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

fn truncate(body: &str) -> &str {
    const LIMIT: usize = 200;
    match body.char_indices().nth(LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
