//! Transport seam between resource handles and the HTTP client

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

use crate::error::JenkinsResult;

/// Basic-auth credentials (username + password or API token)
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lower-cased
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PostBody {
    #[default]
    Empty,
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    /// `text/xml`
    Xml(String),
}

impl PostBody {
    pub fn form<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        PostBody::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            PostBody::Empty => None,
            PostBody::Form(_) => Some("application/x-www-form-urlencoded"),
            PostBody::Xml(_) => Some("text/xml"),
        }
    }
}

/// Authenticated GET/POST capability against absolute URLs.
///
/// Implementations turn any non-2xx answer into `JenkinsError::Transport`;
/// POST implementations may additionally accept redirects, which Jenkins
/// uses to answer most form submissions.
#[async_trait]
pub trait HttpSession: Send + Sync + fmt::Debug {
    async fn get(&self, url: &str) -> JenkinsResult<HttpResponse>;

    async fn post(&self, url: &str, body: PostBody) -> JenkinsResult<HttpResponse>;

    fn credentials(&self) -> Option<&Credentials>;

    fn ssl_verify(&self) -> bool {
        true
    }
}

/// Appends URL-encoded query parameters to `url`
pub fn with_query(url: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_token() {
        let creds = Credentials::new("admin", "s3cret");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn test_with_query() {
        assert_eq!(
            with_query("http://jenkins/createItem", &[("name", "my job")]),
            "http://jenkins/createItem?name=my%20job"
        );
        assert_eq!(
            with_query("http://jenkins/x?a=1", &[("b", "2")]),
            "http://jenkins/x?a=1&b=2"
        );
        assert_eq!(with_query("http://jenkins/x", &[]), "http://jenkins/x");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let resp = HttpResponse::ok("").with_header("Location", "http://jenkins/queue/item/3/");
        assert_eq!(resp.header("location"), Some("http://jenkins/queue/item/3/"));
        assert_eq!(resp.header("LOCATION"), Some("http://jenkins/queue/item/3/"));
    }
}
