use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::document::ConfigDocument;
use crate::error::{
    JenkinsError,
    JenkinsResult,
};
use crate::registry::PluginRegistry;
use crate::transport::{
    with_query,
    Credentials,
    HttpResponse,
    HttpSession,
    PostBody,
};

/// URL-addressed proxy for one remote resource.
///
/// Holds no remote state: every read is a fresh request. Identity is the
/// absolute URL plus the credentials of the shared session.
#[derive(Clone)]
pub struct ResourceHandle {
    url: String,
    session: Arc<dyn HttpSession>,
    registry: Arc<PluginRegistry>,
}

impl ResourceHandle {
    pub fn new(url: &str, session: Arc<dyn HttpSession>, registry: Arc<PluginRegistry>) -> Self {
        Self {
            url: normalize_url(url),
            session,
            registry,
        }
    }

    /// Always ends with `/`
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.session.credentials()
    }

    pub fn session(&self) -> &Arc<dyn HttpSession> {
        &self.session
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Sibling handle for another URL sharing session and registry. No I/O.
    pub fn clone_with_url(&self, url: &str) -> Self {
        Self {
            url: normalize_url(url),
            session: Arc::clone(&self.session),
            registry: Arc::clone(&self.registry),
        }
    }

    /// Handle for a sub-path of this resource
    pub fn child(&self, path: &str) -> Self {
        self.clone_with_url(&self.join(path))
    }

    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.url, path.trim_start_matches('/'))
    }

    /// Handle for the container this resource lives in, e.g. the view or
    /// dashboard holding `.../job/<name>/`
    pub fn parent(&self) -> Option<Self> {
        parent_url(&self.url).map(|url| self.clone_with_url(&url))
    }

    pub async fn get(&self, path: &str) -> JenkinsResult<HttpResponse> {
        let url = self.join(path);
        tracing::debug!(url = %url, "GET");
        self.session.get(&url).await
    }

    pub async fn get_text(&self, path: &str) -> JenkinsResult<String> {
        Ok(self.get(path).await?.body)
    }

    /// Decoded `api/json` of this resource
    pub async fn get_structured_data(&self) -> JenkinsResult<serde_json::Value> {
        self.get_api_with(&[]).await
    }

    pub async fn get_api<T: DeserializeOwned>(&self) -> JenkinsResult<T> {
        self.get_api_with(&[]).await
    }

    /// `api/json` with extra query parameters such as `tree` or `depth`
    pub async fn get_api_with<T: DeserializeOwned>(
        &self, params: &[(&str, &str)],
    ) -> JenkinsResult<T> {
        let url = with_query(&self.join("api/json"), params);
        tracing::debug!(url = %url, "GET");
        let response = self.session.get(&url).await?;
        serde_json::from_str(&response.body)
            .map_err(|e| JenkinsError::Decode(format!("{url}: {e}")))
    }

    pub async fn get_config_document(&self) -> JenkinsResult<ConfigDocument> {
        let xml = self.get_text("config.xml").await?;
        ConfigDocument::parse(&xml)
    }

    /// Replaces the remote configuration wholesale
    pub async fn set_config_document(&self, doc: &ConfigDocument) -> JenkinsResult<()> {
        let xml = doc.to_xml()?;
        self.post("config.xml", PostBody::Xml(xml)).await?;
        Ok(())
    }

    pub async fn post(&self, path: &str, body: PostBody) -> JenkinsResult<HttpResponse> {
        self.post_url(&self.join(path), body).await
    }

    pub async fn post_url(&self, url: &str, body: PostBody) -> JenkinsResult<HttpResponse> {
        tracing::debug!(url = %url, "POST");
        self.session.post(url, body).await
    }
}

impl PartialEq for ResourceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url && self.credentials() == other.credentials()
    }
}

impl Eq for ResourceHandle {}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("url", &self.url)
            .field("credentials", &self.credentials())
            .finish()
    }
}

pub(crate) fn normalize_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Strips a trailing `job/<name>/` or `view/<name>/` segment
pub fn parent_url(url: &str) -> Option<String> {
    let trimmed = url.trim_end_matches('/');
    let (rest, _name) = trimmed.rsplit_once('/')?;
    let (parent, kind) = rest.rsplit_once('/')?;
    match kind {
        "job" | "view" => Some(format!("{parent}/")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSession;

    fn handle(session: &MockSession, url: &str) -> ResourceHandle {
        ResourceHandle::new(url, session.shared(), Arc::new(PluginRegistry::new()))
    }

    #[test]
    fn test_parent_url() {
        assert_eq!(
            parent_url("http://jenkins/job/a/").as_deref(),
            Some("http://jenkins/")
        );
        assert_eq!(
            parent_url("http://jenkins/view/outer/view/inner").as_deref(),
            Some("http://jenkins/view/outer/")
        );
        assert_eq!(parent_url("http://jenkins/"), None);
        assert_eq!(parent_url("http://jenkins/queue/item/4/"), None);
    }

    #[test]
    fn test_clone_preserves_identity_settings() {
        let session = MockSession::new().with_credentials("admin", "token");
        let root = handle(&session, "http://jenkins");
        assert_eq!(root.url(), "http://jenkins/");

        let a = root.clone_with_url("http://jenkins/job/a");
        let b = root.child("job/a/");
        assert_eq!(a, b);
        assert_eq!(a.credentials(), root.credentials());

        let other = MockSession::new().with_credentials("someone", "else");
        assert_ne!(a, handle(&other, "http://jenkins/job/a/"));
    }

    #[tokio::test]
    async fn test_structured_data_decode_error() {
        let session = MockSession::new();
        session.set_get("http://jenkins/job/a/api/json", "{not json");
        let job = handle(&session, "http://jenkins/job/a/");

        let err = job.get_structured_data().await.unwrap_err();
        assert!(matches!(err, JenkinsError::Decode(_)));
    }

    #[tokio::test]
    async fn test_missing_resource_is_transport_error() {
        let session = MockSession::new();
        let job = handle(&session, "http://jenkins/job/gone/");

        let err = job.get_structured_data().await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_set_config_document_posts_xml() {
        let session = MockSession::new();
        session.set_get(
            "http://jenkins/job/a/config.xml",
            "<project><description>x</description></project>",
        );
        let job = handle(&session, "http://jenkins/job/a/");

        let mut doc = job.get_config_document().await.unwrap();
        doc.set_description("y");
        job.set_config_document(&doc).await.unwrap();

        let posts = session.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].url, "http://jenkins/job/a/config.xml");
        assert_eq!(
            posts[0].body,
            PostBody::Xml("<project><description>y</description></project>".to_string())
        );
    }
}
