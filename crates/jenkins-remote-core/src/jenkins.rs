//! Entry point: the server dashboard at the root URL

use std::sync::Arc;
use std::time::Duration;

use jenkins_remote_api::model::{
    job_path,
    node_path,
    walk_views,
};
use jenkins_remote_api::types::{
    ComputerSet,
    JenkinsSummary,
};
use jenkins_remote_api::{
    Credentials,
    HttpSession,
    JenkinsError,
    JenkinsResult,
    Job,
    JobPlugin,
    Namespace,
    Node,
    PluginRegistry,
    PostBody,
    Queue,
    ResourceHandle,
    View,
    ViewPlugin,
};

use crate::config::CredentialConfig;
use crate::plugins::create_plugin_registry;
use crate::transport::{
    ReqwestSession,
    DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_REQUEST_TIMEOUT,
};

const VERSION_HEADER: &str = "x-jenkins";

/// Connection parameters for [`Jenkins`]
#[derive(Debug)]
pub struct JenkinsBuilder {
    url: String,
    credentials: Option<Credentials>,
    ssl_verify: Option<bool>,
    request_timeout: Duration,
    connect_timeout: Duration,
    registry: Option<PluginRegistry>,
    use_config_file: bool,
}

impl JenkinsBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            credentials: None,
            ssl_verify: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            registry: None,
            use_config_file: true,
        }
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Certificates are not verified unless enabled here or in the config file
    pub fn ssl_verify(mut self, verify: bool) -> Self {
        self.ssl_verify = Some(verify);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Replaces the bundled plugin registry
    pub fn registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Skips the credential config file lookup
    pub fn without_config_file(mut self) -> Self {
        self.use_config_file = false;
        self
    }

    /// Resolves credentials (explicit, then config file, then anonymous) and
    /// builds the HTTP session. No request is sent.
    pub fn build(self) -> JenkinsResult<Jenkins> {
        let entry = if self.use_config_file && self.credentials.is_none() {
            CredentialConfig::load_default()?
                .and_then(|config| config.find_server(&self.url).cloned())
        } else {
            None
        };

        let credentials = self
            .credentials
            .or_else(|| entry.as_ref().and_then(|e| e.credentials()));
        let ssl_verify = self
            .ssl_verify
            .or_else(|| entry.as_ref().and_then(|e| e.ssl_verify))
            .unwrap_or(false);

        tracing::debug!(
            url = %self.url,
            authenticated = credentials.is_some(),
            ssl_verify,
            "Connecting"
        );

        let session = ReqwestSession::new(
            credentials,
            ssl_verify,
            self.request_timeout,
            self.connect_timeout,
        )?;
        let registry = match self.registry {
            Some(registry) => registry,
            None => create_plugin_registry()?,
        };

        Ok(Jenkins::from_session(
            &self.url,
            Arc::new(session),
            Arc::new(registry),
        ))
    }
}

/// Root handle for one server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jenkins {
    handle: ResourceHandle,
}

impl Jenkins {
    pub fn builder(url: impl Into<String>) -> JenkinsBuilder {
        JenkinsBuilder::new(url)
    }

    /// Connects with `credentials`, or whatever the credential config file
    /// holds for `url` when `None`
    pub fn connect(url: &str, credentials: Option<Credentials>) -> JenkinsResult<Self> {
        let builder = JenkinsBuilder::new(url);
        match credentials {
            Some(credentials) => builder.credentials(credentials).build(),
            None => builder.build(),
        }
    }

    pub fn from_session(
        url: &str, session: Arc<dyn HttpSession>, registry: Arc<PluginRegistry>,
    ) -> Self {
        Self {
            handle: ResourceHandle::new(url, session, registry),
        }
    }

    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }

    pub fn url(&self) -> &str {
        self.handle.url()
    }

    pub fn registry(&self) -> &PluginRegistry {
        self.handle.registry()
    }

    pub async fn summary(&self) -> JenkinsResult<JenkinsSummary> {
        self.handle.get_api().await
    }

    /// True when the URL answers like a Jenkins server (`X-Jenkins` header)
    pub async fn connected(&self) -> bool {
        match self.handle.get("api/json").await {
            Ok(response) => response.header(VERSION_HEADER).is_some(),
            Err(e) => {
                tracing::error!(url = self.url(), error = %e, "Jenkins connection failed");
                false
            }
        }
    }

    pub async fn version(&self) -> JenkinsResult<String> {
        let response = self.handle.get("api/json").await?;
        response
            .header(VERSION_HEADER)
            .map(str::to_string)
            .ok_or_else(|| {
                JenkinsError::Decode(format!("{} sent no X-Jenkins header", self.url()))
            })
    }

    /// In quiet-down mode: running builds finish, new ones do not start
    pub async fn is_shutting_down(&self) -> JenkinsResult<bool> {
        Ok(self.summary().await?.quieting_down)
    }

    pub async fn prepare_shutdown(&self) -> JenkinsResult<()> {
        self.handle.post("quietDown", PostBody::Empty).await?;
        tracing::info!(url = self.url(), "Shutdown prepared");
        Ok(())
    }

    pub async fn cancel_shutdown(&self) -> JenkinsResult<()> {
        self.handle.post("cancelQuietDown", PostBody::Empty).await?;
        tracing::info!(url = self.url(), "Shutdown cancelled");
        Ok(())
    }

    /// Build agents, the built-in node included
    pub async fn nodes(&self) -> JenkinsResult<Vec<Node>> {
        let computers: ComputerSet = self.handle.child("computer/").get_api().await?;
        Ok(computers
            .computer
            .iter()
            .map(|c| Node::new(self.handle.child(&node_path(&c.display_name))))
            .collect())
    }

    /// `None` when no agent of that name exists
    pub async fn find_node(&self, name: &str) -> JenkinsResult<Option<Node>> {
        let node = Node::new(self.handle.child(&node_path(name)));
        match node.summary().await {
            Ok(_) => Ok(Some(node)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// View shown on the dashboard root
    pub async fn default_view(&self) -> JenkinsResult<Option<View>> {
        Ok(self
            .summary()
            .await?
            .primary_view
            .map(|v| View::from_ref(&self.handle, &v)))
    }

    /// Top-level views only; see [`all_views`](Self::all_views)
    pub async fn views(&self) -> JenkinsResult<Vec<View>> {
        Ok(self
            .summary()
            .await?
            .views
            .iter()
            .map(|v| View::from_ref(&self.handle, v))
            .collect())
    }

    /// Every view, descending into views that hold sub-views
    pub async fn all_views(&self) -> JenkinsResult<Vec<View>> {
        let summary = self.summary().await?;
        walk_views(&self.handle, summary.views, None).await
    }

    /// Depth-first search through nested views
    pub async fn find_view(&self, name: &str) -> JenkinsResult<Option<View>> {
        let summary = self.summary().await?;
        let found = walk_views(&self.handle, summary.views, Some(name)).await?;
        Ok(found.into_iter().next())
    }

    pub async fn jobs(&self) -> JenkinsResult<Vec<Job>> {
        Ok(self
            .summary()
            .await?
            .jobs
            .iter()
            .map(|j| Job::new(self.handle.clone_with_url(&j.url)))
            .collect())
    }

    pub async fn find_job(&self, name: &str) -> JenkinsResult<Option<Job>> {
        Ok(self
            .summary()
            .await?
            .jobs
            .into_iter()
            .find(|j| j.name == name)
            .map(|j| Job::new(self.handle.clone_with_url(&j.url))))
    }

    /// View proxy for an absolute URL; no I/O
    pub fn get_view(&self, url: &str) -> View {
        View::new(self.handle.clone_with_url(url))
    }

    /// Job proxy for an absolute URL; no I/O
    pub fn get_job(&self, url: &str) -> Job {
        Job::new(self.handle.clone_with_url(url))
    }

    /// Creates a top-level view; `view_type` may be a qualified name or alias
    pub async fn create_view(
        &self, name: &str, view_type: &str,
    ) -> JenkinsResult<Box<dyn ViewPlugin>> {
        let view = View::create(&self.handle, name, view_type).await?;
        let token = self.canonical(Namespace::View, view_type);
        Ok(self.registry().resolve_view(token, view))
    }

    /// Creates a job from its type's template config; the job starts disabled
    pub async fn create_job(
        &self, name: &str, job_type: &str,
    ) -> JenkinsResult<Box<dyn JobPlugin>> {
        let template = self.registry().template_xml(Namespace::Job, job_type)?;
        let job = Job::create(&self.handle, name, template).await?;
        let token = self.canonical(Namespace::Job, job_type);
        Ok(self.registry().resolve_job(token, job))
    }

    /// Copies a top-level job; the copy starts disabled
    pub async fn clone_job(&self, source: &str, new_name: &str) -> JenkinsResult<Job> {
        let job = Job::new(self.handle.child(&job_path(source)));
        job.clone_as(new_name).await
    }

    pub fn build_queue(&self) -> Queue {
        Queue::new(self.handle.child("queue/"))
    }

    /// View types this client can wrap, qualified names sorted
    pub fn view_types(&self) -> Vec<&'static str> {
        self.registry().supported_types(Namespace::View)
    }

    pub fn job_types(&self) -> Vec<&'static str> {
        self.registry().supported_types(Namespace::Job)
    }

    /// Default XML a registered plugin produces for new instances
    pub fn get_plugin_template(&self, namespace: Namespace, token: &str) -> JenkinsResult<String> {
        self.registry().template_xml(namespace, token)
    }

    fn canonical<'a>(&self, namespace: Namespace, token: &'a str) -> &'a str {
        self.registry()
            .canonical_token(namespace, token)
            .unwrap_or(token)
    }
}
