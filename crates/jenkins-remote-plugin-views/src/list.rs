use std::any::Any;

use jenkins_remote_api::transport::with_query;
use jenkins_remote_api::{
    JenkinsResult,
    Namespace,
    PluginCapabilities,
    PluginMetadata,
    PostBody,
    View,
    ViewPlugin,
    ViewPluginType,
};

pub const TYPE_TOKEN: &str = "hudson.model.ListView";

const INCLUDE_REGEX: &str = "includeRegex";
const JOB_NAMES: &str = "jobNames";

/// View showing an explicit set of jobs, optionally widened by a regex
#[derive(Debug, Clone)]
pub struct ListView {
    view: View,
}

impl ListView {
    /// Regex selecting jobs in addition to the explicit list
    pub async fn include_regex(&self) -> JenkinsResult<Option<String>> {
        let doc = self.view.config_xml().await?;
        Ok(doc.get(INCLUDE_REGEX).filter(|r| !r.is_empty()))
    }

    /// `None` removes the regex filter
    pub async fn set_include_regex(&self, regex: Option<&str>) -> JenkinsResult<()> {
        let mut doc = self.view.config_xml().await?;
        match regex {
            Some(regex) => doc.set(INCLUDE_REGEX, regex),
            None => {
                doc.root_mut().remove_children(INCLUDE_REGEX);
            }
        }
        self.view.set_config_xml(&doc).await?;
        tracing::info!(url = self.view.url(), regex, "List view filter updated");
        Ok(())
    }

    /// Job names explicitly selected in the view configuration
    pub async fn listed_job_names(&self) -> JenkinsResult<Vec<String>> {
        let doc = self.view.config_xml().await?;
        Ok(doc
            .root()
            .child(JOB_NAMES)
            .map(|names| {
                names
                    .children_named("string")
                    .map(|n| n.text())
                    .collect()
            })
            .unwrap_or_default())
    }

    pub async fn add_job(&self, name: &str) -> JenkinsResult<()> {
        self.post_job_change("addJobToView", name).await
    }

    pub async fn remove_job(&self, name: &str) -> JenkinsResult<()> {
        self.post_job_change("removeJobFromView", name).await
    }

    async fn post_job_change(&self, action: &str, name: &str) -> JenkinsResult<()> {
        let handle = self.view.handle();
        let url = with_query(&handle.join(action), &[("name", name)]);
        handle.post_url(&url, PostBody::Empty).await?;
        tracing::debug!(url = self.view.url(), action, job = name, "List view job list changed");
        Ok(())
    }
}

impl ViewPlugin for ListView {
    fn view(&self) -> &View {
        &self.view
    }

    fn type_token(&self) -> &str {
        TYPE_TOKEN
    }

    fn capabilities(&self) -> PluginCapabilities {
        PluginCapabilities::NONE
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ViewPluginType for ListView {
    fn metadata() -> PluginMetadata {
        PluginMetadata {
            name: "List View",
            namespace: Namespace::View,
            type_token: TYPE_TOKEN,
            aliases: &["listview"],
            description: "Shows a selected list of jobs",
            capabilities: PluginCapabilities::NONE,
        }
    }

    fn from_view(view: View) -> Self {
        Self { view }
    }
}
