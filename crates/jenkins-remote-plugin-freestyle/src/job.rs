use std::any::Any;

use jenkins_remote_api::{
    ConfigDocument,
    JenkinsResult,
    Job,
    JobPlugin,
    JobPluginType,
    Namespace,
    PluginCapabilities,
    PluginMetadata,
    XmlPlugin,
};

pub const TYPE_TOKEN: &str = "hudson.model.FreeStyleProject";

const CAPABILITIES: PluginCapabilities = PluginCapabilities {
    sub_views: false,
    scm: true,
    custom_workspace: true,
    builders: true,
    publishers: true,
    triggers: true,
};

const TEMPLATE: &str = r#"<project>
  <actions/>
  <description/>
  <keepDependencies>false</keepDependencies>
  <properties/>
  <scm class="hudson.scm.NullSCM"/>
  <canRoam>true</canRoam>
  <disabled>false</disabled>
  <blockBuildWhenDownstreamBuilding>false</blockBuildWhenDownstreamBuilding>
  <blockBuildWhenUpstreamBuilding>false</blockBuildWhenUpstreamBuilding>
  <triggers/>
  <concurrentBuild>false</concurrentBuild>
  <builders/>
  <publishers/>
  <buildWrappers/>
</project>"#;

/// Job of type "Freestyle project".
///
/// Every accessor reads a fresh `config.xml`; every mutator re-fetches the
/// document, edits it and posts it back whole.
#[derive(Debug, Clone)]
pub struct FreestyleJob {
    job: Job,
}

impl FreestyleJob {
    pub async fn scm(&self) -> JenkinsResult<Option<Box<dyn XmlPlugin>>> {
        let doc = self.job.config_xml().await?;
        doc.scm(self.job.handle().registry())
    }

    pub async fn set_scm(&self, scm: &dyn XmlPlugin) -> JenkinsResult<()> {
        self.edit_config(|doc| {
            doc.set_scm(scm);
            Ok(())
        })
        .await
    }

    pub async fn custom_workspace(&self) -> JenkinsResult<Option<String>> {
        Ok(self.job.config_xml().await?.custom_workspace())
    }

    /// An empty path restores the default workspace
    pub async fn set_custom_workspace(&self, path: &str) -> JenkinsResult<()> {
        self.edit_config(|doc| {
            doc.set_custom_workspace(path);
            Ok(())
        })
        .await
    }

    /// Build steps in execution order
    pub async fn builders(&self) -> JenkinsResult<Vec<Box<dyn XmlPlugin>>> {
        let doc = self.job.config_xml().await?;
        doc.builders(self.job.handle().registry())
    }

    /// Appends a build step after the existing ones
    pub async fn add_builder(&self, builder: &dyn XmlPlugin) -> JenkinsResult<()> {
        self.edit_config(|doc| {
            doc.append_builder(builder);
            Ok(())
        })
        .await
    }

    /// Writes back an edited copy of the `index`-th build step
    pub async fn update_builder(
        &self, index: usize, builder: &dyn XmlPlugin,
    ) -> JenkinsResult<()> {
        self.edit_config(|doc| doc.replace_builder(index, builder)).await
    }

    pub async fn publishers(&self) -> JenkinsResult<Vec<Box<dyn XmlPlugin>>> {
        let doc = self.job.config_xml().await?;
        doc.publishers(self.job.handle().registry())
    }

    pub async fn add_publisher(&self, publisher: &dyn XmlPlugin) -> JenkinsResult<()> {
        self.edit_config(|doc| {
            doc.append_publisher(publisher);
            Ok(())
        })
        .await
    }

    pub async fn update_publisher(
        &self, index: usize, publisher: &dyn XmlPlugin,
    ) -> JenkinsResult<()> {
        self.edit_config(|doc| doc.replace_publisher(index, publisher)).await
    }

    pub async fn triggers(&self) -> JenkinsResult<Vec<Box<dyn XmlPlugin>>> {
        let doc = self.job.config_xml().await?;
        doc.triggers(self.job.handle().registry())
    }

    pub async fn add_trigger(&self, trigger: &dyn XmlPlugin) -> JenkinsResult<()> {
        self.edit_config(|doc| {
            doc.append_trigger(trigger);
            Ok(())
        })
        .await
    }

    async fn edit_config<F>(&self, edit: F) -> JenkinsResult<()>
    where
        F: FnOnce(&mut ConfigDocument) -> JenkinsResult<()>,
    {
        let mut doc = self.job.config_xml().await?;
        edit(&mut doc)?;
        self.job.set_config_xml(&doc).await?;
        tracing::debug!(url = self.job.url(), "Freestyle job config updated");
        Ok(())
    }
}

impl JobPlugin for FreestyleJob {
    fn job(&self) -> &Job {
        &self.job
    }

    fn type_token(&self) -> &str {
        TYPE_TOKEN
    }

    fn capabilities(&self) -> PluginCapabilities {
        CAPABILITIES
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl JobPluginType for FreestyleJob {
    fn metadata() -> PluginMetadata {
        PluginMetadata {
            name: "Freestyle project",
            namespace: Namespace::Job,
            type_token: TYPE_TOKEN,
            aliases: &["project", "freestyle"],
            description: "General purpose job with SCM, build steps and publishers",
            capabilities: CAPABILITIES,
        }
    }

    fn from_job(job: Job) -> Self {
        Self { job }
    }

    fn template_config_xml() -> Option<String> {
        Some(TEMPLATE.to_string())
    }
}
