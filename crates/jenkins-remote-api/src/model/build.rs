use chrono::{
    DateTime,
    Utc,
};

use crate::error::JenkinsResult;
use crate::handle::ResourceHandle;
use crate::transport::PostBody;
use crate::types::{
    BuildInfo,
    ChangeSetItem,
};

/// One execution of a job. Equality is by URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Build {
    handle: ResourceHandle,
}

impl Build {
    pub fn new(handle: ResourceHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }

    pub fn url(&self) -> &str {
        self.handle.url()
    }

    /// Snapshot of the build as of this call
    pub async fn info(&self) -> JenkinsResult<BuildInfo> {
        self.handle.get_api().await
    }

    pub async fn number(&self) -> JenkinsResult<u64> {
        Ok(self.info().await?.number)
    }

    /// `None` while the build is running
    pub async fn result(&self) -> JenkinsResult<Option<String>> {
        Ok(self.info().await?.result)
    }

    pub async fn is_building(&self) -> JenkinsResult<bool> {
        Ok(self.info().await?.building)
    }

    pub async fn start_time(&self) -> JenkinsResult<Option<DateTime<Utc>>> {
        Ok(self.info().await?.start_time())
    }

    pub async fn description(&self) -> JenkinsResult<Option<String>> {
        Ok(self.info().await?.description)
    }

    pub async fn console_output(&self) -> JenkinsResult<String> {
        self.handle.get_text("consoleText").await
    }

    pub async fn changeset(&self) -> JenkinsResult<Vec<ChangeSetItem>> {
        let info = self.info().await?;
        Ok(info.changes().into_iter().cloned().collect())
    }

    /// Requests the running build to stop
    pub async fn abort(&self) -> JenkinsResult<()> {
        self.handle.post("stop", PostBody::Empty).await?;
        tracing::info!(url = self.url(), "Build abort requested");
        Ok(())
    }
}
