use crate::error::JenkinsResult;
use crate::handle::ResourceHandle;
use crate::poll::{
    WaitOutcome,
    WaitPolicy,
};
use crate::transport::PostBody;
use crate::types::NodeSummary;

/// URL path segment of a node below `computer/`
pub fn node_path(name: &str) -> String {
    match name {
        "master" | "(master)" | "built-in" | "(built-in)" | "Built-In Node" => {
            "computer/(master)/".to_string()
        }
        other => format!("computer/{}/", urlencoding::encode(other)),
    }
}

/// A build agent managed by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    handle: ResourceHandle,
}

impl Node {
    pub fn new(handle: ResourceHandle) -> Self {
        Self { handle }
    }

    pub fn url(&self) -> &str {
        self.handle.url()
    }

    pub async fn summary(&self) -> JenkinsResult<NodeSummary> {
        self.handle.get_api().await
    }

    pub async fn name(&self) -> JenkinsResult<String> {
        Ok(self.summary().await?.display_name)
    }

    pub async fn is_offline(&self) -> JenkinsResult<bool> {
        Ok(self.summary().await?.offline)
    }

    pub async fn is_idle(&self) -> JenkinsResult<bool> {
        Ok(self.summary().await?.idle)
    }

    pub async fn number_of_executors(&self) -> JenkinsResult<u32> {
        Ok(self.summary().await?.num_executors)
    }

    pub async fn offline_reason(&self) -> JenkinsResult<Option<String>> {
        Ok(self.summary().await?.offline_cause_reason)
    }

    /// Flips the temporarily-offline flag; `message` is shown when going offline
    pub async fn toggle_offline(&self, message: Option<&str>) -> JenkinsResult<()> {
        let body = PostBody::form([("offlineMessage", message.unwrap_or_default())]);
        self.handle.post("toggleOffline", body).await?;
        tracing::info!(url = self.url(), "Node offline state toggled");
        Ok(())
    }

    /// Polls until every executor is idle
    pub async fn wait_for_idle(&self, policy: WaitPolicy) -> JenkinsResult<WaitOutcome> {
        policy.wait_until(|| self.is_idle()).await
    }
}
