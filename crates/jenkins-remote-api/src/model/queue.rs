use crate::error::{
    JenkinsError,
    JenkinsResult,
};
use crate::handle::ResourceHandle;
use crate::model::{
    Build,
    Job,
};
use crate::poll::{
    WaitOutcome,
    WaitPolicy,
};
use crate::transport::{
    with_query,
    PostBody,
};
use crate::types::{
    QueueItemInfo,
    QueueSummary,
};

const ITEM_SEGMENT: &str = "queue/item/";

/// The server build queue at `<root>/queue/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Queue {
    handle: ResourceHandle,
}

impl Queue {
    pub fn new(handle: ResourceHandle) -> Self {
        Self { handle }
    }

    pub fn url(&self) -> &str {
        self.handle.url()
    }

    /// Items currently queued
    pub async fn items(&self) -> JenkinsResult<Vec<QueueItem>> {
        let summary: QueueSummary = self.handle.get_api().await?;
        Ok(summary
            .items
            .into_iter()
            .map(|item| self.item(item.id))
            .collect())
    }

    /// Handle for a queue item id; no I/O
    pub fn item(&self, id: u64) -> QueueItem {
        QueueItem::new(self.handle.child(&format!("item/{id}/")))
    }
}

/// A pending build request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    handle: ResourceHandle,
}

impl QueueItem {
    pub fn new(handle: ResourceHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }

    pub fn url(&self) -> &str {
        self.handle.url()
    }

    /// Snapshot of the item as of this call
    pub async fn info(&self) -> JenkinsResult<QueueItemInfo> {
        self.handle.get_api().await
    }

    pub async fn id(&self) -> JenkinsResult<u64> {
        Ok(self.info().await?.id)
    }

    /// Still inside the job's quiet period
    pub async fn waiting(&self) -> JenkinsResult<bool> {
        Ok(self.info().await?.is_waiting())
    }

    pub async fn cancelled(&self) -> JenkinsResult<bool> {
        Ok(self.info().await?.is_cancelled())
    }

    pub async fn stuck(&self) -> JenkinsResult<bool> {
        Ok(self.info().await?.stuck)
    }

    pub async fn blocked(&self) -> JenkinsResult<bool> {
        Ok(self.info().await?.blocked)
    }

    /// Why the item is still queued, as reported by the server
    pub async fn reason(&self) -> JenkinsResult<Option<String>> {
        Ok(self.info().await?.why)
    }

    /// Job this item will build
    pub async fn job(&self) -> JenkinsResult<Option<Job>> {
        Ok(self
            .info()
            .await?
            .task
            .map(|task| Job::new(self.handle.clone_with_url(&task.url))))
    }

    /// Build started from this item; `None` until an executor picks it up
    pub async fn build(&self) -> JenkinsResult<Option<Build>> {
        Ok(self
            .info()
            .await?
            .executable
            .map(|exec| Build::new(self.handle.clone_with_url(&exec.url))))
    }

    pub async fn cancel(&self) -> JenkinsResult<()> {
        let id = self.id().await?;
        let root = self.root_url()?;
        let url = with_query(&format!("{root}queue/cancelItem"), &[("id", &id.to_string())]);
        self.handle.post_url(&url, PostBody::Empty).await?;
        tracing::info!(id, "Queue item cancelled");
        Ok(())
    }

    /// Polls until a build is assigned or the item is cancelled
    pub async fn wait_for_build(&self, policy: WaitPolicy) -> JenkinsResult<Option<Build>> {
        let outcome = policy
            .wait_until(|| async {
                let info = self.info().await?;
                Ok(info.executable.is_some() || info.is_cancelled())
            })
            .await?;

        match outcome {
            WaitOutcome::Satisfied => self.build().await,
            WaitOutcome::TimedOut => Ok(None),
        }
    }

    fn root_url(&self) -> JenkinsResult<String> {
        self.url()
            .find(ITEM_SEGMENT)
            .map(|idx| self.url()[..idx].to_string())
            .ok_or_else(|| {
                JenkinsError::InvalidConfig(format!("{} is not a queue item URL", self.url()))
            })
    }
}
