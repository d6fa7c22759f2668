//! Response schemas for the `api/json` endpoints

use chrono::{
    DateTime,
    TimeZone,
    Utc,
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JenkinsSummary {
    #[serde(rename = "_class")]
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(rename = "nodeDescription")]
    #[serde(default)]
    pub node_description: Option<String>,
    #[serde(rename = "quietingDown")]
    #[serde(default)]
    pub quieting_down: bool,
    #[serde(rename = "primaryView")]
    #[serde(default)]
    pub primary_view: Option<ViewRef>,
    #[serde(default)]
    pub views: Vec<ViewRef>,
    #[serde(default)]
    pub jobs: Vec<JobRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViewRef {
    #[serde(rename = "_class")]
    #[serde(default)]
    pub class: Option<String>,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobRef {
    #[serde(rename = "_class")]
    #[serde(default)]
    pub class: Option<String>,
    pub name: String,
    pub url: String,
    /// Ball color, e.g. `blue`, `red_anime`, `disabled`
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewSummary {
    #[serde(rename = "_class")]
    #[serde(default)]
    pub class: Option<String>,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub jobs: Vec<JobRef>,
    /// Only reported by views that contain other views
    #[serde(default)]
    pub views: Vec<ViewRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildLink {
    pub number: u64,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobSummary {
    #[serde(rename = "_class")]
    #[serde(default)]
    pub class: Option<String>,
    pub name: String,
    pub url: String,
    #[serde(rename = "fullName")]
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub buildable: Option<bool>,
    #[serde(rename = "inQueue")]
    #[serde(default)]
    pub in_queue: bool,
    #[serde(rename = "nextBuildNumber")]
    #[serde(default)]
    pub next_build_number: Option<u64>,
    #[serde(default)]
    pub builds: Vec<BuildLink>,
    #[serde(rename = "lastBuild")]
    #[serde(default)]
    pub last_build: Option<BuildLink>,
    #[serde(rename = "lastCompletedBuild")]
    #[serde(default)]
    pub last_completed_build: Option<BuildLink>,
    #[serde(rename = "lastFailedBuild")]
    #[serde(default)]
    pub last_failed_build: Option<BuildLink>,
    #[serde(rename = "lastStableBuild")]
    #[serde(default)]
    pub last_stable_build: Option<BuildLink>,
    #[serde(rename = "lastSuccessfulBuild")]
    #[serde(default)]
    pub last_successful_build: Option<BuildLink>,
    #[serde(rename = "lastUnsuccessfulBuild")]
    #[serde(default)]
    pub last_unsuccessful_build: Option<BuildLink>,
    #[serde(rename = "downstreamProjects")]
    #[serde(default)]
    pub downstream_projects: Vec<JobRef>,
    #[serde(rename = "upstreamProjects")]
    #[serde(default)]
    pub upstream_projects: Vec<JobRef>,
}

impl JobSummary {
    pub fn is_disabled(&self) -> bool {
        self.color.as_deref() == Some("disabled") || self.buildable == Some(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildInfo {
    pub number: u64,
    #[serde(default)]
    pub id: Option<String>,
    pub url: String,
    /// `None` while the build is still running
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub building: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "displayName")]
    #[serde(default)]
    pub display_name: Option<String>,
    /// Milliseconds since the epoch
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Milliseconds
    #[serde(default)]
    pub duration: u64,
    #[serde(rename = "changeSet")]
    #[serde(default)]
    pub change_set: Option<ChangeSet>,
    #[serde(rename = "changeSets")]
    #[serde(default)]
    pub change_sets: Vec<ChangeSet>,
}

impl BuildInfo {
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }

    /// All change entries; freestyle builds report `changeSet`, pipelines `changeSets`
    pub fn changes(&self) -> Vec<&ChangeSetItem> {
        self.change_set
            .iter()
            .chain(self.change_sets.iter())
            .flat_map(|cs| cs.items.iter())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangeSet {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub items: Vec<ChangeSetItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangeSetItem {
    #[serde(rename = "commitId")]
    #[serde(default)]
    pub commit_id: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(rename = "affectedPaths")]
    #[serde(default)]
    pub affected_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Author {
    #[serde(rename = "fullName")]
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskRef {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueueItemInfo {
    #[serde(rename = "_class")]
    #[serde(default)]
    pub class: Option<String>,
    pub id: u64,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub buildable: bool,
    #[serde(default)]
    pub stuck: bool,
    /// Only reported once the item has left the queue
    #[serde(default)]
    pub cancelled: Option<bool>,
    #[serde(default)]
    pub why: Option<String>,
    #[serde(rename = "inQueueSince")]
    #[serde(default)]
    pub in_queue_since: Option<i64>,
    #[serde(default)]
    pub task: Option<TaskRef>,
    #[serde(default)]
    pub executable: Option<BuildLink>,
}

impl QueueItemInfo {
    /// Still inside its quiet period
    pub fn is_waiting(&self) -> bool {
        self.class
            .as_deref()
            .is_some_and(|c| c.ends_with("$WaitingItem"))
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueSummary {
    #[serde(default)]
    pub items: Vec<QueueItemInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeSummary {
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(default)]
    pub offline: bool,
    #[serde(rename = "temporarilyOffline")]
    #[serde(default)]
    pub temporarily_offline: bool,
    #[serde(default)]
    pub idle: bool,
    #[serde(rename = "numExecutors")]
    #[serde(default)]
    pub num_executors: u32,
    #[serde(rename = "offlineCauseReason")]
    #[serde(default)]
    pub offline_cause_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComputerSet {
    #[serde(default)]
    pub computer: Vec<NodeSummary>,
}
