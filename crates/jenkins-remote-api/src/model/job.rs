use std::collections::HashSet;

use chrono::{
    DateTime,
    Utc,
};
use serde::Deserialize;

use crate::document::ConfigDocument;
use crate::error::{
    JenkinsError,
    JenkinsResult,
};
use crate::handle::ResourceHandle;
use crate::model::{
    Build,
    QueueItem,
};
use crate::plugin::JobPlugin;
use crate::transport::{
    with_query,
    PostBody,
};
use crate::types::{
    BuildLink,
    JobRef,
    JobSummary,
};

#[derive(Debug, Deserialize)]
struct AllBuilds {
    #[serde(rename = "allBuilds")]
    #[serde(default)]
    all_builds: Vec<BuildLink>,
}

/// Path of a job below its parent container
pub fn job_path(name: &str) -> String {
    format!("job/{}/", urlencoding::encode(name))
}

/// Base job proxy; type-specific behavior lives in the registered [`JobPlugin`]s
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    handle: ResourceHandle,
}

impl Job {
    pub fn new(handle: ResourceHandle) -> Self {
        Self { handle }
    }

    /// Posts `config_xml` to `<parent>/createItem`, verifies the new job and
    /// leaves it disabled
    pub async fn create(
        parent: &ResourceHandle, name: &str, config_xml: String,
    ) -> JenkinsResult<Job> {
        let url = with_query(&parent.join("createItem"), &[("name", name)]);
        parent.post_url(&url, PostBody::Xml(config_xml)).await?;

        let job = Job::new(parent.child(&job_path(name)));
        job.verify_name(name).await?;
        job.disable().await?;
        tracing::info!(name, url = job.url(), "Job created");
        Ok(job)
    }

    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }

    pub fn url(&self) -> &str {
        self.handle.url()
    }

    pub async fn summary(&self) -> JenkinsResult<JobSummary> {
        self.handle.get_api().await
    }

    pub async fn name(&self) -> JenkinsResult<String> {
        Ok(self.summary().await?.name)
    }

    pub async fn description(&self) -> JenkinsResult<Option<String>> {
        Ok(self.summary().await?.description)
    }

    pub async fn is_disabled(&self) -> JenkinsResult<bool> {
        Ok(self.summary().await?.is_disabled())
    }

    /// Server-reported class, falling back to the config root element
    pub async fn type_token(&self) -> JenkinsResult<String> {
        match self.summary().await?.class {
            Some(class) => Ok(class),
            None => Ok(self.config_xml().await?.type_token().to_string()),
        }
    }

    /// Wraps this job in its registered plugin type
    pub async fn resolve(&self) -> JenkinsResult<Box<dyn JobPlugin>> {
        let token = self.type_token().await?;
        Ok(self.handle.registry().resolve_job(&token, self.clone()))
    }

    pub async fn enable(&self) -> JenkinsResult<()> {
        self.handle.post("enable", PostBody::Empty).await?;
        tracing::debug!(url = self.url(), "Job enabled");
        Ok(())
    }

    pub async fn disable(&self) -> JenkinsResult<()> {
        self.handle.post("disable", PostBody::Empty).await?;
        tracing::debug!(url = self.url(), "Job disabled");
        Ok(())
    }

    pub async fn delete(&self) -> JenkinsResult<()> {
        self.handle.post("doDelete", PostBody::Empty).await?;
        tracing::info!(url = self.url(), "Job deleted");
        Ok(())
    }

    /// Enqueues a build without waiting for it to start.
    ///
    /// Returns the queue item when the server reports one in `Location`.
    pub async fn start_build(&self) -> JenkinsResult<Option<QueueItem>> {
        let response = self.handle.post("build", PostBody::Empty).await?;
        Ok(self.queue_item_from(response.header("location")))
    }

    pub async fn start_build_with_parameters(
        &self, params: &[(&str, &str)],
    ) -> JenkinsResult<Option<QueueItem>> {
        let body = PostBody::form(params.iter().copied());
        let response = self.handle.post("buildWithParameters", body).await?;
        Ok(self.queue_item_from(response.header("location")))
    }

    fn queue_item_from(&self, location: Option<&str>) -> Option<QueueItem> {
        location
            .filter(|loc| loc.contains("/queue/item/"))
            .map(|loc| QueueItem::new(self.handle.clone_with_url(loc)))
    }

    /// Builds listed in the job summary, newest first
    pub async fn recent_builds(&self) -> JenkinsResult<Vec<Build>> {
        let summary = self.summary().await?;
        Ok(self.builds_from(summary.builds))
    }

    /// Every retained build, newest first
    pub async fn all_builds(&self) -> JenkinsResult<Vec<Build>> {
        let data: AllBuilds = self
            .handle
            .get_api_with(&[("tree", "allBuilds[number,url]")])
            .await?;
        Ok(self.builds_from(data.all_builds))
    }

    pub async fn last_build(&self) -> JenkinsResult<Option<Build>> {
        Ok(self.build_from(self.summary().await?.last_build))
    }

    pub async fn last_good_build(&self) -> JenkinsResult<Option<Build>> {
        Ok(self.build_from(self.summary().await?.last_successful_build))
    }

    pub async fn last_failed_build(&self) -> JenkinsResult<Option<Build>> {
        Ok(self.build_from(self.summary().await?.last_failed_build))
    }

    pub async fn last_stable_build(&self) -> JenkinsResult<Option<Build>> {
        Ok(self.build_from(self.summary().await?.last_stable_build))
    }

    pub async fn last_unsuccessful_build(&self) -> JenkinsResult<Option<Build>> {
        Ok(self.build_from(self.summary().await?.last_unsuccessful_build))
    }

    pub async fn last_completed_build(&self) -> JenkinsResult<Option<Build>> {
        Ok(self.build_from(self.summary().await?.last_completed_build))
    }

    pub async fn get_build_by_number(&self, number: u64) -> JenkinsResult<Option<Build>> {
        let data: AllBuilds = self
            .handle
            .get_api_with(&[("tree", "allBuilds[number,url]")])
            .await?;
        Ok(self.build_from(data.all_builds.into_iter().find(|b| b.number == number)))
    }

    /// Builds started within `[start, end]`, newest first
    pub async fn builds_in_time_range(
        &self, start: DateTime<Utc>, end: DateTime<Utc>,
    ) -> JenkinsResult<Vec<Build>> {
        let mut builds = Vec::new();
        for build in self.recent_builds().await? {
            let Some(started) = build.start_time().await? else {
                continue;
            };
            if started < start {
                break;
            }
            if started <= end {
                builds.push(build);
            }
        }
        Ok(builds)
    }

    pub async fn downstream_jobs(&self, recursive: bool) -> JenkinsResult<Vec<Job>> {
        self.related_jobs(recursive, |s| s.downstream_projects).await
    }

    pub async fn upstream_jobs(&self, recursive: bool) -> JenkinsResult<Vec<Job>> {
        self.related_jobs(recursive, |s| s.upstream_projects).await
    }

    /// Depth-first walk of the dependency graph, each job reported once
    async fn related_jobs(
        &self, recursive: bool, edges: fn(JobSummary) -> Vec<JobRef>,
    ) -> JenkinsResult<Vec<Job>> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();
        seen.insert(self.url().to_string());
        let mut stack = vec![self.clone()];

        while let Some(job) = stack.pop() {
            for next in edges(job.summary().await?) {
                let next = Job::new(self.handle.clone_with_url(&next.url));
                if !seen.insert(next.url().to_string()) {
                    continue;
                }
                if recursive {
                    stack.push(next.clone());
                }
                found.push(next);
            }
        }
        Ok(found)
    }

    /// `None` when the job uses the server default
    pub async fn quiet_period(&self) -> JenkinsResult<Option<u32>> {
        self.config_xml().await?.quiet_period()
    }

    pub async fn set_quiet_period(&self, seconds: u32) -> JenkinsResult<()> {
        let mut doc = self.config_xml().await?;
        doc.set_quiet_period(seconds);
        self.set_config_xml(&doc).await
    }

    pub async fn config_xml(&self) -> JenkinsResult<ConfigDocument> {
        self.handle.get_config_document().await
    }

    pub async fn set_config_xml(&self, doc: &ConfigDocument) -> JenkinsResult<()> {
        self.handle.set_config_document(doc).await
    }

    /// Copies this job under a new name next to it; the copy is left disabled
    pub async fn clone_as(&self, new_name: &str) -> JenkinsResult<Job> {
        let parent = self.handle.parent().ok_or_else(|| {
            JenkinsError::InvalidConfig(format!("cannot derive parent of {}", self.url()))
        })?;
        let source = self.name().await?;

        let url = with_query(
            &parent.join("createItem"),
            &[("name", new_name), ("mode", "copy"), ("from", &source)],
        );
        parent.post_url(&url, PostBody::Empty).await?;

        let job = Job::new(parent.child(&job_path(new_name)));
        job.verify_name(new_name).await?;
        job.disable().await?;
        tracing::info!(from = %source, to = new_name, "Job cloned");
        Ok(job)
    }

    /// Confirms the job exists under `expected`
    pub async fn verify_name(&self, expected: &str) -> JenkinsResult<()> {
        let name = self.name().await.map_err(|e| {
            JenkinsError::Verification(format!(
                "job '{expected}' not reachable at {}: {e}",
                self.url()
            ))
        })?;
        if name != expected {
            return Err(JenkinsError::Verification(format!(
                "expected job '{expected}' at {}, found '{name}'",
                self.url()
            )));
        }
        Ok(())
    }

    fn build_from(&self, link: Option<BuildLink>) -> Option<Build> {
        link.map(|b| Build::new(self.handle.clone_with_url(&b.url)))
    }

    fn builds_from(&self, links: Vec<BuildLink>) -> Vec<Build> {
        links
            .into_iter()
            .map(|b| Build::new(self.handle.clone_with_url(&b.url)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::model::test_handle;
    use crate::testing::MockSession;
    use crate::transport::HttpResponse;

    const JOB: &str = "http://jenkins/job/a/";
    const JOB_API: &str = "http://jenkins/job/a/api/json";

    fn job(session: &MockSession, url: &str) -> Job {
        Job::new(test_handle(session, url))
    }

    fn summary(name: &str, color: &str) -> serde_json::Value {
        json!({
            "_class": "hudson.model.FreeStyleProject",
            "name": name,
            "url": format!("http://jenkins/job/{name}/"),
            "color": color,
            "builds": [],
            "downstreamProjects": [],
            "upstreamProjects": []
        })
    }

    /// Makes `enable`/`disable` posts flip the canned color for `name`
    fn wire_toggles(session: &MockSession, name: &str) {
        let api = format!("http://jenkins/job/{name}/api/json");
        for (action, color) in [("enable", "blue"), ("disable", "disabled")] {
            let api = api.clone();
            let n = name.to_string();
            session.on_post(&format!("http://jenkins/job/{name}/{action}"), move |s, _| {
                s.set_json(&api, summary(&n, color));
            });
        }
    }

    #[tokio::test]
    async fn test_enable_disable() {
        let session = MockSession::new();
        session.set_json(JOB_API, summary("a", "blue"));
        wire_toggles(&session, "a");
        let job = job(&session, JOB);

        assert!(!job.is_disabled().await.unwrap());
        job.disable().await.unwrap();
        assert!(job.is_disabled().await.unwrap());
        job.enable().await.unwrap();
        assert!(!job.is_disabled().await.unwrap());
    }

    #[tokio::test]
    async fn test_start_build_returns_queue_item() {
        let session = MockSession::new();
        session.set_post_response(
            "http://jenkins/job/a/build",
            HttpResponse::with_status(201).with_header("Location", "http://jenkins/queue/item/9/"),
        );
        let job = job(&session, JOB);

        let item = job.start_build().await.unwrap().unwrap();
        assert_eq!(item.url(), "http://jenkins/queue/item/9/");
    }

    #[tokio::test]
    async fn test_start_build_without_location() {
        let session = MockSession::new();
        let job = job(&session, JOB);
        assert!(job.start_build().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_last_build_absent_is_not_an_error() {
        let session = MockSession::new();
        session.set_json(JOB_API, summary("a", "notbuilt"));
        let job = job(&session, JOB);

        assert_eq!(job.last_build().await.unwrap(), None);
        assert_eq!(job.last_good_build().await.unwrap(), None);
        assert!(job.recent_builds().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_lookup() {
        let session = MockSession::new();
        session.set_json(
            JOB_API,
            json!({
                "allBuilds": [
                    {"number": 2, "url": "http://jenkins/job/a/2/"},
                    {"number": 1, "url": "http://jenkins/job/a/1/"}
                ]
            }),
        );
        let job = job(&session, JOB);

        let build = job.get_build_by_number(1).await.unwrap().unwrap();
        assert_eq!(build.url(), "http://jenkins/job/a/1/");
        assert_eq!(job.get_build_by_number(5).await.unwrap(), None);
        assert_eq!(job.all_builds().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_builds_in_time_range() {
        let session = MockSession::new();
        let mut data = summary("a", "blue");
        data["builds"] = json!((1..=4)
            .rev()
            .map(|n| json!({"number": n, "url": format!("http://jenkins/job/a/{n}/")}))
            .collect::<Vec<_>>());
        session.set_json(JOB_API, data);
        for n in 1..=4i64 {
            session.set_json(
                &format!("http://jenkins/job/a/{n}/api/json"),
                json!({"number": n, "url": format!("http://jenkins/job/a/{n}/"), "timestamp": n * 1_000_000}),
            );
        }
        let job = job(&session, JOB);

        let start = Utc.timestamp_millis_opt(2_500_000).unwrap();
        let end = Utc.timestamp_millis_opt(3_500_000).unwrap();
        let builds = job.builds_in_time_range(start, end).await.unwrap();
        assert_eq!(builds.len(), 1);
        assert_eq!(builds[0].url(), "http://jenkins/job/a/3/");
        // the walk stops at build 2, the first one older than the range
        assert_eq!(session.get_count("http://jenkins/job/a/2/api/json"), 1);
        assert_eq!(session.get_count("http://jenkins/job/a/1/api/json"), 0);
    }

    #[tokio::test]
    async fn test_recursive_downstream_jobs() {
        let session = MockSession::new();
        let link = |n: &str| json!({"name": n, "url": format!("http://jenkins/job/{n}/")});
        let mut a = summary("a", "blue");
        a["downstreamProjects"] = json!([link("b")]);
        let mut b = summary("b", "blue");
        b["downstreamProjects"] = json!([link("c"), link("a")]);
        session.set_json(JOB_API, a);
        session.set_json("http://jenkins/job/b/api/json", b);
        session.set_json("http://jenkins/job/c/api/json", summary("c", "blue"));
        let job = job(&session, JOB);

        let direct = job.downstream_jobs(false).await.unwrap();
        assert_eq!(direct.len(), 1);

        let all: Vec<_> = job
            .downstream_jobs(true)
            .await
            .unwrap()
            .iter()
            .map(|j| j.url().to_string())
            .collect();
        assert_eq!(all, vec!["http://jenkins/job/b/", "http://jenkins/job/c/"]);
    }

    #[tokio::test]
    async fn test_quiet_period_round_trip() {
        let session = MockSession::new();
        session.set_get(
            "http://jenkins/job/a/config.xml",
            "<project><disabled>false</disabled></project>",
        );
        let job = job(&session, JOB);

        assert_eq!(job.quiet_period().await.unwrap(), None);
        job.set_quiet_period(5).await.unwrap();
        assert_eq!(
            session.posts()[0].body,
            PostBody::Xml(
                "<project><disabled>false</disabled><quietPeriod>5</quietPeriod></project>"
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_clone_verifies_and_disables() {
        let session = MockSession::new();
        session.set_json(JOB_API, summary("a", "blue"));
        session.on_post("http://jenkins/createItem", |s, _| {
            s.set_json("http://jenkins/job/b/api/json", summary("b", "blue"));
        });
        wire_toggles(&session, "b");
        let source = job(&session, JOB);

        let copy = source.clone_as("b").await.unwrap();
        assert_eq!(copy.url(), "http://jenkins/job/b/");
        assert!(copy.is_disabled().await.unwrap());
        assert_eq!(
            session.posts()[0].url,
            "http://jenkins/createItem?name=b&mode=copy&from=a"
        );
    }

    #[tokio::test]
    async fn test_clone_verification_failure() {
        let session = MockSession::new();
        session.set_json(JOB_API, summary("a", "blue"));
        let source = job(&session, JOB);

        let err = source.clone_as("b").await.unwrap_err();
        assert!(matches!(err, JenkinsError::Verification(_)));
        // no disable attempted on a job that could not be verified
        assert!(session.posts_to("http://jenkins/job/b/disable").is_empty());
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_generic_job() {
        let session = MockSession::new();
        session.set_json(JOB_API, summary("a", "blue"));
        let job = job(&session, JOB);

        let plugin = job.resolve().await.unwrap();
        assert_eq!(plugin.type_token(), "hudson.model.FreeStyleProject");
        assert_eq!(plugin.job(), &job);
    }
}
