use crate::document::ConfigDocument;
use crate::error::{
    JenkinsError,
    JenkinsResult,
};
use crate::handle::{
    normalize_url,
    ResourceHandle,
};
use crate::model::Job;
use crate::plugin::{
    Namespace,
    ViewPlugin,
};
use crate::transport::PostBody;
use crate::types::{
    JobRef,
    ViewRef,
    ViewSummary,
};

/// Path of a view below its parent container
pub fn view_path(name: &str) -> String {
    format!("view/{}/", urlencoding::encode(name))
}

/// The server reports the default view at the dashboard root; give it its own URL
pub fn view_url(url: &str, name: &str) -> String {
    if url.contains("/view/") {
        normalize_url(url)
    } else {
        format!("{}{}", normalize_url(url), view_path(name))
    }
}

/// Form accepted by `createView` for a fresh view of type `mode`
pub fn create_view_form(name: &str, mode: &str) -> PostBody {
    let json = serde_json::json!({ "name": name, "mode": mode }).to_string();
    PostBody::form([
        ("name", name),
        ("mode", mode),
        ("Submit", "OK"),
        ("json", json.as_str()),
    ])
}

/// Job health breakdown of a view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewMetrics {
    pub broken_jobs: Vec<Job>,
    pub disabled_jobs: Vec<Job>,
    pub unstable_jobs: Vec<Job>,
}

impl ViewMetrics {
    pub fn broken_jobs_count(&self) -> usize {
        self.broken_jobs.len()
    }

    pub fn disabled_jobs_count(&self) -> usize {
        self.disabled_jobs.len()
    }

    pub fn unstable_jobs_count(&self) -> usize {
        self.unstable_jobs.len()
    }
}

/// Base view proxy; type-specific behavior lives in the registered [`ViewPlugin`]s
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    handle: ResourceHandle,
}

impl View {
    pub fn new(handle: ResourceHandle) -> Self {
        Self { handle }
    }

    pub fn from_ref(handle: &ResourceHandle, view: &ViewRef) -> Self {
        Self::new(handle.clone_with_url(&view_url(&view.url, &view.name)))
    }

    /// Posts a `createView` form to `parent` and verifies the result
    pub async fn create(
        parent: &ResourceHandle, name: &str, type_token: &str,
    ) -> JenkinsResult<View> {
        let mode = parent
            .registry()
            .canonical_token(Namespace::View, type_token)
            .unwrap_or(type_token);
        parent.post("createView", create_view_form(name, mode)).await?;

        let view = View::new(parent.child(&view_path(name)));
        view.verify_name(name).await?;
        tracing::info!(name, mode, url = view.url(), "View created");
        Ok(view)
    }

    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }

    pub fn url(&self) -> &str {
        self.handle.url()
    }

    pub async fn summary(&self) -> JenkinsResult<ViewSummary> {
        self.handle.get_api().await
    }

    pub async fn name(&self) -> JenkinsResult<String> {
        Ok(self.summary().await?.name)
    }

    pub async fn description(&self) -> JenkinsResult<Option<String>> {
        Ok(self.summary().await?.description)
    }

    /// Server-reported class, falling back to the config root element
    pub async fn type_token(&self) -> JenkinsResult<String> {
        match self.summary().await?.class {
            Some(class) => Ok(class),
            None => Ok(self.config_xml().await?.type_token().to_string()),
        }
    }

    /// Wraps this view in its registered plugin type
    pub async fn resolve(&self) -> JenkinsResult<Box<dyn ViewPlugin>> {
        let token = self.type_token().await?;
        Ok(self.handle.registry().resolve_view(&token, self.clone()))
    }

    pub async fn jobs(&self) -> JenkinsResult<Vec<Job>> {
        Ok(self.jobs_from(&self.summary().await?.jobs))
    }

    pub async fn job_count(&self) -> JenkinsResult<usize> {
        Ok(self.summary().await?.jobs.len())
    }

    pub async fn job_names(&self) -> JenkinsResult<Vec<String>> {
        Ok(self
            .summary()
            .await?
            .jobs
            .into_iter()
            .map(|j| j.name)
            .collect())
    }

    /// Direct children of a view that contains other views
    pub async fn sub_views(&self) -> JenkinsResult<Vec<View>> {
        let summary = self.summary().await?;
        Ok(summary
            .views
            .iter()
            .map(|v| View::from_ref(&self.handle, v))
            .collect())
    }

    /// Every view nested below this one, depth first
    pub async fn all_views(&self) -> JenkinsResult<Vec<View>> {
        let summary = self.summary().await?;
        walk_views(&self.handle, summary.views, None).await
    }

    /// Nested view with the given name, searched depth first
    pub async fn find_view(&self, name: &str) -> JenkinsResult<Option<View>> {
        let summary = self.summary().await?;
        let found = walk_views(&self.handle, summary.views, Some(name)).await?;
        Ok(found.into_iter().next())
    }

    pub async fn config_xml(&self) -> JenkinsResult<ConfigDocument> {
        self.handle.get_config_document().await
    }

    pub async fn set_config_xml(&self, doc: &ConfigDocument) -> JenkinsResult<()> {
        self.handle.set_config_document(doc).await
    }

    pub async fn delete(&self) -> JenkinsResult<()> {
        self.handle.post("doDelete", PostBody::Empty).await?;
        tracing::info!(url = self.url(), "View deleted");
        Ok(())
    }

    pub async fn enable_all_jobs(&self) -> JenkinsResult<()> {
        for job in self.jobs().await? {
            job.enable().await?;
        }
        Ok(())
    }

    pub async fn disable_all_jobs(&self) -> JenkinsResult<()> {
        for job in self.jobs().await? {
            job.disable().await?;
        }
        Ok(())
    }

    pub async fn delete_all_jobs(&self) -> JenkinsResult<()> {
        for job in self.jobs().await? {
            job.delete().await?;
        }
        Ok(())
    }

    /// Clones every job, naming each copy by replacing `search` with `replacement`
    pub async fn clone_all_jobs(
        &self, search: &str, replacement: &str,
    ) -> JenkinsResult<Vec<Job>> {
        let summary = self.summary().await?;
        let mut clones = Vec::with_capacity(summary.jobs.len());
        for job_ref in &summary.jobs {
            let job = Job::new(self.handle.clone_with_url(&job_ref.url));
            let new_name = job_ref.name.replace(search, replacement);
            clones.push(job.clone_as(&new_name).await?);
        }
        Ok(clones)
    }

    /// Copies this view, including its config, under a new name in the same container
    pub async fn clone_as(&self, new_name: &str) -> JenkinsResult<View> {
        let parent = self.handle.parent().ok_or_else(|| {
            JenkinsError::InvalidConfig(format!("cannot derive parent of {}", self.url()))
        })?;
        let source = self.name().await?;
        let mut doc = self.config_xml().await?;

        let form = PostBody::form([
            ("name", new_name),
            ("mode", "copy"),
            ("from", source.as_str()),
        ]);
        parent.post("createView", form).await?;

        let view = View::new(parent.child(&view_path(new_name)));
        view.verify_name(new_name).await?;

        doc.rename(new_name);
        view.set_config_xml(&doc).await?;
        tracing::info!(from = %source, to = new_name, "View cloned");
        Ok(view)
    }

    /// Clone followed by delete; a failed delete leaves both views in place
    pub async fn rename(&self, new_name: &str) -> JenkinsResult<View> {
        let view = self.clone_as(new_name).await?;
        self.delete().await?;
        Ok(view)
    }

    pub async fn view_metrics(&self) -> JenkinsResult<ViewMetrics> {
        let summary = self.summary().await?;
        let mut metrics = ViewMetrics::default();

        for job_ref in &summary.jobs {
            let color = job_ref.color.as_deref().unwrap_or_default();
            let bucket = match color.trim_end_matches("_anime") {
                "red" => &mut metrics.broken_jobs,
                "disabled" => &mut metrics.disabled_jobs,
                "yellow" => &mut metrics.unstable_jobs,
                _ => continue,
            };
            bucket.push(Job::new(self.handle.clone_with_url(&job_ref.url)));
        }
        Ok(metrics)
    }

    pub async fn verify_name(&self, expected: &str) -> JenkinsResult<()> {
        let name = self.name().await.map_err(|e| {
            JenkinsError::Verification(format!(
                "view '{expected}' not reachable at {}: {e}",
                self.url()
            ))
        })?;
        if name != expected {
            return Err(JenkinsError::Verification(format!(
                "expected view '{expected}' at {}, found '{name}'",
                self.url()
            )));
        }
        Ok(())
    }

    fn jobs_from(&self, refs: &[JobRef]) -> Vec<Job> {
        refs.iter()
            .map(|j| Job::new(self.handle.clone_with_url(&j.url)))
            .collect()
    }
}

/// Depth-first walk over nested views starting from `roots`.
///
/// With `target`, stops at the first view of that name and returns only it.
/// Views whose registered type cannot hold sub-views are not expanded. There
/// is no cycle detection; the server never reports a view inside itself.
pub async fn walk_views(
    handle: &ResourceHandle, roots: Vec<ViewRef>, target: Option<&str>,
) -> JenkinsResult<Vec<View>> {
    let mut found = Vec::new();
    let mut stack: Vec<ViewRef> = roots.into_iter().rev().collect();

    while let Some(view_ref) = stack.pop() {
        let view = View::from_ref(handle, &view_ref);
        if target == Some(view_ref.name.as_str()) {
            return Ok(vec![view]);
        }

        if may_contain_views(handle, view_ref.class.as_deref()) {
            let children = view.summary().await?.views;
            stack.extend(children.into_iter().rev());
        }

        if target.is_none() {
            found.push(view);
        }
    }
    Ok(found)
}

fn may_contain_views(handle: &ResourceHandle, class: Option<&str>) -> bool {
    class
        .and_then(|c| handle.registry().descriptor(Namespace::View, c))
        .map_or(true, |meta| meta.capabilities.sub_views)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::test_handle;
    use crate::testing::MockSession;

    const VIEW: &str = "http://jenkins/view/V1/";
    const VIEW_API: &str = "http://jenkins/view/V1/api/json";

    fn job_ref(name: &str, color: &str) -> serde_json::Value {
        json!({"name": name, "url": format!("http://jenkins/job/{name}/"), "color": color})
    }

    fn view_summary(name: &str, jobs: Vec<serde_json::Value>) -> serde_json::Value {
        json!({
            "_class": "hudson.model.ListView",
            "name": name,
            "url": format!("http://jenkins/view/{name}/"),
            "jobs": jobs
        })
    }

    fn job_summary(name: &str, color: &str) -> serde_json::Value {
        json!({"name": name, "url": format!("http://jenkins/job/{name}/"), "color": color})
    }

    fn view(session: &MockSession) -> View {
        View::new(test_handle(session, VIEW))
    }

    #[test]
    fn test_default_view_url_fix() {
        assert_eq!(view_url("http://jenkins/", "all"), "http://jenkins/view/all/");
        assert_eq!(
            view_url("http://jenkins/view/mine", "mine"),
            "http://jenkins/view/mine/"
        );
    }

    #[tokio::test]
    async fn test_view_metrics() {
        let session = MockSession::new();
        session.set_json(
            VIEW_API,
            view_summary(
                "V1",
                vec![
                    job_ref("A", "blue"),
                    job_ref("B", "disabled"),
                    job_ref("C", "red"),
                    job_ref("D", "yellow_anime"),
                ],
            ),
        );

        let metrics = view(&session).view_metrics().await.unwrap();
        assert_eq!(metrics.broken_jobs_count(), 1);
        assert_eq!(metrics.disabled_jobs_count(), 1);
        assert_eq!(metrics.unstable_jobs_count(), 1);
        assert_eq!(metrics.broken_jobs[0].url(), "http://jenkins/job/C/");
        assert_eq!(metrics.disabled_jobs[0].url(), "http://jenkins/job/B/");
    }

    #[tokio::test]
    async fn test_job_listing() {
        let session = MockSession::new();
        session.set_json(
            VIEW_API,
            view_summary("V1", vec![job_ref("A", "blue"), job_ref("B", "red")]),
        );
        let view = view(&session);

        assert_eq!(view.job_count().await.unwrap(), 2);
        assert_eq!(view.job_names().await.unwrap(), vec!["A", "B"]);
        assert_eq!(view.jobs().await.unwrap()[1].url(), "http://jenkins/job/B/");
    }

    #[tokio::test]
    async fn test_disable_all_jobs_twice() {
        let session = MockSession::new();
        session.set_json(
            VIEW_API,
            view_summary("V1", vec![job_ref("A", "blue"), job_ref("B", "disabled")]),
        );
        for name in ["A", "B"] {
            let api = format!("http://jenkins/job/{name}/api/json");
            session.set_json(&api, job_summary(name, "blue"));
            let n = name.to_string();
            session.on_post(&format!("http://jenkins/job/{name}/disable"), move |s, _| {
                s.set_json(&api, job_summary(&n, "disabled"));
            });
        }
        let view = view(&session);

        for _ in 0..2 {
            view.disable_all_jobs().await.unwrap();
            for job in view.jobs().await.unwrap() {
                assert!(job.is_disabled().await.unwrap());
            }
        }
        assert_eq!(session.posts().len(), 4);
    }

    #[tokio::test]
    async fn test_batch_stops_at_first_failure() {
        let session = MockSession::new();
        session.set_json(
            VIEW_API,
            view_summary(
                "V1",
                vec![job_ref("A", "blue"), job_ref("B", "blue"), job_ref("C", "blue")],
            ),
        );
        session.set_post_response(
            "http://jenkins/job/B/doDelete",
            crate::transport::HttpResponse::with_status(500),
        );

        assert!(view(&session).delete_all_jobs().await.is_err());
        let urls: Vec<_> = session.posts().into_iter().map(|p| p.url).collect();
        assert_eq!(
            urls,
            vec!["http://jenkins/job/A/doDelete", "http://jenkins/job/B/doDelete"]
        );
    }

    #[tokio::test]
    async fn test_clone_copies_config_with_new_name() {
        let session = MockSession::new();
        session.set_json(VIEW_API, view_summary("V1", vec![]));
        session.set_get(
            "http://jenkins/view/V1/config.xml",
            "<hudson.model.ListView><name>V1</name><includeRegex>app-.*</includeRegex></hudson.model.ListView>",
        );
        session.on_post("http://jenkins/createView", |s, _| {
            s.set_json("http://jenkins/view/V2/api/json", view_summary("V2", vec![]));
        });
        let source = view(&session);

        let copy = source.clone_as("V2").await.unwrap();
        assert_eq!(copy.url(), "http://jenkins/view/V2/");

        let posts = session.posts();
        assert_eq!(
            posts[0].body,
            PostBody::form([("name", "V2"), ("mode", "copy"), ("from", "V1")])
        );
        assert_eq!(posts[1].url, "http://jenkins/view/V2/config.xml");
        assert_eq!(
            posts[1].body,
            PostBody::Xml(
                "<hudson.model.ListView><name>V2</name><includeRegex>app-.*</includeRegex></hudson.model.ListView>"
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_rename_is_clone_then_delete() {
        let session = MockSession::new();
        session.set_json(VIEW_API, view_summary("V1", vec![]));
        session.set_get(
            "http://jenkins/view/V1/config.xml",
            "<hudson.model.ListView><name>V1</name></hudson.model.ListView>",
        );
        session.on_post("http://jenkins/createView", |s, _| {
            s.set_json("http://jenkins/view/V2/api/json", view_summary("V2", vec![]));
        });

        let renamed = view(&session).rename("V2").await.unwrap();
        assert_eq!(renamed.url(), "http://jenkins/view/V2/");
        let last = session.posts().pop().unwrap();
        assert_eq!(last.url, "http://jenkins/view/V1/doDelete");
    }

    #[tokio::test]
    async fn test_create_verifies_name() {
        let session = MockSession::new();
        let root = test_handle(&session, "http://jenkins/");

        let err = View::create(&root, "V9", "hudson.model.ListView")
            .await
            .unwrap_err();
        assert!(matches!(err, JenkinsError::Verification(_)));
    }

    #[tokio::test]
    async fn test_find_nested_view() {
        let session = MockSession::new();
        let nested = |name: &str, children: serde_json::Value| {
            json!({
                "_class": "hudson.plugins.nested_view.NestedView",
                "name": name,
                "url": format!("http://jenkins/view/{name}/"),
                "jobs": [],
                "views": children
            })
        };
        let child = json!({"name": "inner", "url": "http://jenkins/view/outer/view/inner/"});
        let outer = json!({"name": "outer", "url": "http://jenkins/view/outer/"});
        session.set_json(VIEW_API, nested("V1", json!([outer])));
        session.set_json("http://jenkins/view/outer/api/json", nested("outer", json!([child])));
        session.set_json(
            "http://jenkins/view/outer/view/inner/api/json",
            nested("inner", json!([])),
        );
        let view = view(&session);

        let found = view.find_view("inner").await.unwrap().unwrap();
        assert_eq!(found.url(), "http://jenkins/view/outer/view/inner/");
        assert_eq!(view.find_view("nonexistent").await.unwrap(), None);

        let all: Vec<_> = view
            .all_views()
            .await
            .unwrap()
            .iter()
            .map(|v| v.url().to_string())
            .collect();
        assert_eq!(
            all,
            vec!["http://jenkins/view/outer/", "http://jenkins/view/outer/view/inner/"]
        );
    }
}
