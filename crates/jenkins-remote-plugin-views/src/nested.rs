use std::any::Any;

use jenkins_remote_api::model::create_view_form;
use jenkins_remote_api::{
    JenkinsError,
    JenkinsResult,
    Namespace,
    PluginCapabilities,
    PluginMetadata,
    View,
    ViewPlugin,
    ViewPluginType,
};

pub const TYPE_TOKEN: &str = "hudson.plugins.nested_view.NestedView";

const CAPABILITIES: PluginCapabilities = PluginCapabilities {
    sub_views: true,
    ..PluginCapabilities::NONE
};

/// A view whose members are other views
#[derive(Debug, Clone)]
pub struct NestedView {
    view: View,
}

impl NestedView {
    /// Direct sub-views, each wrapped in its registered type
    pub async fn views(&self) -> JenkinsResult<Vec<Box<dyn ViewPlugin>>> {
        let summary = self.view.summary().await?;
        let handle = self.view.handle();

        let mut views = Vec::with_capacity(summary.views.len());
        for view_ref in &summary.views {
            let view = View::from_ref(handle, view_ref);
            let resolved = match view_ref.class.as_deref() {
                Some(class) => handle.registry().resolve_view(class, view),
                None => view.resolve().await?,
            };
            views.push(resolved);
        }
        Ok(views)
    }

    /// Every view below this one, depth first
    pub async fn all_views(&self) -> JenkinsResult<Vec<View>> {
        self.view.all_views().await
    }

    pub async fn find_view(&self, name: &str) -> JenkinsResult<Option<View>> {
        self.view.find_view(name).await
    }

    /// Creates an empty sub-view of `view_type` (qualified name or alias)
    pub async fn create_view(
        &self, name: &str, view_type: &str,
    ) -> JenkinsResult<Box<dyn ViewPlugin>> {
        let handle = self.view.handle();
        let mode = handle
            .registry()
            .canonical_token(Namespace::View, view_type)
            .unwrap_or(view_type);
        handle.post("createView", create_view_form(name, mode)).await?;

        let summary = self.view.summary().await?;
        let created = summary
            .views
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| {
                JenkinsError::Verification(format!(
                    "view '{name}' not listed under {} after creation",
                    self.view.url()
                ))
            })?;

        let view = View::from_ref(handle, created);
        tracing::info!(name, mode, url = view.url(), "Nested view created");
        let token = created.class.as_deref().unwrap_or(mode);
        Ok(handle.registry().resolve_view(token, view))
    }

    /// Copies `existing`, config included, into this view under `new_name`
    pub async fn clone_subview(
        &self, existing: &View, new_name: &str,
    ) -> JenkinsResult<Box<dyn ViewPlugin>> {
        let view_type = existing.type_token().await?;
        let mut doc = existing.config_xml().await?;

        let created = self.create_view(new_name, &view_type).await?;
        doc.rename(new_name);
        created.view().set_config_xml(&doc).await?;
        Ok(created)
    }

    /// Moves `existing` into this view; the old proxy points at a deleted view
    /// afterwards. Not atomic: a failed delete leaves both copies.
    pub async fn move_view(&self, existing: &View) -> JenkinsResult<Box<dyn ViewPlugin>> {
        let name = existing.name().await?;
        let moved = self.clone_subview(existing, &name).await?;
        existing.delete().await?;
        tracing::info!(name = %name, into = self.view.url(), "View moved");
        Ok(moved)
    }
}

impl ViewPlugin for NestedView {
    fn view(&self) -> &View {
        &self.view
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

impl ViewPluginType for NestedView {
    fn metadata() -> PluginMetadata {
        PluginMetadata {
            name: "Nested View",
            namespace: Namespace::View,
            type_token: TYPE_TOKEN,
            aliases: &["nestedview"],
            description: "Groups other views",
            capabilities: CAPABILITIES,
        }
    }

    fn from_view(view: View) -> Self {
        Self { view }
    }
}

#[cfg(test)]
mod tests {
    use jenkins_remote_api::testing::MockSession;
    use jenkins_remote_api::{
        GenericView,
        PostBody,
    };
    use serde_json::json;

    use super::*;
    use crate::test_support;
    use crate::ListView;

    const OUTER: &str = "http://jenkins/view/outer/";
    const OUTER_API: &str = "http://jenkins/view/outer/api/json";
    const APPS: &str = "http://jenkins/view/apps/";
    const MOVED: &str = "http://jenkins/view/outer/view/apps/";

    fn summary(class: &str, name: &str, url: &str, views: serde_json::Value) -> serde_json::Value {
        json!({"_class": class, "name": name, "url": url, "jobs": [], "views": views})
    }

    fn nested(session: &MockSession) -> NestedView {
        NestedView::from_view(test_support::view(session, OUTER))
    }

    /// Wires `createView` on the outer view to list `name` as a new sub-view
    fn accept_create(session: &MockSession, name: &'static str, class: &'static str) {
        session.on_post("http://jenkins/view/outer/createView", move |s, _| {
            let url = format!("{OUTER}view/{name}/");
            s.set_json(
                OUTER_API,
                summary(
                    TYPE_TOKEN,
                    "outer",
                    OUTER,
                    json!([{"_class": class, "name": name, "url": url}]),
                ),
            );
            s.set_json(&format!("{url}api/json"), summary(class, name, &url, json!([])));
        });
    }

    fn source_list_view(session: &MockSession) -> View {
        session.set_json(
            "http://jenkins/view/apps/api/json",
            summary(crate::list::TYPE_TOKEN, "apps", APPS, json!([])),
        );
        session.set_get(
            "http://jenkins/view/apps/config.xml",
            "<hudson.model.ListView><name>apps</name><includeRegex>app-.*</includeRegex></hudson.model.ListView>",
        );
        test_support::view(session, APPS)
    }

    #[tokio::test]
    async fn test_views_resolve_each_child_type() {
        let session = MockSession::new();
        session.set_json(
            OUTER_API,
            summary(
                TYPE_TOKEN,
                "outer",
                OUTER,
                json!([
                    {"_class": crate::list::TYPE_TOKEN, "name": "a", "url": "http://jenkins/view/outer/view/a/"},
                    {"_class": TYPE_TOKEN, "name": "b", "url": "http://jenkins/view/outer/view/b/"},
                    {"_class": "com.example.DashboardView", "name": "c", "url": "http://jenkins/view/outer/view/c/"}
                ]),
            ),
        );

        let views = nested(&session).views().await.unwrap();
        assert_eq!(views.len(), 3);
        assert!(views[0].downcast_ref::<ListView>().is_some());
        assert!(views[1].contains_views());
        assert!(views[2].downcast_ref::<GenericView>().is_some());
        assert_eq!(views[2].type_token(), "com.example.DashboardView");
    }

    #[tokio::test]
    async fn test_create_view_accepts_alias() {
        let session = MockSession::new();
        session.set_json(OUTER_API, summary(TYPE_TOKEN, "outer", OUTER, json!([])));
        accept_create(&session, "fresh", crate::list::TYPE_TOKEN);

        let created = nested(&session).create_view("fresh", "listview").await.unwrap();
        assert_eq!(created.view().url(), "http://jenkins/view/outer/view/fresh/");
        assert!(created.downcast_ref::<ListView>().is_some());

        let PostBody::Form(form) = &session.posts()[0].body else {
            panic!("expected form body");
        };
        assert!(form.contains(&("mode".to_string(), crate::list::TYPE_TOKEN.to_string())));
    }

    #[tokio::test]
    async fn test_create_view_missing_from_listing_fails() {
        let session = MockSession::new();
        session.set_json(OUTER_API, summary(TYPE_TOKEN, "outer", OUTER, json!([])));

        let err = nested(&session)
            .create_view("ghost", "listview")
            .await
            .unwrap_err();
        assert!(matches!(err, JenkinsError::Verification(_)));
    }

    #[tokio::test]
    async fn test_clone_subview_copies_renamed_config() {
        let session = MockSession::new();
        session.set_json(OUTER_API, summary(TYPE_TOKEN, "outer", OUTER, json!([])));
        accept_create(&session, "apps-copy", crate::list::TYPE_TOKEN);
        let source = source_list_view(&session);

        let copy = nested(&session)
            .clone_subview(&source, "apps-copy")
            .await
            .unwrap();
        assert_eq!(copy.view().url(), "http://jenkins/view/outer/view/apps-copy/");

        let config = session.posts_to("http://jenkins/view/outer/view/apps-copy/config.xml");
        assert_eq!(
            config[0].body,
            PostBody::Xml(
                "<hudson.model.ListView><name>apps-copy</name><includeRegex>app-.*</includeRegex></hudson.model.ListView>"
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_move_view_deletes_original_last() {
        let session = MockSession::new();
        session.set_json(OUTER_API, summary(TYPE_TOKEN, "outer", OUTER, json!([])));
        accept_create(&session, "apps", crate::list::TYPE_TOKEN);
        let source = source_list_view(&session);

        let moved = nested(&session).move_view(&source).await.unwrap();
        assert_eq!(moved.view().url(), MOVED);

        let urls: Vec<_> = session.posts().into_iter().map(|p| p.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://jenkins/view/outer/createView",
                "http://jenkins/view/outer/view/apps/config.xml",
                "http://jenkins/view/apps/doDelete",
            ]
        );
    }
}
