use std::any::Any;

use jenkins_remote_api::{
    Namespace,
    PluginCapabilities,
    PluginMetadata,
    View,
    ViewPlugin,
    ViewPluginType,
};

pub const TYPE_TOKEN: &str = "hudson.plugins.status_view.StatusView";

/// Build status dashboard provided by the status-view plugin
#[derive(Debug, Clone)]
pub struct StatusView {
    view: View,
}

impl ViewPlugin for StatusView {
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

impl ViewPluginType for StatusView {
    fn metadata() -> PluginMetadata {
        PluginMetadata {
            name: "Status",
            namespace: Namespace::View,
            type_token: TYPE_TOKEN,
            aliases: &["statusview"],
            description: "Build status overview of the listed jobs",
            capabilities: PluginCapabilities::NONE,
        }
    }

    fn from_view(view: View) -> Self {
        Self { view }
    }
}

#[cfg(test)]
mod tests {
    use jenkins_remote_api::testing::MockSession;
    use serde_json::json;

    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn test_resolves_instead_of_generic_view() {
        let session = MockSession::new();
        session.set_json(
            "http://jenkins/view/status/api/json",
            json!({
                "_class": TYPE_TOKEN,
                "name": "status",
                "url": "http://jenkins/view/status/"
            }),
        );
        let view = test_support::view(&session, "http://jenkins/view/status/");

        let resolved = view.resolve().await.unwrap();
        assert_eq!(resolved.type_token(), TYPE_TOKEN);
        assert!(resolved.downcast_ref::<StatusView>().is_some());
        assert!(!resolved.contains_views());
    }

    #[test]
    fn test_alias_maps_to_class() {
        let registry = test_support::registry();
        assert_eq!(
            registry.canonical_token(Namespace::View, "statusview"),
            Some(TYPE_TOKEN)
        );
    }
}
