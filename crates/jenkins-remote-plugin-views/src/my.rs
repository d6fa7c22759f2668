use std::any::Any;

use jenkins_remote_api::{
    Namespace,
    PluginCapabilities,
    PluginMetadata,
    View,
    ViewPlugin,
    ViewPluginType,
};

pub const TYPE_TOKEN: &str = "hudson.model.MyView";

/// Per-user view listing the jobs the current user can access
#[derive(Debug, Clone)]
pub struct MyView {
    view: View,
}

impl ViewPlugin for MyView {
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

impl ViewPluginType for MyView {
    fn metadata() -> PluginMetadata {
        PluginMetadata {
            name: "My View",
            namespace: Namespace::View,
            type_token: TYPE_TOKEN,
            aliases: &["myview"],
            description: "Shows jobs the current user has access to",
            capabilities: PluginCapabilities::NONE,
        }
    }

    fn from_view(view: View) -> Self {
        Self { view }
    }
}
