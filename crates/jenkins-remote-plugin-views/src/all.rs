use std::any::Any;

use jenkins_remote_api::{
    Namespace,
    PluginCapabilities,
    PluginMetadata,
    View,
    ViewPlugin,
    ViewPluginType,
};

pub const TYPE_TOKEN: &str = "hudson.model.AllView";

/// The built-in view showing every job on the server
#[derive(Debug, Clone)]
pub struct AllView {
    view: View,
}

impl ViewPlugin for AllView {
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

impl ViewPluginType for AllView {
    fn metadata() -> PluginMetadata {
        PluginMetadata {
            name: "All",
            namespace: Namespace::View,
            type_token: TYPE_TOKEN,
            aliases: &["allview"],
            description: "Shows all jobs",
            capabilities: PluginCapabilities::NONE,
        }
    }

    fn from_view(view: View) -> Self {
        Self { view }
    }
}
