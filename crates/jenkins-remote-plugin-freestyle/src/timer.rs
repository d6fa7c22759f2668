use std::any::Any;

use jenkins_remote_api::{
    JenkinsResult,
    Namespace,
    PluginCapabilities,
    PluginMetadata,
    XmlNode,
    XmlPlugin,
    XmlPluginType,
};

pub const TYPE_TOKEN: &str = "hudson.triggers.TimerTrigger";

const SPEC: &str = "spec";

/// Periodic build trigger driven by a cron expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerTrigger {
    node: XmlNode,
}

impl TimerTrigger {
    pub fn instantiate(cron: &str) -> Self {
        Self {
            node: XmlNode::new(TYPE_TOKEN).with_child(XmlNode::with_text(SPEC, cron)),
        }
    }

    /// Cron schedule, possibly several lines
    pub fn spec(&self) -> String {
        self.node.child(SPEC).map(XmlNode::text).unwrap_or_default()
    }

    pub fn set_spec(&mut self, cron: &str) {
        self.node.ensure_path(SPEC).set_text(cron);
    }
}

impl XmlPlugin for TimerTrigger {
    fn node(&self) -> &XmlNode {
        &self.node
    }

    fn namespace(&self) -> Namespace {
        Namespace::Trigger
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl XmlPluginType for TimerTrigger {
    fn metadata() -> PluginMetadata {
        PluginMetadata {
            name: "Build periodically",
            namespace: Namespace::Trigger,
            type_token: TYPE_TOKEN,
            aliases: &["timer"],
            description: "Starts builds on a cron schedule",
            capabilities: PluginCapabilities::NONE,
        }
    }

    fn from_node(node: XmlNode) -> JenkinsResult<Self> {
        Ok(Self { node })
    }

    fn template_xml() -> Option<String> {
        Self::instantiate("").node.to_template_xml()
    }
}
