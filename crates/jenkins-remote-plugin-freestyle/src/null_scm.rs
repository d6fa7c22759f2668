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

pub const TYPE_TOKEN: &str = "hudson.scm.NullSCM";

/// Placeholder SCM of jobs that check nothing out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullScm {
    node: XmlNode,
}

impl NullScm {
    pub fn new() -> Self {
        Self {
            node: XmlNode::new("scm").with_attribute("class", TYPE_TOKEN),
        }
    }
}

impl Default for NullScm {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlPlugin for NullScm {
    fn node(&self) -> &XmlNode {
        &self.node
    }

    fn namespace(&self) -> Namespace {
        Namespace::Scm
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl XmlPluginType for NullScm {
    fn metadata() -> PluginMetadata {
        PluginMetadata {
            name: "None",
            namespace: Namespace::Scm,
            type_token: TYPE_TOKEN,
            aliases: &["nullscm"],
            description: "No source code management",
            capabilities: PluginCapabilities::NONE,
        }
    }

    fn from_node(node: XmlNode) -> JenkinsResult<Self> {
        Ok(Self { node })
    }

    fn template_xml() -> Option<String> {
        Self::new().node.to_template_xml()
    }
}
