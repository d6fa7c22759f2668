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

pub const TYPE_TOKEN: &str = "hudson.tasks.BuildTrigger";

const CHILD_PROJECTS: &str = "childProjects";

/// Triggers downstream jobs once the owning job finishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTriggerPublisher {
    node: XmlNode,
}

impl BuildTriggerPublisher {
    /// Trigger for `job_names` that fires when the parent build succeeds
    pub fn create<S: AsRef<str>>(job_names: &[S]) -> Self {
        let names: Vec<&str> = job_names.iter().map(|n| n.as_ref()).collect();

        let threshold = XmlNode::new("threshold")
            .with_child(XmlNode::with_text("name", "SUCCESS"))
            .with_child(XmlNode::with_text("ordinal", "0"))
            .with_child(XmlNode::with_text("color", "BLUE"))
            .with_child(XmlNode::with_text("completeBuild", "true"));

        Self {
            node: XmlNode::new(TYPE_TOKEN)
                .with_child(threshold)
                .with_child(XmlNode::with_text(CHILD_PROJECTS, names.join(","))),
        }
    }

    /// Downstream job names; the server stores them comma separated
    pub fn job_names(&self) -> Vec<String> {
        self.node
            .child(CHILD_PROJECTS)
            .map(XmlNode::text)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Result name the parent build must reach, e.g. `SUCCESS`
    pub fn threshold(&self) -> Option<String> {
        self.node.find("threshold/name").map(XmlNode::text)
    }
}

impl XmlPlugin for BuildTriggerPublisher {
    fn node(&self) -> &XmlNode {
        &self.node
    }

    fn namespace(&self) -> Namespace {
        Namespace::Publisher
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl XmlPluginType for BuildTriggerPublisher {
    fn metadata() -> PluginMetadata {
        PluginMetadata {
            name: "Build other projects",
            namespace: Namespace::Publisher,
            type_token: TYPE_TOKEN,
            aliases: &["buildtrigger"],
            description: "Starts downstream jobs after a build",
            capabilities: PluginCapabilities::NONE,
        }
    }

    fn from_node(node: XmlNode) -> JenkinsResult<Self> {
        Ok(Self { node })
    }

    fn template_xml() -> Option<String> {
        Self::create::<&str>(&[]).node.to_template_xml()
    }
}
