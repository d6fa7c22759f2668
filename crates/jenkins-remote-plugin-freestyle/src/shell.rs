use std::any::Any;

use jenkins_remote_api::{
    JenkinsError,
    JenkinsResult,
    Namespace,
    PluginCapabilities,
    PluginMetadata,
    XmlNode,
    XmlPlugin,
    XmlPluginType,
};

pub const TYPE_TOKEN: &str = "hudson.tasks.Shell";

const COMMAND: &str = "command";
const UNSTABLE_RETURN: &str = "unstableReturn";

/// Build step running a shell script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellBuilder {
    node: XmlNode,
}

impl ShellBuilder {
    /// New builder for `script`, ready to be appended to a job
    pub fn instantiate(script: &str) -> Self {
        Self {
            node: XmlNode::new(TYPE_TOKEN).with_child(XmlNode::with_text(COMMAND, script)),
        }
    }

    pub fn script(&self) -> String {
        self.node.child(COMMAND).map(XmlNode::text).unwrap_or_default()
    }

    pub fn set_script(&mut self, script: &str) {
        self.node.ensure_path(COMMAND).set_text(script);
    }

    /// Exit code that marks the build unstable instead of failed
    pub fn unstable_return_code(&self) -> JenkinsResult<Option<i32>> {
        self.node
            .child(UNSTABLE_RETURN)
            .map(XmlNode::text)
            .filter(|code| !code.trim().is_empty())
            .map(|code| {
                code.trim().parse::<i32>().map_err(|e| {
                    JenkinsError::MalformedConfig(format!("invalid unstableReturn '{code}': {e}"))
                })
            })
            .transpose()
    }

    /// `None` clears the setting so every non-zero exit fails the build
    pub fn set_unstable_return_code(&mut self, code: Option<i32>) {
        match code {
            Some(code) => self.node.ensure_path(UNSTABLE_RETURN).set_text(code.to_string()),
            None => {
                self.node.remove_children(UNSTABLE_RETURN);
            }
        }
    }
}

impl XmlPlugin for ShellBuilder {
    fn node(&self) -> &XmlNode {
        &self.node
    }

    fn namespace(&self) -> Namespace {
        Namespace::Builder
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl XmlPluginType for ShellBuilder {
    fn metadata() -> PluginMetadata {
        PluginMetadata {
            name: "Execute shell",
            namespace: Namespace::Builder,
            type_token: TYPE_TOKEN,
            aliases: &["shell"],
            description: "Runs a shell script as a build step",
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
