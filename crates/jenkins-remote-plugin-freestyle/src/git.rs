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

pub const TYPE_TOKEN: &str = "hudson.plugins.git.GitSCM";

const REMOTES: &str = "userRemoteConfigs";
const REMOTE: &str = "hudson.plugins.git.UserRemoteConfig";
const BRANCHES: &str = "branches";
const BRANCH: &str = "hudson.plugins.git.BranchSpec";

/// Git checkout settings of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitScm {
    node: XmlNode,
}

impl GitScm {
    /// Single-remote checkout of `branch` (e.g. `*/main`)
    pub fn instantiate(url: &str, branch: &str) -> Self {
        let mut scm = Self {
            node: XmlNode::new("scm")
                .with_attribute("class", TYPE_TOKEN)
                .with_child(XmlNode::with_text("configVersion", "2"))
                .with_child(XmlNode::new(REMOTES))
                .with_child(XmlNode::new(BRANCHES))
                .with_child(XmlNode::with_text("doGenerateSubmoduleConfigurations", "false"))
                .with_child(XmlNode::new("submoduleCfg").with_attribute("class", "list"))
                .with_child(XmlNode::new("extensions")),
        };
        scm.add_remote(url);
        scm.add_branch(branch);
        scm
    }

    /// Repository URLs in configuration order
    pub fn remote_urls(&self) -> Vec<String> {
        self.entries(REMOTES, REMOTE, "url")
    }

    pub fn add_remote(&mut self, url: &str) {
        let remote = XmlNode::new(REMOTE).with_child(XmlNode::with_text("url", url));
        self.node.ensure_path(REMOTES).append_child(remote);
    }

    /// Branch specifiers to build, e.g. `*/main`
    pub fn branch_specs(&self) -> Vec<String> {
        self.entries(BRANCHES, BRANCH, "name")
    }

    pub fn add_branch(&mut self, spec: &str) {
        let branch = XmlNode::new(BRANCH).with_child(XmlNode::with_text("name", spec));
        self.node.ensure_path(BRANCHES).append_child(branch);
    }

    fn entries(&self, container: &str, entry: &str, field: &str) -> Vec<String> {
        let Some(container) = self.node.child(container) else {
            return Vec::new();
        };
        container
            .children_named(entry)
            .filter_map(|e| e.child(field))
            .map(XmlNode::text)
            .collect()
    }
}

impl XmlPlugin for GitScm {
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

impl XmlPluginType for GitScm {
    fn metadata() -> PluginMetadata {
        PluginMetadata {
            name: "Git",
            namespace: Namespace::Scm,
            type_token: TYPE_TOKEN,
            aliases: &["git"],
            description: "Checks out sources from Git repositories",
            capabilities: PluginCapabilities::NONE,
        }
    }

    fn from_node(node: XmlNode) -> JenkinsResult<Self> {
        Ok(Self { node })
    }
}
