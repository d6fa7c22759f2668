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

pub const TYPE_TOKEN: &str = "org.jenkinsci.plugins.artifactdeployer.ArtifactDeployerPublisher";

const ENTRY: &str = "org.jenkinsci.plugins.artifactdeployer.ArtifactDeployerEntry";
const ENTRIES: &str = "entries";

/// Publisher copying build artifacts to one or more remote directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDeployer {
    node: XmlNode,
}

/// One set of artifacts and where it is deployed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDeployerEntry {
    pub includes: String,
    pub excludes: Option<String>,
    pub base_dir: Option<String>,
    pub remote: String,
    pub flatten: bool,
}

impl ArtifactDeployerEntry {
    pub fn new(includes: &str, remote: &str) -> Self {
        Self {
            includes: includes.to_string(),
            excludes: None,
            base_dir: None,
            remote: remote.to_string(),
            flatten: false,
        }
    }

    fn from_node(node: &XmlNode) -> JenkinsResult<Self> {
        if node.tag() != ENTRY {
            return Err(JenkinsError::MalformedConfig(format!(
                "unexpected artifact deployer entry <{}>",
                node.tag()
            )));
        }

        let text = |tag: &str| {
            node.child(tag)
                .map(XmlNode::text)
                .filter(|v| !v.is_empty())
        };
        Ok(Self {
            includes: text("includes").unwrap_or_default(),
            excludes: text("excludes"),
            base_dir: text("basedir"),
            remote: text("remote").unwrap_or_default(),
            flatten: text("flatten").is_some_and(|v| v.trim() == "true"),
        })
    }

    fn to_node(&self) -> XmlNode {
        XmlNode::new(ENTRY)
            .with_child(XmlNode::with_text("includes", &self.includes))
            .with_child(XmlNode::with_text(
                "basedir",
                self.base_dir.clone().unwrap_or_default(),
            ))
            .with_child(XmlNode::with_text(
                "excludes",
                self.excludes.clone().unwrap_or_default(),
            ))
            .with_child(XmlNode::with_text("remote", &self.remote))
            .with_child(XmlNode::with_text("flatten", self.flatten.to_string()))
            .with_child(XmlNode::with_text("deleteRemote", "false"))
            .with_child(XmlNode::with_text("deleteRemoteArtifacts", "false"))
            .with_child(XmlNode::with_text("failNoFilesDeploy", "false"))
    }
}

impl ArtifactDeployer {
    pub fn instantiate(entries: &[ArtifactDeployerEntry]) -> Self {
        let mut deployer = Self {
            node: XmlNode::new(TYPE_TOKEN)
                .with_child(XmlNode::new(ENTRIES))
                .with_child(XmlNode::with_text("deployEvenBuildFail", "false")),
        };
        for entry in entries {
            deployer.add_entry(entry);
        }
        deployer
    }

    /// Every configured deployment; an unrecognized entry fails the call
    pub fn entries(&self) -> JenkinsResult<Vec<ArtifactDeployerEntry>> {
        let Some(entries) = self.node.child(ENTRIES) else {
            return Ok(Vec::new());
        };
        entries
            .elements()
            .map(ArtifactDeployerEntry::from_node)
            .collect()
    }

    pub fn add_entry(&mut self, entry: &ArtifactDeployerEntry) {
        self.node.ensure_path(ENTRIES).append_child(entry.to_node());
    }
}

impl XmlPlugin for ArtifactDeployer {
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

impl XmlPluginType for ArtifactDeployer {
    fn metadata() -> PluginMetadata {
        PluginMetadata {
            name: "Artifact Deployer",
            namespace: Namespace::Publisher,
            type_token: TYPE_TOKEN,
            aliases: &["artifactdeployer"],
            description: "Deploys build artifacts to remote locations",
            capabilities: PluginCapabilities::NONE,
        }
    }

    fn from_node(node: XmlNode) -> JenkinsResult<Self> {
        Ok(Self { node })
    }

    fn template_xml() -> Option<String> {
        Self::instantiate(&[]).node.to_template_xml()
    }
}
