//! Structured view over a job or view `config.xml`
//!
//! Edits only touch the in-memory tree; nothing reaches the server until the
//! owning proxy posts the document back.

use crate::error::{
    JenkinsError,
    JenkinsResult,
};
use crate::plugin::{
    Namespace,
    XmlPlugin,
};
use crate::registry::PluginRegistry;
use crate::xml::{
    parse_tree,
    serialize_tree,
    XmlNode,
    XmlTree,
};

const SCM: &str = "scm";
const BUILDERS: &str = "builders";
const PUBLISHERS: &str = "publishers";
const TRIGGERS: &str = "triggers";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    tree: XmlTree,
}

impl ConfigDocument {
    pub fn parse(xml: &str) -> JenkinsResult<Self> {
        Ok(Self {
            tree: parse_tree(xml)?,
        })
    }

    pub fn from_root(root: XmlNode) -> Self {
        Self {
            tree: XmlTree::from_root(root),
        }
    }

    pub fn to_xml(&self) -> JenkinsResult<String> {
        serialize_tree(&self.tree)
    }

    pub fn root(&self) -> &XmlNode {
        &self.tree.root
    }

    pub fn root_mut(&mut self) -> &mut XmlNode {
        &mut self.tree.root
    }

    /// Root `class` attribute, or the root tag
    pub fn type_token(&self) -> &str {
        self.tree.root.type_token()
    }

    /// Text of the element at a `/`-separated path below the root
    pub fn get(&self, path: &str) -> Option<String> {
        self.tree.root.find(path).map(XmlNode::text)
    }

    /// Sets element text, creating missing elements along the path
    pub fn set(&mut self, path: &str, text: impl Into<String>) {
        self.tree.root.ensure_path(path).set_text(text);
    }

    /// Rewrites the `name` element, or a `name` attribute on the root if that
    /// is where this document keeps it
    pub fn rename(&mut self, name: &str) {
        if self.tree.root.child("name").is_none() && self.tree.root.attribute("name").is_some() {
            self.tree.root.set_attribute("name", name);
        } else {
            self.set("name", name);
        }
    }

    pub fn name(&self) -> Option<String> {
        self.get("name")
            .or_else(|| self.tree.root.attribute("name").map(str::to_string))
    }

    pub fn description(&self) -> Option<String> {
        self.get("description")
    }

    pub fn set_description(&mut self, description: &str) {
        self.set("description", description);
    }

    pub fn is_disabled(&self) -> bool {
        self.get("disabled").is_some_and(|v| v.trim() == "true")
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.set("disabled", disabled.to_string());
    }

    /// `None` when the job uses the server-wide default
    pub fn quiet_period(&self) -> JenkinsResult<Option<u32>> {
        self.get("quietPeriod")
            .map(|v| {
                v.trim().parse::<u32>().map_err(|e| {
                    JenkinsError::MalformedConfig(format!("invalid quietPeriod '{v}': {e}"))
                })
            })
            .transpose()
    }

    pub fn set_quiet_period(&mut self, seconds: u32) {
        self.set("quietPeriod", seconds.to_string());
    }

    /// Custom workspace directory, `None` when the default workspace is used
    pub fn custom_workspace(&self) -> Option<String> {
        self.get("customWorkspace").filter(|p| !p.is_empty())
    }

    pub fn set_custom_workspace(&mut self, path: &str) {
        if path.is_empty() {
            self.tree.root.remove_children("customWorkspace");
        } else {
            self.set("customWorkspace", path);
        }
    }

    /// The SCM block resolved through the registry; `None` if the document has none
    pub fn scm(&self, registry: &PluginRegistry) -> JenkinsResult<Option<Box<dyn XmlPlugin>>> {
        self.tree.root
            .child(SCM)
            .map(|node| registry.resolve_fragment(Namespace::Scm, node))
            .transpose()
    }

    /// Replaces the SCM block, keeping its position in the document
    pub fn set_scm(&mut self, scm: &dyn XmlPlugin) {
        let mut node = scm.node().clone();
        node.set_tag(SCM);
        match self.tree.root.child_mut(SCM) {
            Some(existing) => *existing = node,
            None => self.tree.root.append_child(node),
        }
    }

    pub fn builders(&self, registry: &PluginRegistry) -> JenkinsResult<Vec<Box<dyn XmlPlugin>>> {
        self.fragments(registry, BUILDERS, Namespace::Builder)
    }

    pub fn publishers(&self, registry: &PluginRegistry) -> JenkinsResult<Vec<Box<dyn XmlPlugin>>> {
        self.fragments(registry, PUBLISHERS, Namespace::Publisher)
    }

    pub fn triggers(&self, registry: &PluginRegistry) -> JenkinsResult<Vec<Box<dyn XmlPlugin>>> {
        self.fragments(registry, TRIGGERS, Namespace::Trigger)
    }

    pub fn append_builder(&mut self, builder: &dyn XmlPlugin) {
        self.append_fragment(BUILDERS, builder);
    }

    pub fn append_publisher(&mut self, publisher: &dyn XmlPlugin) {
        self.append_fragment(PUBLISHERS, publisher);
    }

    pub fn append_trigger(&mut self, trigger: &dyn XmlPlugin) {
        self.append_fragment(TRIGGERS, trigger);
    }

    /// Swaps the `index`-th builder for an edited copy
    pub fn replace_builder(&mut self, index: usize, builder: &dyn XmlPlugin) -> JenkinsResult<()> {
        self.replace_fragment(BUILDERS, index, builder)
    }

    pub fn replace_publisher(
        &mut self, index: usize, publisher: &dyn XmlPlugin,
    ) -> JenkinsResult<()> {
        self.replace_fragment(PUBLISHERS, index, publisher)
    }

    /// Resolves every child of a container; one unknown child fails the call
    fn fragments(
        &self, registry: &PluginRegistry, container: &str, namespace: Namespace,
    ) -> JenkinsResult<Vec<Box<dyn XmlPlugin>>> {
        let Some(node) = self.tree.root.child(container) else {
            return Ok(Vec::new());
        };
        node.elements()
            .map(|child| registry.resolve_fragment(namespace, child))
            .collect()
    }

    fn append_fragment(&mut self, container: &str, fragment: &dyn XmlPlugin) {
        self.tree.root
            .ensure_path(container)
            .append_child(fragment.node().clone());
    }

    fn replace_fragment(
        &mut self, container: &str, index: usize, fragment: &dyn XmlPlugin,
    ) -> JenkinsResult<()> {
        self.tree.root
            .find_mut(container)
            .and_then(|node| node.replace_element(index, fragment.node().clone()))
            .map(|_| ())
            .ok_or_else(|| {
                JenkinsError::MalformedConfig(format!("no {container} entry at index {index}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::plugin::{
        PluginCapabilities,
        PluginMetadata,
        XmlPluginType,
    };

    const PROJECT: &str = r#"<?xml version='1.1' encoding='UTF-8'?>
<project>
  <actions/>
  <description>demo</description>
  <keepDependencies>false</keepDependencies>
  <properties>
    <com.example.UnknownProperty plugin="unknown@1.0">
      <flag>true</flag>
    </com.example.UnknownProperty>
  </properties>
  <scm class="hudson.scm.NullSCM"/>
  <disabled>false</disabled>
  <builders>
    <hudson.tasks.Shell>
      <command>make</command>
    </hudson.tasks.Shell>
  </builders>
  <publishers/>
</project>"#;

    #[derive(Debug)]
    struct Shell {
        node: XmlNode,
    }

    impl XmlPlugin for Shell {
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

    impl XmlPluginType for Shell {
        fn metadata() -> PluginMetadata {
            PluginMetadata {
                name: "Shell",
                namespace: Namespace::Builder,
                type_token: "hudson.tasks.Shell",
                aliases: &[],
                description: "",
                capabilities: PluginCapabilities::NONE,
            }
        }

        fn from_node(node: XmlNode) -> JenkinsResult<Self> {
            Ok(Self { node })
        }
    }

    #[derive(Debug)]
    struct NullScm {
        node: XmlNode,
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
                type_token: "hudson.scm.NullSCM",
                aliases: &[],
                description: "",
                capabilities: PluginCapabilities::NONE,
            }
        }

        fn from_node(node: XmlNode) -> JenkinsResult<Self> {
            Ok(Self { node })
        }
    }

    fn registry() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.register_fragment::<Shell>().unwrap();
        registry.register_fragment::<NullScm>().unwrap();
        registry
    }

    fn shell(command: &str) -> Shell {
        Shell {
            node: XmlNode::new("hudson.tasks.Shell")
                .with_child(XmlNode::with_text("command", command)),
        }
    }

    #[test]
    fn test_round_trip_preserves_document() {
        let doc = ConfigDocument::parse(PROJECT).unwrap();
        let reparsed = ConfigDocument::parse(&doc.to_xml().unwrap()).unwrap();
        assert_eq!(reparsed, doc);
        let xml = doc.to_xml().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.1\" encoding=\"UTF-8\"?>\n<project>"));
    }

    #[test]
    fn test_comments_around_root_survive() {
        let xml = "<?xml version=\"1.1\" encoding=\"UTF-8\"?>\n<!-- keep me -->\n<?editor tabs=2?>\n<project><a>1</a></project>\n<!-- trailer -->";
        let doc = ConfigDocument::parse(xml).unwrap();

        assert_eq!(doc.to_xml().unwrap(), xml);
        assert_eq!(doc.get("a").as_deref(), Some("1"));
    }

    #[test]
    fn test_edit_keeps_unknown_elements() {
        let mut doc = ConfigDocument::parse(PROJECT).unwrap();
        doc.set_custom_workspace("/tmp/ws");
        doc.set_disabled(true);

        let reparsed = ConfigDocument::parse(&doc.to_xml().unwrap()).unwrap();
        assert_eq!(reparsed.custom_workspace().as_deref(), Some("/tmp/ws"));
        assert!(reparsed.is_disabled());
        assert_eq!(
            reparsed.get("properties/com.example.UnknownProperty/flag").as_deref(),
            Some("true")
        );
        assert_eq!(
            reparsed
                .root()
                .find("properties/com.example.UnknownProperty")
                .and_then(|n| n.attribute("plugin")),
            Some("unknown@1.0")
        );
    }

    #[test]
    fn test_typed_accessors() {
        let mut doc = ConfigDocument::parse(PROJECT).unwrap();
        assert_eq!(doc.type_token(), "project");
        assert_eq!(doc.description().as_deref(), Some("demo"));
        assert_eq!(doc.quiet_period().unwrap(), None);
        assert_eq!(doc.custom_workspace(), None);

        doc.set_quiet_period(5);
        assert_eq!(doc.quiet_period().unwrap(), Some(5));

        doc.set("quietPeriod", "soon");
        assert!(doc.quiet_period().is_err());
    }

    #[test]
    fn test_rename_touches_only_name() {
        let xml = "<hudson.model.ListView><name>V1</name><filterQueue>false</filterQueue><jobNames><string>a</string></jobNames></hudson.model.ListView>";
        let mut doc = ConfigDocument::parse(xml).unwrap();
        let before = doc.clone();
        doc.rename("V2");

        assert_eq!(doc.name().as_deref(), Some("V2"));
        assert_eq!(doc.root().find("jobNames"), before.root().find("jobNames"));
        assert_eq!(doc.type_token(), "hudson.model.ListView");
    }

    #[test]
    fn test_scm_and_builders_resolve() {
        let doc = ConfigDocument::parse(PROJECT).unwrap();
        let registry = registry();

        let scm = doc.scm(&registry).unwrap().unwrap();
        assert_eq!(scm.type_token(), "hudson.scm.NullSCM");

        let builders = doc.builders(&registry).unwrap();
        assert_eq!(builders.len(), 1);
        assert!(builders[0].downcast_ref::<Shell>().is_some());
        assert!(doc.publishers(&registry).unwrap().is_empty());
        assert!(doc.triggers(&registry).unwrap().is_empty());
    }

    #[test]
    fn test_builders_are_all_or_nothing() {
        let mut doc = ConfigDocument::parse(PROJECT).unwrap();
        doc.root_mut()
            .ensure_path("builders")
            .append_child(XmlNode::new("hudson.tasks.Ant"));

        let err = doc.builders(&registry()).unwrap_err();
        assert_eq!(err.unresolved_token(), Some("hudson.tasks.Ant"));
    }

    #[test]
    fn test_unknown_scm_is_unsupported() {
        let doc = ConfigDocument::parse(
            r#"<project><scm class="hudson.plugins.git.GitSCM" plugin="git@4.0"/></project>"#,
        )
        .unwrap();
        let err = doc.scm(&registry()).unwrap_err();
        assert_eq!(err.unresolved_token(), Some("hudson.plugins.git.GitSCM"));

        let doc = ConfigDocument::parse("<project/>").unwrap();
        assert!(doc.scm(&registry()).unwrap().is_none());
    }

    #[test]
    fn test_append_builder_preserves_order() {
        let mut doc = ConfigDocument::parse(PROJECT).unwrap();
        doc.append_builder(&shell("make test"));
        doc.append_builder(&shell("make install"));

        let commands: Vec<_> = doc
            .builders(&registry())
            .unwrap()
            .iter()
            .map(|b| b.node().find("command").unwrap().text())
            .collect();
        assert_eq!(commands, vec!["make", "make test", "make install"]);

        doc.replace_builder(0, &shell("make all")).unwrap();
        assert_eq!(doc.get("builders/hudson.tasks.Shell/command").as_deref(), Some("make all"));
        assert!(doc.replace_builder(7, &shell("x")).is_err());
    }

    #[test]
    fn test_append_creates_missing_container() {
        let mut doc = ConfigDocument::parse("<project><scm class=\"hudson.scm.NullSCM\"/></project>")
            .unwrap();
        doc.append_builder(&shell("ls"));
        assert_eq!(doc.builders(&registry()).unwrap().len(), 1);
    }

    #[test]
    fn test_set_scm_replaces_in_place() {
        let mut doc = ConfigDocument::parse(PROJECT).unwrap();
        let scm = NullScm {
            node: XmlNode::new("scm").with_attribute("class", "hudson.scm.NullSCM"),
        };
        let before: Vec<_> = doc.root().elements().map(|e| e.tag().to_string()).collect();
        doc.set_scm(&scm);
        let after: Vec<_> = doc.root().elements().map(|e| e.tag().to_string()).collect();
        assert_eq!(before, after);
    }
}
