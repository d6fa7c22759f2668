use std::any::Any;
use std::fmt;

use serde::Serialize;

use crate::error::JenkinsResult;
use crate::model::{
    Job,
    View,
};
use crate::xml::XmlNode;

/// Independent token spaces in the plugin registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    View,
    Job,
    Builder,
    Publisher,
    Scm,
    Trigger,
}

impl Namespace {
    /// Namespaces whose plugins wrap embedded config fragments
    pub const FRAGMENTS: [Namespace; 4] = [
        Namespace::Builder,
        Namespace::Publisher,
        Namespace::Scm,
        Namespace::Trigger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::View => "view",
            Namespace::Job => "job",
            Namespace::Builder => "builder",
            Namespace::Publisher => "publisher",
            Namespace::Scm => "scm",
            Namespace::Trigger => "trigger",
        }
    }

    pub fn is_fragment(&self) -> bool {
        Self::FRAGMENTS.contains(self)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plugin metadata - describes one registered type
#[derive(Debug, Clone, Serialize)]
pub struct PluginMetadata {
    /// Human readable name (e.g., "List View")
    pub name: &'static str,
    pub namespace: Namespace,
    /// Fully qualified server-side class name
    pub type_token: &'static str,
    /// Short names accepted as a fallback after qualified names
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub capabilities: PluginCapabilities,
}

/// Plugin capabilities - optional features a specialized type adds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PluginCapabilities {
    /// View may contain other views
    pub sub_views: bool,
    /// Job config carries an SCM block
    pub scm: bool,
    /// Job supports a custom workspace directory
    pub custom_workspace: bool,
    pub builders: bool,
    pub publishers: bool,
    pub triggers: bool,
}

impl PluginCapabilities {
    pub const NONE: PluginCapabilities = PluginCapabilities {
        sub_views: false,
        scm: false,
        custom_workspace: false,
        builders: false,
        publishers: false,
        triggers: false,
    };
}

/// Typed view instance produced by the registry
pub trait ViewPlugin: Send + Sync + fmt::Debug {
    fn view(&self) -> &View;

    fn type_token(&self) -> &str;

    fn capabilities(&self) -> PluginCapabilities;

    fn contains_views(&self) -> bool {
        self.capabilities().sub_views
    }

    fn as_any(&self) -> &dyn Any;
}

/// Constructor side of a view plugin
pub trait ViewPluginType: ViewPlugin + Sized + 'static {
    fn metadata() -> PluginMetadata;

    fn from_view(view: View) -> Self;
}

impl dyn ViewPlugin {
    pub fn downcast_ref<T: ViewPlugin + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Typed job instance produced by the registry
pub trait JobPlugin: Send + Sync + fmt::Debug {
    fn job(&self) -> &Job;

    fn type_token(&self) -> &str;

    fn capabilities(&self) -> PluginCapabilities;

    fn as_any(&self) -> &dyn Any;
}

/// Constructor side of a job plugin
pub trait JobPluginType: JobPlugin + Sized + 'static {
    fn metadata() -> PluginMetadata;

    fn from_job(job: Job) -> Self;

    /// Config XML posted by `create_job`; types without one cannot be created
    fn template_config_xml() -> Option<String> {
        None
    }
}

impl dyn JobPlugin {
    pub fn downcast_ref<T: JobPlugin + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Typed wrapper over an embedded config fragment (builder, publisher, SCM, trigger)
pub trait XmlPlugin: Send + Sync + fmt::Debug {
    fn node(&self) -> &XmlNode;

    fn namespace(&self) -> Namespace;

    fn type_token(&self) -> &str {
        self.node().type_token()
    }

    fn as_any(&self) -> &dyn Any;
}

/// Constructor side of a fragment plugin
pub trait XmlPluginType: XmlPlugin + Sized + 'static {
    fn metadata() -> PluginMetadata;

    fn from_node(node: XmlNode) -> JenkinsResult<Self>;

    fn template_xml() -> Option<String> {
        None
    }
}

impl dyn XmlPlugin {
    pub fn downcast_ref<T: XmlPlugin + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Capability-limited proxy for views whose type has no registered plugin
#[derive(Debug, Clone)]
pub struct GenericView {
    view: View,
    token: String,
}

impl GenericView {
    pub fn new(view: View, token: impl Into<String>) -> Self {
        Self {
            view,
            token: token.into(),
        }
    }

    pub fn into_view(self) -> View {
        self.view
    }
}

impl ViewPlugin for GenericView {
    fn view(&self) -> &View {
        &self.view
    }

    fn type_token(&self) -> &str {
        &self.token
    }

    fn capabilities(&self) -> PluginCapabilities {
        PluginCapabilities::NONE
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Capability-limited proxy for jobs whose type has no registered plugin
#[derive(Debug, Clone)]
pub struct GenericJob {
    job: Job,
    token: String,
}

impl GenericJob {
    pub fn new(job: Job, token: impl Into<String>) -> Self {
        Self {
            job,
            token: token.into(),
        }
    }

    pub fn into_job(self) -> Job {
        self.job
    }
}

impl JobPlugin for GenericJob {
    fn job(&self) -> &Job {
        &self.job
    }

    fn type_token(&self) -> &str {
        &self.token
    }

    fn capabilities(&self) -> PluginCapabilities {
        PluginCapabilities::NONE
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
