pub mod document;
pub mod error;
pub mod handle;
pub mod model;
pub mod plugin;
pub mod poll;
pub mod registry;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod transport;
pub mod types;
pub mod xml;

pub use document::ConfigDocument;
pub use error::{
    JenkinsError,
    JenkinsResult,
};
pub use handle::ResourceHandle;
pub use model::{
    Build,
    Job,
    Node,
    Queue,
    QueueItem,
    View,
    ViewMetrics,
};
pub use plugin::{
    GenericJob,
    GenericView,
    JobPlugin,
    JobPluginType,
    Namespace,
    PluginCapabilities,
    PluginMetadata,
    ViewPlugin,
    ViewPluginType,
    XmlPlugin,
    XmlPluginType,
};
pub use poll::{
    WaitOutcome,
    WaitPolicy,
};
pub use registry::PluginRegistry;
pub use transport::{
    Credentials,
    HttpResponse,
    HttpSession,
    PostBody,
};
pub use xml::XmlNode;

/// Generates `pub fn register(&mut PluginRegistry)` for a plugin crate.
///
/// ```ignore
/// register_plugins!(register_view(ListView), register_fragment(ShellBuilder));
/// ```
#[macro_export]
macro_rules! register_plugins {
    ($($kind:ident($plugin:ty)),+ $(,)?) => {
        pub fn register(registry: &mut $crate::PluginRegistry) -> $crate::JenkinsResult<()> {
            $(registry.$kind::<$plugin>()?;)+
            Ok(())
        }
    };
}
