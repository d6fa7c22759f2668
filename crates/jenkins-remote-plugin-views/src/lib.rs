//! View type plugins for jenkins-remote
//!
//! Each type wraps the base [`View`](jenkins_remote_api::View) proxy and adds
//! the operations its server-side class supports:
//! - `AllView` - the built-in view listing every job
//! - `ListView` - explicit job list plus an optional include regex
//! - `MyView` - jobs the current user has access to
//! - `NestedView` - a container of other views
//! - `StatusView` - build status overview from the status-view plugin
//!
//! # Example Usage
//!
//! ```no_run
//! use jenkins_remote_api::PluginRegistry;
//!
//! let mut registry = PluginRegistry::new();
//! jenkins_remote_plugin_views::register(&mut registry).unwrap();
//! ```

mod all;
mod list;
mod my;
mod nested;
mod status;

pub use all::AllView;
pub use list::ListView;
pub use my::MyView;
pub use nested::NestedView;
pub use status::StatusView;

jenkins_remote_api::register_plugins!(
    register_view(AllView),
    register_view(ListView),
    register_view(MyView),
    register_view(NestedView),
    register_view(StatusView),
);

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use jenkins_remote_api::testing::MockSession;
    use jenkins_remote_api::{
        PluginRegistry,
        ResourceHandle,
        View,
    };

    pub fn registry() -> Arc<PluginRegistry> {
        let mut registry = PluginRegistry::new();
        crate::register(&mut registry).unwrap();
        Arc::new(registry)
    }

    pub fn view(session: &MockSession, url: &str) -> View {
        View::new(ResourceHandle::new(url, session.shared(), registry()))
    }
}
