//! Domain proxies over the server object graph

mod build;
mod job;
mod node;
mod queue;
mod view;

pub use build::Build;
pub use job::{
    job_path,
    Job,
};
pub use node::{
    node_path,
    Node,
};
pub use queue::{
    Queue,
    QueueItem,
};
pub use view::{
    create_view_form,
    view_path,
    view_url,
    walk_views,
    View,
    ViewMetrics,
};

#[cfg(test)]
pub(crate) fn test_handle(
    session: &crate::testing::MockSession, url: &str,
) -> crate::handle::ResourceHandle {
    crate::handle::ResourceHandle::new(
        url,
        session.shared(),
        std::sync::Arc::new(crate::registry::PluginRegistry::new()),
    )
}
