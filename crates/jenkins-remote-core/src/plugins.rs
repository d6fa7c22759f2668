use jenkins_remote_api::{
    JenkinsResult,
    PluginRegistry,
};

/// Registry holding every plugin bundled with the workspace
pub fn create_plugin_registry() -> JenkinsResult<PluginRegistry> {
    let mut registry = PluginRegistry::new();

    jenkins_remote_plugin_views::register(&mut registry)?;
    jenkins_remote_plugin_freestyle::register(&mut registry)?;
    jenkins_remote_plugin_publishers::register(&mut registry)?;

    tracing::debug!(plugins = registry.count(), "Plugin registry assembled");
    Ok(registry)
}
