//! Freestyle job plugin for jenkins-remote
//!
//! Covers the job type most servers use by default together with the config
//! fragments it embeds:
//! - `FreestyleJob` - `hudson.model.FreeStyleProject`
//! - `ShellBuilder` - `hudson.tasks.Shell` build steps
//! - `NullScm`, `GitScm` - source control blocks
//! - `TimerTrigger` - cron style build triggers
//!
//! # Example Usage
//!
//! ```no_run
//! use jenkins_remote_api::PluginRegistry;
//!
//! let mut registry = PluginRegistry::new();
//! jenkins_remote_plugin_freestyle::register(&mut registry).unwrap();
//! ```

mod git;
mod job;
mod null_scm;
mod shell;
mod timer;

pub use git::GitScm;
pub use job::FreestyleJob;
pub use null_scm::NullScm;
pub use shell::ShellBuilder;
pub use timer::TimerTrigger;

jenkins_remote_api::register_plugins!(
    register_job(FreestyleJob),
    register_fragment(ShellBuilder),
    register_fragment(NullScm),
    register_fragment(GitScm),
    register_fragment(TimerTrigger),
);

#[cfg(test)]
mod tests {
    use jenkins_remote_api::{
        Namespace,
        PluginRegistry,
    };

    #[test]
    fn test_register_populates_each_namespace() {
        let mut registry = PluginRegistry::new();
        crate::register(&mut registry).unwrap();

        assert_eq!(registry.count(), 5);
        assert_eq!(
            registry.supported_types(Namespace::Scm),
            vec!["hudson.plugins.git.GitSCM", "hudson.scm.NullSCM"]
        );
        assert_eq!(
            registry.canonical_token(Namespace::Job, "freestyle"),
            Some("hudson.model.FreeStyleProject")
        );
        assert!(registry.template_xml(Namespace::Job, "project").is_ok());
    }
}
