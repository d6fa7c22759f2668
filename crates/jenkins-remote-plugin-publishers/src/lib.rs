//! Publisher plugins for jenkins-remote
//!
//! - `BuildTriggerPublisher` - starts downstream jobs after a build
//! - `ArtifactDeployer` - copies build artifacts to remote locations
//!
//! Both wrap the publisher element found under `<publishers>` in a job config
//! and are resolved through the `publisher` namespace of the registry.

mod artifact_deployer;
mod build_trigger;

pub use artifact_deployer::{
    ArtifactDeployer,
    ArtifactDeployerEntry,
};
pub use build_trigger::BuildTriggerPublisher;

jenkins_remote_api::register_plugins!(
    register_fragment(BuildTriggerPublisher),
    register_fragment(ArtifactDeployer),
);
