pub mod config;
pub mod jenkins;
pub mod logging;
pub mod plugins;
pub mod transport;

pub use config::{
    ConfigLoadError,
    CredentialConfig,
    ServerEntry,
};
pub use jenkins::{
    Jenkins,
    JenkinsBuilder,
};
pub use jenkins_remote_api::{
    Credentials,
    JenkinsError,
    JenkinsResult,
};
pub use plugins::create_plugin_registry;
pub use transport::ReqwestSession;
