use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::{
        SubscriberInitExt,
        TryInitError,
    },
    EnvFilter,
};

/// Crates in this workspace that emit events
pub const LOG_TARGETS: &[&str] = &[
    "jenkins_remote_core",
    "jenkins_remote_api",
    "jenkins_remote_plugin_views",
    "jenkins_remote_plugin_freestyle",
    "jenkins_remote_plugin_publishers",
];

pub const DEFAULT_LOG_FILTER: &str = "jenkins_remote_core=info,jenkins_remote_api=info";

/// Filter directive enabling `level` for every workspace crate
pub fn filter_for_level(level: &str) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the global subscriber; `RUST_LOG` overrides the default filter.
///
/// Fails if the application already installed a subscriber.
pub fn init() -> Result<(), TryInitError> {
    init_with_default(DEFAULT_LOG_FILTER)
}

pub fn init_with_default(default_filter: &str) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
}

/// Debug output for every HTTP call and protocol step
pub fn init_dev() -> Result<(), TryInitError> {
    init_with_default(&filter_for_level("debug"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_covers_every_crate() {
        let filter = filter_for_level("debug");

        assert!(filter.starts_with("jenkins_remote_core=debug,"));
        assert_eq!(filter.split(',').count(), LOG_TARGETS.len());
        assert!(EnvFilter::try_new(&filter).is_ok());
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn test_second_init_is_rejected() {
        assert!(init_dev().is_ok());
        assert!(init().is_err());
    }
}
