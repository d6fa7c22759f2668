//! Credential config file: per-server usernames and API tokens
//!
//! ```toml
//! [[server]]
//! url = "https://jenkins.example.com"
//! username = "admin"
//! token = "${JENKINS_TOKEN}"
//! ssl_verify = true
//! ```

use std::path::{
    Path,
    PathBuf,
};
use std::sync::LazyLock;

use jenkins_remote_api::{
    Credentials,
    JenkinsError,
};
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV_VAR: &str = "JENKINS_REMOTE_CONFIG";

const MAX_INTERPOLATION_DEPTH: usize = 10;

static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("Invalid regex pattern")
});

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Required environment variable not found: {0}")]
    MissingVariable(String),

    #[error("Recursive interpolation limit exceeded")]
    RecursionLimit,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type ConfigLoadResult<T> = Result<T, ConfigLoadError>;

impl From<ConfigLoadError> for JenkinsError {
    fn from(err: ConfigLoadError) -> Self {
        JenkinsError::InvalidConfig(err.to_string())
    }
}

/// One `[[server]]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerEntry {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub ssl_verify: Option<bool>,
}

impl ServerEntry {
    /// Both username and token are needed to authenticate
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.token) {
            (Some(user), Some(token)) => Some(Credentials::new(user, token)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CredentialConfig {
    #[serde(rename = "server")]
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
}

impl CredentialConfig {
    /// `$JENKINS_REMOTE_CONFIG`, else `<config_dir>/jenkins-remote/config.toml`
    pub fn discover_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            tracing::debug!("Using config path from {}: {}", CONFIG_ENV_VAR, path);
            return Some(PathBuf::from(path));
        }

        dirs::config_dir().map(|dir| dir.join("jenkins-remote").join("config.toml"))
    }

    /// Loads the discovered file; a missing file is not an error
    pub fn load_default() -> ConfigLoadResult<Option<Self>> {
        let Some(path) = Self::discover_path() else {
            return Ok(None);
        };
        if !path.exists() {
            tracing::debug!("No credential config at {}", path.display());
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }

    pub fn load(path: &Path) -> ConfigLoadResult<Self> {
        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses TOML and expands `${VAR}` / `${VAR:-default}` in string values
    pub fn parse(content: &str) -> ConfigLoadResult<Self> {
        let mut value: toml::Value = toml::from_str(content)?;
        interpolate_toml(&mut value)?;

        let config: CredentialConfig = value.try_into().map_err(|e| {
            ConfigLoadError::InvalidConfig(format!("Failed to deserialize config: {e}"))
        })?;

        tracing::debug!(servers = config.servers.len(), "Loaded credential config");
        Ok(config)
    }

    /// Entry for `url`: exact match ignoring trailing slashes, else the
    /// longest entry URL that prefixes it
    pub fn find_server(&self, url: &str) -> Option<&ServerEntry> {
        let wanted = normalize(url);

        self.servers
            .iter()
            .find(|s| normalize(&s.url) == wanted)
            .or_else(|| {
                self.servers
                    .iter()
                    .filter(|s| wanted.starts_with(&format!("{}/", normalize(&s.url))))
                    .max_by_key(|s| normalize(&s.url).len())
            })
    }
}

fn normalize(url: &str) -> String {
    url.trim().trim_end_matches('/').to_ascii_lowercase()
}

pub fn interpolate(input: &str) -> ConfigLoadResult<String> {
    interpolate_with_depth(input, 0)
}

fn interpolate_with_depth(input: &str, depth: usize) -> ConfigLoadResult<String> {
    if depth > MAX_INTERPOLATION_DEPTH {
        return Err(ConfigLoadError::RecursionLimit);
    }

    let mut result = String::with_capacity(input.len());
    let mut last = 0;
    for cap in VAR_PATTERN.captures_iter(input) {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let replacement = match std::env::var(name.as_str()) {
            Ok(value) => value,
            Err(_) => match cap.get(2) {
                Some(default) => interpolate_with_depth(default.as_str(), depth + 1)?,
                None => return Err(ConfigLoadError::MissingVariable(name.as_str().to_string())),
            },
        };
        result.push_str(&input[last..whole.start()]);
        result.push_str(&replacement);
        last = whole.end();
    }
    result.push_str(&input[last..]);
    Ok(result)
}

fn interpolate_toml(value: &mut toml::Value) -> ConfigLoadResult<()> {
    match value {
        toml::Value::String(s) => {
            *s = interpolate(s)?;
        }
        toml::Value::Array(arr) => {
            for item in arr {
                interpolate_toml(item)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, v) in table.iter_mut() {
                interpolate_toml(v)?;
            }
        }
        _ => {}
    }
    Ok(())
}
