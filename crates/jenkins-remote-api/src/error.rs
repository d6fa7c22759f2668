use thiserror::Error;

use crate::plugin::Namespace;

/// Error kinds surfaced by every remote operation
#[derive(Error, Debug)]
pub enum JenkinsError {
    #[error("Transport error for {url}: {message}")]
    Transport {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Malformed config XML: {0}")]
    MalformedConfig(String),

    #[error("No {namespace} plugin registered for type '{token}'")]
    UnsupportedPlugin { namespace: Namespace, token: String },

    #[error("Duplicate {namespace} plugin registration for type '{token}'")]
    DuplicatePlugin { namespace: Namespace, token: String },

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type JenkinsResult<T> = Result<T, JenkinsError>;

impl JenkinsError {
    pub fn transport(url: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        JenkinsError::Transport {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    pub fn unsupported(namespace: Namespace, token: impl Into<String>) -> Self {
        JenkinsError::UnsupportedPlugin {
            namespace,
            token: token.into(),
        }
    }

    /// HTTP status carried by a transport failure, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            JenkinsError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Token that failed plugin resolution
    pub fn unresolved_token(&self) -> Option<&str> {
        match self {
            JenkinsError::UnsupportedPlugin { token, .. } => Some(token),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for JenkinsError {
    fn from(err: serde_json::Error) -> Self {
        JenkinsError::Decode(err.to_string())
    }
}

impl From<quick_xml::Error> for JenkinsError {
    fn from(err: quick_xml::Error) -> Self {
        JenkinsError::MalformedConfig(err.to_string())
    }
}
