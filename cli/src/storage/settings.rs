//! Settings file management

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::editor::EditorKind;
use crate::errors::CommandError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Directory for rolling log files; stderr only when absent
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_logs: bool,

    /// Directory new projects are created in
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,

    /// Remote API version used for SOAP endpoints
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Login endpoint used when a payload does not carry one
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Base URL of the local UI server
    #[serde(default = "default_ui_base_url")]
    pub ui_base_url: String,

    /// Per-editor executable overrides
    #[serde(default)]
    pub editors: BTreeMap<EditorKind, PathBuf>,

    /// Timeout applied to every remote HTTP request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Delay between status checks of a running deploy or retrieve
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// How long a deploy or retrieve may run before it is reported as failed
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_secs: u64,
}

fn default_workspace() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("workspaces")
        .join("mavensmate")
}

fn default_api_version() -> String {
    "58.0".to_string()
}

fn default_login_url() -> String {
    "https://login.salesforce.com".to_string()
}

fn default_ui_base_url() -> String {
    "http://localhost:56248".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_operation_timeout() -> u64 {
    600
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_dir: None,
            json_logs: false,
            workspace: default_workspace(),
            api_version: default_api_version(),
            login_url: default_login_url(),
            ui_base_url: default_ui_base_url(),
            editors: BTreeMap::new(),
            request_timeout_secs: default_request_timeout(),
            poll_interval_ms: default_poll_interval(),
            operation_timeout_secs: default_operation_timeout(),
        }
    }
}

impl Settings {
    /// Load settings from `file`, falling back to defaults when it is missing
    pub async fn load(file: &File) -> Result<Self, CommandError> {
        if !file.exists().await {
            debug!("No settings file at {:?}, using defaults", file.path());
            return Ok(Self::default());
        }

        file.read_json().await.map_err(|e| {
            CommandError::Config(format!("Unable to read {}: {}", file.path().display(), e))
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}
