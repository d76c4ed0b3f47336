//! Runner configuration.
//!
//! Stored as TOML:
//! - Linux: `~/.config/devtap/devtap.toml`
//! - Windows: `%APPDATA%/devtap/devtap.toml`

use std::path::{Path, PathBuf};

use devtap::{DebugOptions, Position, RequestKind, Theme};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub position: Position,

    #[serde(default)]
    pub theme: Theme,

    /// Directory the JSON exports are written to.
    #[serde(default = "default_export_dir")]
    pub export_dir: String,

    /// Event-style requests still pending after this long are aborted.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Requests issued on every run.
    #[serde(default)]
    pub requests: Vec<RequestSpec>,
}

/// One request issued by the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    pub url: String,

    #[serde(default = "default_method")]
    pub method: String,

    /// Which host mechanism issues it.
    #[serde(default = "default_kind")]
    pub kind: RequestKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestSpec {
    /// A plain `GET` through the promise-style function.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            kind: default_kind(),
            body: None,
        }
    }
}

fn default_export_dir() -> String {
    "devtap-export".into()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_method() -> String {
    "GET".into()
}

fn default_kind() -> RequestKind {
    RequestKind::Fetch
}

impl Default for Config {
    fn default() -> Self {
        Self {
            position: Position::default(),
            theme: Theme::default(),
            export_dir: default_export_dir(),
            request_timeout_ms: default_request_timeout_ms(),
            requests: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Request bodies may carry credentials; keep the file private on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn options(&self) -> DebugOptions {
        DebugOptions {
            position: self.position,
            theme: self.theme,
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("devtap")
            .join("devtap.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("devtap").join("devtap.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/devtap/devtap.toml"))
    }
}
