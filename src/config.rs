//! Manager configuration.
//!
//! `ManagerConfig` is passed explicitly into the manager; nothing is read
//! from ambient state. `ServerSettings` mirrors the user-facing settings file
//! an editor host stores next to the plugin.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server name used for sessions and binary file names.
pub const SERVER_NAME: &str = "gopls";
/// Directory name under the storage root that holds the installation.
pub const PACKAGE_NAME: &str = "LSP-gopls";
/// gopls release tag installed by default.
pub const TAG: &str = "0.11.0";
/// Module path passed to the toolchain; `{tag}` is replaced by the desired version.
pub const GOPLS_MODULE_TEMPLATE: &str = "golang.org/x/tools/gopls@v{tag}";
/// Default binary location, relative to the storage root variable.
pub const DEFAULT_COMMAND: &str = "${storage_path}/LSP-gopls/bin/gopls";
/// Build toolchain invoked to fetch and build the server.
pub const TOOLCHAIN: &str = "go";

/// Settings file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration for a single managed server binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    pub server_name: String,
    pub package_name: String,
    /// Root that `${storage_path}` expands to
    pub storage_root: PathBuf,
    /// Version the marker file must match
    pub desired_version: String,
    /// Toolchain program name, looked up on the search path
    pub toolchain: String,
    pub module_template: String,
    /// User override for the binary location
    pub command: Option<String>,
    /// When false the manager never asks for an install
    pub manage_binary: bool,
}

impl ManagerConfig {
    /// Create a gopls configuration rooted at `storage_root`.
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            server_name: SERVER_NAME.to_string(),
            package_name: PACKAGE_NAME.to_string(),
            storage_root: storage_root.into(),
            desired_version: TAG.to_string(),
            toolchain: TOOLCHAIN.to_string(),
            module_template: GOPLS_MODULE_TEMPLATE.to_string(),
            command: None,
            manage_binary: true,
        }
    }

    pub fn with_desired_version(mut self, version: impl Into<String>) -> Self {
        self.desired_version = version.into();
        self
    }

    pub fn with_toolchain(mut self, toolchain: impl Into<String>) -> Self {
        self.toolchain = toolchain.into();
        self
    }

    /// `<storage_root>/<package_name>`
    pub fn base_dir(&self) -> PathBuf {
        self.storage_root.join(&self.package_name)
    }

    /// `<base>/VERSION`
    pub fn marker_path(&self) -> PathBuf {
        self.base_dir().join("VERSION")
    }

    /// Fully-qualified module path embedding the desired version.
    pub fn module_path(&self) -> String {
        self.module_template.replace("{tag}", &self.desired_version)
    }

    /// Apply user settings on top of this configuration.
    pub fn apply_settings(&mut self, settings: &ServerSettings) {
        if let Some(command) = settings.command.as_ref().and_then(|c| c.first()) {
            if !command.trim().is_empty() {
                self.command = Some(command.clone());
            }
        }
        self.manage_binary = settings.settings.manage_gopls_binary;
    }
}

/// User settings file, in the editor host's JSON layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    /// Command line used to start the server; the first element is the binary
    #[serde(default)]
    pub command: Option<Vec<String>>,
    #[serde(default)]
    pub settings: GoplsSettings,
}

/// The `settings` block of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoplsSettings {
    /// Escape hatch for users who supply their own binary
    #[serde(default = "default_manage_binary")]
    pub manage_gopls_binary: bool,
}

impl Default for GoplsSettings {
    fn default() -> Self {
        Self {
            manage_gopls_binary: default_manage_binary(),
        }
    }
}

fn default_manage_binary() -> bool {
    true
}

impl ServerSettings {
    /// Parse settings from a JSON string.
    pub fn from_json(content: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Load settings from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let settings = Self::from_json(&content, &display)?;
        log::debug!(
            "Loaded settings: path={display}, manage_binary={}",
            settings.settings.manage_gopls_binary
        );
        Ok(settings)
    }
}
