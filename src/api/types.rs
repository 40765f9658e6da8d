//! Bridge types for commands and hosts.
//!
//! These types provide a stable API surface for whatever host drives the
//! manager (editor plugin, CLI), hiding the toolchain details.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Installation and update status of the managed server binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    /// Server identifier (e.g., "gopls")
    pub server_name: String,
    /// Whether an executable exists at the resolved binary path
    pub installed: bool,
    /// Version recorded in the marker file, if any
    pub installed_version: Option<String>,
    /// Version the configuration asks for
    pub desired_version: String,
    /// Latest upstream version (if release data was supplied)
    pub latest_version: Option<String>,
    /// Whether upstream has a newer stable release (if release data was supplied)
    pub update_available: Option<bool>,
    /// Resolved path to the server binary
    pub bin_path: String,
    /// Whether the binary is managed automatically
    pub managed: bool,
    /// Whether the next activation would (re)install the binary
    pub needs_install: bool,
}

/// Lifecycle state of a managed server, re-entered on every activation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LifecycleState {
    /// No check has run yet
    NotChecked,
    /// Binary missing or marker version differs from the desired version
    NeedsInstall,
    /// Binary present and marker matches
    UpToDate,
    /// Installation failed; the caller decides whether to retry
    Error { message: String },
}

/// Errors surfaced by install/update operations
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InstallError {
    /// The build toolchain is not resolvable on the search path
    #[error("{toolchain} binary not found in $PATH")]
    ToolchainNotFound { toolchain: String },
    /// The toolchain's `version` subcommand exited non-zero
    #[error("toolchain version probe failed (exit code {exit_code:?}): {stderr}")]
    VersionProbeFailed {
        stderr: String,
        exit_code: Option<i32>,
    },
    /// The install subprocess exited non-zero
    #[error("installation failed (exit code {exit_code:?}): {stderr}")]
    InstallCommandFailed {
        stderr: String,
        exit_code: Option<i32>,
    },
    /// The version marker could not be written after a successful install
    #[error("failed to write version marker '{path}': {message}")]
    MarkerWriteFailed { path: String, message: String },
    /// Filesystem or process-spawn error
    #[error("IO error: {message}")]
    Io { message: String },
}
