//! Server Manager - decides whether the gopls binary must be (re)installed
//! and installs it through the Go toolchain.
//!
//! # Installation Directory Structure
//!
//! ```text
//! <storage_root>/
//! └── LSP-gopls/
//!     ├── VERSION        # Marker: last successfully installed version
//!     ├── bin/
//!     │   └── gopls      # GOBIN (gopls.exe on Windows)
//!     ├── go-build/      # GOCACHE
//!     └── pkg/mod/       # GOMODCACHE
//! ```
//!
//! The marker is a plain equality token against the desired version, not a
//! semantic version. It is written only after the toolchain reports success.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::api::types::{InstallError, ServerStatus};
use crate::config::ManagerConfig;
use crate::host::ManagedServer;
use crate::runtime::path::{is_executable, managed_binary_path, resolve_binary_path};
use crate::runtime::toolchain::{ProcessRunner, SystemProcessRunner, Toolchain};
use crate::runtime::version::InstallVerb;
use crate::server::releases::{is_newer, latest_release, Release};

/// Binary lifecycle manager for one language server.
pub struct ServerManager {
    config: ManagerConfig,
    runner: Arc<dyn ProcessRunner>,
}

impl ServerManager {
    /// Create a manager that runs the real toolchain.
    pub fn new(config: ManagerConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemProcessRunner))
    }

    /// Create a manager with a custom process runner.
    pub fn with_runner(config: ManagerConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Resolved location of the server binary.
    pub fn binary_path(&self) -> PathBuf {
        resolve_binary_path(&self.config)
    }

    /// Whether an executable exists at the resolved binary path.
    pub fn is_binary_installed(&self) -> bool {
        is_executable(&self.binary_path())
    }

    /// Read the version marker. Any read failure means "not installed".
    pub async fn current_server_version(&self) -> Option<String> {
        let marker = self.config.marker_path();
        match tokio::fs::read_to_string(&marker).await {
            Ok(version) => Some(version),
            Err(e) => {
                log::debug!(
                    "No usable version marker: path={}, error={e}",
                    marker.display()
                );
                None
            }
        }
    }

    /// Whether the binary is missing or stale.
    ///
    /// Always `false` when binary management is disabled. Otherwise the
    /// managed install location is checked, since that is where
    /// `install_or_update` puts the binary; a `command` override only
    /// affects `binary_path`.
    pub async fn needs_update_or_installation(&self) -> bool {
        if !self.config.manage_binary {
            log::debug!(
                "Binary management disabled: server={}",
                self.config.server_name
            );
            return false;
        }

        let managed = managed_binary_path(&self.config);
        if !is_executable(&managed) {
            log::info!(
                "Server binary missing: server={}, path={}",
                self.config.server_name,
                managed.display()
            );
            return true;
        }

        let installed = self.current_server_version().await;
        let stale = installed.as_deref() != Some(self.config.desired_version.as_str());
        if stale {
            log::info!(
                "Server binary stale: server={}, installed={installed:?}, desired={}",
                self.config.server_name,
                self.config.desired_version
            );
        }
        stale
    }

    /// Install or update the server binary in place.
    ///
    /// Fails with `ToolchainNotFound` before touching the filesystem when the
    /// toolchain is not on the search path. The version marker is written
    /// only after the install subprocess succeeded.
    pub async fn install_or_update(&self) -> Result<(), InstallError> {
        let toolchain = &self.config.toolchain;
        let program = self.runner.find_program(toolchain).ok_or_else(|| {
            log::error!("Toolchain not found on search path: toolchain={toolchain}");
            InstallError::ToolchainNotFound {
                toolchain: toolchain.clone(),
            }
        })?;

        let base_dir = self.config.base_dir();
        tokio::fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| InstallError::Io {
                message: format!(
                    "Failed to create install directory '{}': {e}",
                    base_dir.display()
                ),
            })?;

        let toolchain = Toolchain::new(self.runner.as_ref(), program, base_dir);

        let go_version = toolchain.version().await.inspect_err(|e| {
            log::error!("Toolchain version probe failed: {e}");
        })?;
        let verb = InstallVerb::for_runtime(go_version);

        log::info!(
            "Installing server: server={}, version={}, toolchain={go_version}, verb={}",
            self.config.server_name,
            self.config.desired_version,
            verb.as_str()
        );

        toolchain
            .install(verb, &self.config.module_path())
            .await
            .inspect_err(|e| {
                log::error!(
                    "Server installation failed: server={}, error={e}",
                    self.config.server_name
                );
            })?;

        let marker = self.config.marker_path();
        tokio::fs::write(&marker, &self.config.desired_version)
            .await
            .map_err(|e| InstallError::MarkerWriteFailed {
                path: marker.display().to_string(),
                message: e.to_string(),
            })?;

        log::info!(
            "Server installed: server={}, version={}",
            self.config.server_name,
            self.config.desired_version
        );
        Ok(())
    }

    /// Remove the managed installation directory.
    ///
    /// Only runs on explicit request; a version mismatch alone reinstalls in place.
    pub async fn uninstall(&self) -> Result<(), InstallError> {
        let base_dir = self.config.base_dir();
        match tokio::fs::remove_dir_all(&base_dir).await {
            Ok(()) => {
                log::info!("Server uninstalled: path={}", base_dir.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(InstallError::Io {
                message: format!(
                    "Failed to remove install directory '{}': {e}",
                    base_dir.display()
                ),
            }),
        }
    }

    /// Snapshot of the installation.
    ///
    /// When `releases` is supplied, `latest_version` and `update_available`
    /// are filled from it; otherwise both stay `None`.
    pub async fn status(&self, releases: Option<&[Release]>) -> ServerStatus {
        let (latest_version, update_available) = match releases {
            Some(releases) => match latest_release(releases) {
                Some(latest) => {
                    let newer = is_newer(&self.config.desired_version, &latest);
                    (Some(latest.to_string()), Some(newer))
                }
                None => {
                    log::warn!("No upstream release found for {}", self.config.server_name);
                    (None, None)
                }
            },
            None => (None, None),
        };

        ServerStatus {
            server_name: self.config.server_name.clone(),
            installed: self.is_binary_installed(),
            installed_version: self.current_server_version().await,
            desired_version: self.config.desired_version.clone(),
            latest_version,
            update_available,
            bin_path: self.binary_path().display().to_string(),
            managed: self.config.manage_binary,
            needs_install: self.needs_update_or_installation().await,
        }
    }
}

#[async_trait]
impl ManagedServer for ServerManager {
    fn name(&self) -> &str {
        &self.config.server_name
    }

    async fn needs_update_or_installation(&self) -> bool {
        ServerManager::needs_update_or_installation(self).await
    }

    async fn install_or_update(&self) -> Result<(), InstallError> {
        ServerManager::install_or_update(self).await
    }
}
