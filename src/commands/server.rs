//! Server management commands.
//!
//! Thin wrappers the CLI dispatches to; all decisions live in `ServerManager`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use gopls_manager::api::types::{LifecycleState, ServerStatus};
use gopls_manager::host::LoggingHost;
use gopls_manager::runtime::lifecycle::ServerLifecycle;
use gopls_manager::server::manager::ServerManager;
use gopls_manager::server::releases::parse_releases;

/// Report whether the next activation would install.
pub async fn server_check(manager: &ServerManager) -> &'static str {
    let needs = manager.needs_update_or_installation().await;
    log::debug!("server_check result: needs_install={needs}");
    if needs {
        "needs-install"
    } else {
        "up-to-date"
    }
}

/// Activate the lifecycle, installing if needed. `force` reinstalls unconditionally.
pub async fn server_install(manager: Arc<ServerManager>, force: bool) -> Result<LifecycleState> {
    log::info!("server_install called: force={force}");

    if force {
        manager
            .install_or_update()
            .await
            .context("forced install failed")?;
        return Ok(LifecycleState::UpToDate);
    }

    let mut lifecycle = ServerLifecycle::new(manager, Arc::new(LoggingHost));
    let state = lifecycle.activate().await.context("install failed")?;
    Ok(state)
}

/// Installation status, optionally compared against a releases listing file.
pub async fn server_status(manager: &ServerManager, releases: Option<&Path>) -> Result<ServerStatus> {
    let releases = match releases {
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read releases file '{}'", path.display()))?;
            let parsed = parse_releases(&content)
                .with_context(|| format!("failed to parse releases file '{}'", path.display()))?;
            Some(parsed)
        }
        None => None,
    };

    let status = manager.status(releases.as_deref()).await;
    log::debug!(
        "server_status result: installed={}, version={:?}",
        status.installed,
        status.installed_version
    );
    Ok(status)
}

/// Remove the managed installation.
pub async fn server_uninstall(manager: &ServerManager) -> Result<()> {
    log::info!("server_uninstall called");
    manager.uninstall().await.context("uninstall failed")?;
    Ok(())
}
