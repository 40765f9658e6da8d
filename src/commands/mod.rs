//! Command-line handlers organized by domain.
//!
//! `Cli` is the host adapter an editor integration shells out to; each
//! subcommand maps onto one `ServerManager` operation.

pub mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use gopls_manager::config::{ManagerConfig, ServerSettings};
use gopls_manager::server::manager::ServerManager;

/// Install, update and inspect the gopls language server binary
#[derive(Debug, Parser)]
#[command(name = "gopls-manager", version)]
pub struct Cli {
    /// Storage root that `${storage_path}` expands to
    #[arg(long, global = true, value_name = "DIR")]
    pub storage_path: Option<PathBuf>,

    /// Settings file (`command`, `settings.manageGoplsBinary`)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// gopls version to install instead of the built-in tag
    #[arg(long, global = true, value_name = "TAG")]
    pub server_version: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print whether the binary needs to be installed or updated
    Check,
    /// Install or update the binary if needed
    Install {
        /// Reinstall even if the binary is up to date
        #[arg(long)]
        force: bool,
    },
    /// Print the installation status as JSON
    Status {
        /// GitHub releases listing of golang/tools to compare against
        #[arg(long, value_name = "FILE")]
        releases: Option<PathBuf>,
    },
    /// Remove the managed installation
    Uninstall,
}

impl Cli {
    /// Build the manager configuration from flags and the settings file.
    pub fn config(&self) -> Result<ManagerConfig> {
        let storage_root = match &self.storage_path {
            Some(path) => path.clone(),
            None => dirs::cache_dir()
                .context("failed to resolve a cache directory; pass --storage-path")?
                .join("gopls-manager"),
        };

        let mut config = ManagerConfig::new(storage_root);
        if let Some(version) = &self.server_version {
            config = config.with_desired_version(version.clone());
        }
        if let Some(path) = &self.settings {
            let settings = ServerSettings::load(path)?;
            config.apply_settings(&settings);
        }
        Ok(config)
    }

    pub async fn execute(self) -> Result<()> {
        let config = self.config()?;
        log::debug!(
            "Resolved configuration: base_dir={}, version={}, managed={}",
            config.base_dir().display(),
            config.desired_version,
            config.manage_binary
        );
        let manager = Arc::new(ServerManager::new(config));

        match self.command {
            Commands::Check => {
                println!("{}", server::server_check(&manager).await);
            }
            Commands::Install { force } => {
                let state = server::server_install(manager, force).await?;
                println!("{}", serde_json::to_string(&state)?);
            }
            Commands::Status { releases } => {
                let status = server::server_status(&manager, releases.as_deref()).await?;
                println!("{}", serde_json::to_string_pretty(&status)?);
            }
            Commands::Uninstall => {
                server::server_uninstall(&manager).await?;
            }
        }
        Ok(())
    }
}
